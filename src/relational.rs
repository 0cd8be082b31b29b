use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::config::StoreConfig;
use crate::error::{PersonaError, Result};
use crate::model::{
    Agent, AuthorityLevel, CorePersonality, CorePersonalityUpdate, EvolutionChange,
    EvolutionRecord, MemorySummary, MessageTemplate, MoodIndicator, Relationship,
    RelationshipKind,
};

/// Typed accessor over the relational half of the personality store:
/// agent identity, core personality rows, relationships, memory summaries,
/// message templates, and the append-only evolution log.
///
/// Reads go through the derived views (`agent_personality_overview` and
/// friends) so joins stay out of application code; writes target the base
/// tables. Every multi-row write runs in one transaction.
pub struct RelationalStore {
    conn: Mutex<Connection>,
}

impl RelationalStore {
    /// Helper to lock the connection
    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PersonaError::Internal(format!("store lock poisoned: {}", e)))
    }

    /// Create or open the database at the configured path.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Self::open_path(config.database_path())
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        store.seed_default_templates()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                agent_name TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                capabilities TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )"#,
            [],
        )?;

        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS agent_personalities (
                agent_id TEXT PRIMARY KEY REFERENCES agents(id),
                personality_type TEXT NOT NULL,
                communication_style TEXT NOT NULL,
                authority_level TEXT NOT NULL,
                cultural_background TEXT NOT NULL,
                expertise_domains TEXT NOT NULL,
                management_philosophy TEXT NOT NULL,
                activity_level REAL NOT NULL,
                updated_at TEXT NOT NULL
            )"#,
            [],
        )?;

        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS agent_relationships (
                id TEXT PRIMARY KEY,
                agent_1_id TEXT NOT NULL REFERENCES agents(id),
                agent_2_id TEXT NOT NULL REFERENCES agents(id),
                relationship_type TEXT NOT NULL,
                strength_score REAL NOT NULL,
                description TEXT NOT NULL,
                last_interaction TEXT NOT NULL
            )"#,
            [],
        )?;

        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS message_templates (
                id TEXT PRIMARY KEY,
                personality_type TEXT NOT NULL,
                template_type TEXT NOT NULL,
                template_text TEXT NOT NULL,
                usage_frequency INTEGER NOT NULL DEFAULT 0,
                success_rate REAL NOT NULL DEFAULT 0.0,
                last_used TEXT,
                UNIQUE(personality_type, template_type)
            )"#,
            [],
        )?;

        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS agent_memory_summaries (
                id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL REFERENCES agents(id),
                event_date TEXT NOT NULL,
                key_events TEXT NOT NULL,
                interaction_count INTEGER NOT NULL,
                mood_indicator TEXT NOT NULL,
                primary_context TEXT NOT NULL,
                learning_insights TEXT NOT NULL,
                UNIQUE(agent_id, event_date)
            )"#,
            [],
        )?;

        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS personality_evolution (
                id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL REFERENCES agents(id),
                change_type TEXT NOT NULL,
                old_value TEXT NOT NULL,
                new_value TEXT NOT NULL,
                change_reason TEXT NOT NULL,
                confidence_score REAL NOT NULL,
                recorded_at TEXT NOT NULL
            )"#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_memory_summaries_agent_date
             ON agent_memory_summaries(agent_id, event_date DESC)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_evolution_agent
             ON personality_evolution(agent_id, recorded_at DESC)",
            [],
        )?;

        // Derived views: the only read surface the loader, graph, template
        // engine, and reporter use.
        conn.execute(
            r#"CREATE VIEW IF NOT EXISTS agent_personality_overview AS
               SELECT a.id AS agent_id, a.agent_name, a.category, a.capabilities,
                      a.active, a.created_at,
                      p.personality_type, p.communication_style, p.authority_level,
                      p.cultural_background, p.expertise_domains,
                      p.management_philosophy, p.activity_level, p.updated_at
               FROM agents a
               LEFT JOIN agent_personalities p ON p.agent_id = a.id"#,
            [],
        )?;

        conn.execute(
            r#"CREATE VIEW IF NOT EXISTS agent_relationship_network AS
               SELECT r.id, r.agent_1_id, a1.agent_name AS agent_1,
                      r.agent_2_id, a2.agent_name AS agent_2,
                      r.relationship_type, r.strength_score,
                      r.description, r.last_interaction
               FROM agent_relationships r
               JOIN agents a1 ON a1.id = r.agent_1_id
               JOIN agents a2 ON a2.id = r.agent_2_id"#,
            [],
        )?;

        conn.execute(
            r#"CREATE VIEW IF NOT EXISTS agent_memory_human_readable AS
               SELECT a.agent_name, m.agent_id, m.event_date, m.key_events,
                      m.interaction_count, m.mood_indicator, m.primary_context,
                      m.learning_insights
               FROM agent_memory_summaries m
               JOIN agents a ON a.id = m.agent_id"#,
            [],
        )?;

        conn.execute(
            r#"CREATE VIEW IF NOT EXISTS template_effectiveness AS
               SELECT id, personality_type, template_type, template_text,
                      usage_frequency, success_rate, last_used
               FROM message_templates"#,
            [],
        )?;

        Ok(())
    }

    /// Seed the generic fallback templates. Idempotent on
    /// (personality_type, template_type).
    fn seed_default_templates(&self) -> Result<()> {
        let defaults = [
            ("greeting", "Hello! I'm {agent_name}, ready to help."),
            ("analysis", "Analyzing {context}: {findings}"),
            ("completion", "Task completed: {summary}"),
        ];

        let conn = self.lock_conn()?;
        for (template_type, text) in defaults {
            conn.execute(
                "INSERT OR IGNORE INTO message_templates
                     (id, personality_type, template_type, template_text)
                 VALUES (?1, 'generic', ?2, ?3)",
                params![uuid::Uuid::new_v4().to_string(), template_type, text],
            )?;
        }
        Ok(())
    }

    /// Register an agent, returning the stored row. Idempotent on name;
    /// identity is immutable once created, so a second registration returns
    /// the existing agent untouched.
    pub fn register_agent(
        &self,
        name: &str,
        category: &str,
        capabilities: &[String],
    ) -> Result<Agent> {
        if name.trim().is_empty() {
            return Err(PersonaError::validation("agent name must not be empty"));
        }
        // the name becomes part of the document filename
        if name.contains(['/', '\\']) || name.contains("..") {
            return Err(PersonaError::validation(
                "agent name must not contain path separators",
            ));
        }

        {
            let conn = self.lock_conn()?;
            conn.execute(
                "INSERT OR IGNORE INTO agents (id, agent_name, category, capabilities, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    name,
                    category,
                    serde_json::to_string(capabilities)
                        .map_err(|e| PersonaError::Internal(e.to_string()))?,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }

        self.get_agent(name)?
            .ok_or_else(|| PersonaError::AgentNotFound(name.to_string()))
    }

    /// Mark an agent retired. The row stays; loads keep working.
    pub fn retire_agent(&self, agent_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("UPDATE agents SET active = 0 WHERE id = ?1", [agent_id])?;
        Ok(())
    }

    pub fn get_agent(&self, name: &str) -> Result<Option<Agent>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT agent_id, agent_name, category, capabilities, active, created_at
             FROM agent_personality_overview WHERE agent_name = ?1",
            [name],
            map_agent_row,
        );

        match result {
            Ok(agent) => Ok(Some(agent)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the core personality row for an agent. `None` means the agent
    /// was never configured, which is not an error.
    pub fn get_core_personality(&self, agent_id: &str) -> Result<Option<CorePersonality>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT agent_id, personality_type, communication_style, authority_level,
                    cultural_background, expertise_domains, management_philosophy,
                    activity_level, updated_at
             FROM agent_personality_overview
             WHERE agent_id = ?1 AND personality_type IS NOT NULL",
            [agent_id],
            map_core_personality_row,
        );

        match result {
            Ok(core) => Ok(Some(core)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or update the core personality row, bumping `updated_at`.
    /// Fields left `None` in the update keep their stored value.
    pub fn upsert_core_personality(
        &self,
        agent_id: &str,
        update: &CorePersonalityUpdate,
    ) -> Result<CorePersonality> {
        let merged = self.merged_core(agent_id, update)?;
        let conn = self.lock_conn()?;
        write_core_personality(&conn, &merged)?;
        Ok(merged)
    }

    /// Apply a core-personality update and its evolution-log entry as one
    /// atomic transaction: a failed audit append rolls the update back.
    pub fn apply_personality_change(
        &self,
        agent_id: &str,
        update: &CorePersonalityUpdate,
        change_reason: &str,
        confidence_score: f64,
    ) -> Result<CorePersonality> {
        let old = self.get_core_personality(agent_id)?;
        let merged = self.merged_core(agent_id, update)?;

        let change = EvolutionChange {
            change_type: "core_personality".to_string(),
            old_value: old
                .as_ref()
                .map(|c| serde_json::to_value(c))
                .transpose()
                .map_err(|e| PersonaError::Internal(e.to_string()))?
                .unwrap_or(serde_json::Value::Null),
            new_value: serde_json::to_value(&merged)
                .map_err(|e| PersonaError::Internal(e.to_string()))?,
            change_reason: change_reason.to_string(),
            confidence_score,
        };

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        write_core_personality(&tx, &merged)?;
        insert_evolution(&tx, agent_id, &change)?;
        tx.commit()?;

        tracing::info!(agent_id, change_reason, "core personality updated");
        Ok(merged)
    }

    fn merged_core(
        &self,
        agent_id: &str,
        update: &CorePersonalityUpdate,
    ) -> Result<CorePersonality> {
        {
            let conn = self.lock_conn()?;
            ensure_agent_known(&conn, agent_id)?;
        }

        if let Some(level) = update.activity_level {
            if !(0.0..=1.0).contains(&level) {
                return Err(PersonaError::validation(format!(
                    "activity_level {} outside [0, 1]",
                    level
                )));
            }
        }

        let mut core = self
            .get_core_personality(agent_id)?
            .unwrap_or_else(|| CorePersonality::unconfigured(agent_id));

        if let Some(v) = &update.personality_type {
            core.personality_type = v.clone();
        }
        if let Some(v) = &update.communication_style {
            core.communication_style = v.clone();
        }
        if let Some(v) = update.authority_level {
            core.authority_level = v;
        }
        if let Some(v) = &update.cultural_background {
            core.cultural_background = v.clone();
        }
        if let Some(v) = &update.expertise_domains {
            core.expertise_domains = v.clone();
        }
        if let Some(v) = &update.management_philosophy {
            core.management_philosophy = v.clone();
        }
        if let Some(v) = update.activity_level {
            core.activity_level = v;
        }
        core.updated_at = Utc::now();
        Ok(core)
    }

    /// Insert a relationship between two distinct agents. At most one
    /// record may exist per unordered pair; violations surface as
    /// `Validation`, never silently.
    pub fn add_relationship(
        &self,
        agent_1_id: &str,
        agent_2_id: &str,
        kind: RelationshipKind,
        strength_score: f64,
        description: &str,
    ) -> Result<String> {
        if agent_1_id == agent_2_id {
            return Err(PersonaError::validation(
                "an agent cannot have a relationship with itself",
            ));
        }
        if !(-1.0..=1.0).contains(&strength_score) {
            return Err(PersonaError::validation(format!(
                "strength_score {} outside [-1, 1]",
                strength_score
            )));
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        for id in [agent_1_id, agent_2_id] {
            ensure_agent_known(&tx, id)?;
        }

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM agent_relationships
             WHERE (agent_1_id = ?1 AND agent_2_id = ?2)
                OR (agent_1_id = ?2 AND agent_2_id = ?1)",
            params![agent_1_id, agent_2_id],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(PersonaError::validation(
                "relationship already exists for this agent pair",
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO agent_relationships
                 (id, agent_1_id, agent_2_id, relationship_type, strength_score, description, last_interaction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                agent_1_id,
                agent_2_id,
                kind.as_db_str(),
                strength_score,
                description,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Bump `last_interaction` on the pair's relationship, whichever
    /// direction it was stored in.
    pub fn touch_relationship(&self, agent_1_id: &str, agent_2_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE agent_relationships SET last_interaction = ?1
             WHERE (agent_1_id = ?2 AND agent_2_id = ?3)
                OR (agent_1_id = ?3 AND agent_2_id = ?2)",
            params![Utc::now().to_rfc3339(), agent_1_id, agent_2_id],
        )?;
        Ok(())
    }

    /// All relationships touching an agent, strongest raw score first,
    /// ties broken by most recent interaction.
    pub fn list_relationships(&self, agent_id: &str) -> Result<Vec<Relationship>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, agent_1_id, agent_1, agent_2_id, agent_2,
                    relationship_type, strength_score, description, last_interaction
             FROM agent_relationship_network
             WHERE agent_1_id = ?1 OR agent_2_id = ?1
             ORDER BY strength_score DESC, last_interaction DESC",
        )?;

        let relationships = stmt
            .query_map([agent_id], map_relationship_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(relationships)
    }

    /// Upsert one day's memory summary. Calling twice for the same
    /// (agent, date) overwrites rather than duplicating.
    pub fn record_memory_summary(&self, summary: &MemorySummary) -> Result<()> {
        let conn = self.lock_conn()?;
        ensure_agent_known(&conn, &summary.agent_id)?;
        conn.execute(
            "INSERT INTO agent_memory_summaries
                 (id, agent_id, event_date, key_events, interaction_count,
                  mood_indicator, primary_context, learning_insights)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(agent_id, event_date) DO UPDATE SET
                 key_events = excluded.key_events,
                 interaction_count = excluded.interaction_count,
                 mood_indicator = excluded.mood_indicator,
                 primary_context = excluded.primary_context,
                 learning_insights = excluded.learning_insights",
            params![
                uuid::Uuid::new_v4().to_string(),
                summary.agent_id,
                summary.event_date.to_string(),
                serde_json::to_string(&summary.key_events)
                    .map_err(|e| PersonaError::Internal(e.to_string()))?,
                summary.interaction_count,
                summary.mood_indicator.as_db_str(),
                summary.primary_context,
                serde_json::to_string(&summary.learning_insights)
                    .map_err(|e| PersonaError::Internal(e.to_string()))?,
            ],
        )?;
        Ok(())
    }

    /// Memory summaries for an agent with event_date in [from, to],
    /// most recent first.
    pub fn memory_summaries_between(
        &self,
        agent_name: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MemorySummary>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT agent_id, event_date, key_events, interaction_count,
                    mood_indicator, primary_context, learning_insights
             FROM agent_memory_human_readable
             WHERE agent_name = ?1 AND event_date BETWEEN ?2 AND ?3
             ORDER BY event_date DESC",
        )?;

        let summaries = stmt
            .query_map(
                params![agent_name, from.to_string(), to.to_string()],
                map_memory_summary_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    /// Append an evolution-log entry. Entries are immutable once written.
    pub fn append_evolution(&self, agent_id: &str, change: &EvolutionChange) -> Result<String> {
        let conn = self.lock_conn()?;
        ensure_agent_known(&conn, agent_id)?;
        insert_evolution(&conn, agent_id, change)
    }

    pub fn evolution_history(&self, agent_id: &str, limit: usize) -> Result<Vec<EvolutionRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, change_type, old_value, new_value,
                    change_reason, confidence_score, recorded_at
             FROM personality_evolution
             WHERE agent_id = ?1
             ORDER BY recorded_at DESC
             LIMIT ?2",
        )?;

        let records = stmt
            .query_map(params![agent_id, limit], map_evolution_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Look up a stored template by exact (personality_type, template_type).
    pub fn find_template(
        &self,
        personality_type: &str,
        template_type: &str,
    ) -> Result<Option<MessageTemplate>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT id, personality_type, template_type, template_text,
                    usage_frequency, success_rate, last_used
             FROM template_effectiveness
             WHERE personality_type = ?1 AND template_type = ?2",
            params![personality_type, template_type],
            map_template_row,
        );

        match result {
            Ok(template) => Ok(Some(template)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_template(&self, template_id: &str) -> Result<Option<MessageTemplate>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT id, personality_type, template_type, template_text,
                    usage_frequency, success_rate, last_used
             FROM template_effectiveness
             WHERE id = ?1",
            [template_id],
            map_template_row,
        );

        match result {
            Ok(template) => Ok(Some(template)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Install or replace a template for a personality type.
    pub fn upsert_template(
        &self,
        personality_type: &str,
        template_type: &str,
        template_text: &str,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO message_templates (id, personality_type, template_type, template_text)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(personality_type, template_type) DO UPDATE SET
                 template_text = excluded.template_text",
            params![
                uuid::Uuid::new_v4().to_string(),
                personality_type,
                template_type,
                template_text
            ],
        )?;
        Ok(())
    }

    /// Record that a stored template was rendered: usage_frequency += 1,
    /// last_used = now. Success is reported separately.
    pub fn touch_template_usage(&self, template_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE message_templates
             SET usage_frequency = usage_frequency + 1, last_used = ?1
             WHERE id = ?2",
            params![Utc::now().to_rfc3339(), template_id],
        )?;
        Ok(())
    }

    /// Fold one caller-reported outcome into the template's running
    /// success average: usage += 1; rate += (outcome - rate) / usage.
    pub fn record_template_outcome(
        &self,
        template_id: &str,
        success: bool,
    ) -> Result<MessageTemplate> {
        let outcome = if success { 1.0 } else { 0.0 };
        {
            let conn = self.lock_conn()?;
            let updated = conn.execute(
                "UPDATE message_templates
                 SET usage_frequency = usage_frequency + 1,
                     success_rate = success_rate + ((?1 - success_rate) / (usage_frequency + 1)),
                     last_used = ?2
                 WHERE id = ?3",
                params![outcome, Utc::now().to_rfc3339(), template_id],
            )?;
            if updated == 0 {
                return Err(PersonaError::validation(format!(
                    "unknown template id: {}",
                    template_id
                )));
            }
        }

        self.get_template(template_id)?
            .ok_or_else(|| PersonaError::Internal("template vanished after update".to_string()))
    }
}

/// Unknown agent ids surface as `AgentNotFound`, not as a raw foreign-key
/// constraint error from SQLite.
fn ensure_agent_known(conn: &Connection, agent_id: &str) -> Result<()> {
    let known: i64 = conn.query_row(
        "SELECT COUNT(*) FROM agents WHERE id = ?1",
        [agent_id],
        |row| row.get(0),
    )?;
    if known == 0 {
        return Err(PersonaError::AgentNotFound(agent_id.to_string()));
    }
    Ok(())
}

fn write_core_personality(conn: &Connection, core: &CorePersonality) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO agent_personalities
             (agent_id, personality_type, communication_style, authority_level,
              cultural_background, expertise_domains, management_philosophy,
              activity_level, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            core.agent_id,
            core.personality_type,
            core.communication_style,
            core.authority_level.as_db_str(),
            core.cultural_background,
            serde_json::to_string(&core.expertise_domains)
                .map_err(|e| PersonaError::Internal(e.to_string()))?,
            core.management_philosophy,
            core.activity_level,
            core.updated_at.to_rfc3339()
        ],
    )?;
    Ok(())
}

fn insert_evolution(conn: &Connection, agent_id: &str, change: &EvolutionChange) -> Result<String> {
    if !(0.0..=1.0).contains(&change.confidence_score) {
        return Err(PersonaError::validation(format!(
            "confidence_score {} outside [0, 1]",
            change.confidence_score
        )));
    }

    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO personality_evolution
             (id, agent_id, change_type, old_value, new_value, change_reason,
              confidence_score, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            agent_id,
            change.change_type,
            change.old_value.to_string(),
            change.new_value.to_string(),
            change.change_reason,
            change.confidence_score,
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(id)
}

fn parse_datetime(index: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_date(index: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_json_strings(index: usize, raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_json_value(index: usize, raw: String) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_agent_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        capabilities: parse_json_strings(3, row.get::<_, String>(3)?)?,
        active: row.get::<_, i64>(4)? != 0,
        created_at: parse_datetime(5, row.get::<_, String>(5)?)?,
    })
}

fn map_core_personality_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CorePersonality> {
    Ok(CorePersonality {
        agent_id: row.get(0)?,
        personality_type: row.get(1)?,
        communication_style: row.get(2)?,
        authority_level: AuthorityLevel::from_db(&row.get::<_, String>(3)?),
        cultural_background: row.get(4)?,
        expertise_domains: parse_json_strings(5, row.get::<_, String>(5)?)?,
        management_philosophy: row.get(6)?,
        activity_level: row.get(7)?,
        updated_at: parse_datetime(8, row.get::<_, String>(8)?)?,
    })
}

fn map_relationship_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Relationship> {
    Ok(Relationship {
        id: row.get(0)?,
        agent_1_id: row.get(1)?,
        agent_1_name: row.get(2)?,
        agent_2_id: row.get(3)?,
        agent_2_name: row.get(4)?,
        kind: RelationshipKind::from_db(&row.get::<_, String>(5)?),
        strength_score: row.get(6)?,
        description: row.get(7)?,
        last_interaction: parse_datetime(8, row.get::<_, String>(8)?)?,
    })
}

fn map_memory_summary_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemorySummary> {
    Ok(MemorySummary {
        agent_id: row.get(0)?,
        event_date: parse_date(1, row.get::<_, String>(1)?)?,
        key_events: parse_json_strings(2, row.get::<_, String>(2)?)?,
        interaction_count: row.get(3)?,
        mood_indicator: MoodIndicator::from_db(&row.get::<_, String>(4)?),
        primary_context: row.get(5)?,
        learning_insights: parse_json_strings(6, row.get::<_, String>(6)?)?,
    })
}

fn map_evolution_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EvolutionRecord> {
    Ok(EvolutionRecord {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        change_type: row.get(2)?,
        old_value: parse_json_value(3, row.get::<_, String>(3)?)?,
        new_value: parse_json_value(4, row.get::<_, String>(4)?)?,
        change_reason: row.get(5)?,
        confidence_score: row.get(6)?,
        recorded_at: parse_datetime(7, row.get::<_, String>(7)?)?,
    })
}

fn map_template_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageTemplate> {
    let last_used = match row.get::<_, Option<String>>(6)? {
        Some(raw) => Some(parse_datetime(6, raw)?),
        None => None,
    };
    Ok(MessageTemplate {
        id: row.get(0)?,
        personality_type: row.get(1)?,
        template_type: row.get(2)?,
        template_text: row.get(3)?,
        usage_frequency: row.get(4)?,
        success_rate: row.get(5)?,
        last_used,
    })
}
