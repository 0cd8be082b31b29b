use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::StoreConfig;
use crate::error::{PersonaError, Result};
use crate::model::MoodIndicator;
use crate::relational::RelationalStore;

/// Aggregated view of an agent's memory summaries over a time window.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub agent_name: String,
    pub window_days: i64,
    pub days_with_activity: usize,
    pub total_interactions: i64,
    pub dominant_mood: Option<MoodIndicator>,
    pub mood_counts: HashMap<MoodIndicator, usize>,
    /// Most recent distinct contexts, newest first, capped at the
    /// configured context limit.
    pub recent_contexts: Vec<String>,
    pub key_events: Vec<String>,
}

impl MemoryReport {
    pub fn has_activity(&self) -> bool {
        self.days_with_activity > 0
    }

    /// Render the digest as plain text.
    pub fn render(&self) -> String {
        if !self.has_activity() {
            return format!(
                "{} - no recorded activity in the last {} days.",
                self.agent_name, self.window_days
            );
        }

        let mood = self
            .dominant_mood
            .map(|m| m.as_db_str())
            .unwrap_or("unknown");

        let mut lines = vec![
            format!("{} - memory report", self.agent_name),
            format!(
                "Last {} days: {} interactions across {} active days, mostly {}.",
                self.window_days, self.total_interactions, self.days_with_activity, mood
            ),
        ];

        if !self.recent_contexts.is_empty() {
            lines.push(format!(
                "Recent contexts: {}.",
                self.recent_contexts.join(", ")
            ));
        }
        if !self.key_events.is_empty() {
            lines.push("Key events:".to_string());
            for event in &self.key_events {
                lines.push(format!("- {}", event));
            }
        }

        lines.join("\n")
    }
}

/// Aggregates memory-summary rows into a natural-language digest.
pub struct MemoryReporter<'a> {
    store: &'a RelationalStore,
    context_limit: usize,
}

impl<'a> MemoryReporter<'a> {
    pub fn new(store: &'a RelationalStore) -> Self {
        Self {
            store,
            context_limit: 3,
        }
    }

    /// Reporter with the context limit taken from configuration.
    pub fn from_config(store: &'a RelationalStore, config: &StoreConfig) -> Self {
        Self::new(store).with_context_limit(config.context_limit)
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    /// Summarize rows with event_date in `[today - window_days, today]`.
    /// Zero matching rows is a valid, explicitly empty report.
    pub fn summarize(&self, agent_name: &str, window_days: i64) -> Result<MemoryReport> {
        if self.store.get_agent(agent_name)?.is_none() {
            return Err(PersonaError::AgentNotFound(agent_name.to_string()));
        }

        let today = Utc::now().date_naive();
        let from = today - Duration::days(window_days);
        // rows come back most recent first
        let rows = self.store.memory_summaries_between(agent_name, from, today)?;

        let total_interactions = rows.iter().map(|r| r.interaction_count).sum();

        let mut mood_counts: HashMap<MoodIndicator, usize> = HashMap::new();
        for row in &rows {
            *mood_counts.entry(row.mood_indicator).or_insert(0) += 1;
        }
        // ties go to the mood seen most recently
        let mut dominant_mood = None;
        let mut best = 0;
        for row in &rows {
            let count = mood_counts[&row.mood_indicator];
            if count > best {
                best = count;
                dominant_mood = Some(row.mood_indicator);
            }
        }

        let mut recent_contexts: Vec<String> = Vec::new();
        for row in &rows {
            if row.primary_context.is_empty() || recent_contexts.contains(&row.primary_context) {
                continue;
            }
            recent_contexts.push(row.primary_context.clone());
            if recent_contexts.len() == self.context_limit {
                break;
            }
        }

        let key_events = rows
            .iter()
            .flat_map(|r| r.key_events.iter().cloned())
            .collect();

        Ok(MemoryReport {
            agent_name: agent_name.to_string(),
            window_days,
            days_with_activity: rows.len(),
            total_interactions,
            dominant_mood,
            mood_counts,
            recent_contexts,
            key_events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemorySummary;
    use chrono::NaiveDate;

    fn temp_store() -> (tempfile::TempDir, RelationalStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RelationalStore::open_path(dir.path().join("personas.db")).expect("open");
        (dir, store)
    }

    fn summary(
        agent_id: &str,
        date: NaiveDate,
        interactions: i64,
        mood: MoodIndicator,
        context: &str,
    ) -> MemorySummary {
        MemorySummary {
            agent_id: agent_id.to_string(),
            event_date: date,
            key_events: vec![format!("event on {}", date)],
            interaction_count: interactions,
            mood_indicator: mood,
            primary_context: context.to_string(),
            learning_insights: vec![],
        }
    }

    #[test]
    fn aggregates_interactions_and_moods_over_the_window() {
        let (_dir, store) = temp_store();
        let agent = store.register_agent("sentinel", "security", &[]).expect("register");
        let today = Utc::now().date_naive();

        store
            .record_memory_summary(&summary(&agent.id, today, 5, MoodIndicator::Vigilant, "perimeter"))
            .expect("write");
        store
            .record_memory_summary(&summary(
                &agent.id,
                today - Duration::days(1),
                7,
                MoodIndicator::Vigilant,
                "audit",
            ))
            .expect("write");

        let report = MemoryReporter::new(&store)
            .summarize("sentinel", 7)
            .expect("summarize");

        assert_eq!(report.total_interactions, 12);
        assert_eq!(report.days_with_activity, 2);
        assert_eq!(report.dominant_mood, Some(MoodIndicator::Vigilant));
        assert_eq!(report.recent_contexts, vec!["perimeter", "audit"]);
        assert!(report.render().contains("12 interactions"));
    }

    #[test]
    fn rows_outside_the_window_are_excluded() {
        let (_dir, store) = temp_store();
        let agent = store.register_agent("sentinel", "security", &[]).expect("register");
        let today = Utc::now().date_naive();

        store
            .record_memory_summary(&summary(
                &agent.id,
                today - Duration::days(30),
                99,
                MoodIndicator::Focused,
                "ancient history",
            ))
            .expect("write");

        let report = MemoryReporter::new(&store)
            .summarize("sentinel", 7)
            .expect("summarize");
        assert_eq!(report.total_interactions, 0);
        assert!(!report.has_activity());
    }

    #[test]
    fn no_activity_is_a_report_not_an_error() {
        let (_dir, store) = temp_store();
        store.register_agent("idle", "ops", &[]).expect("register");

        let report = MemoryReporter::new(&store).summarize("idle", 7).expect("summarize");
        assert!(!report.has_activity());
        assert_eq!(report.dominant_mood, None);
        assert!(report.render().contains("no recorded activity"));
    }

    #[test]
    fn context_limit_caps_distinct_contexts() {
        let (_dir, store) = temp_store();
        let agent = store.register_agent("busy", "ops", &[]).expect("register");
        let today = Utc::now().date_naive();

        for (i, context) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
            store
                .record_memory_summary(&summary(
                    &agent.id,
                    today - Duration::days(i as i64),
                    1,
                    MoodIndicator::Neutral,
                    context,
                ))
                .expect("write");
        }

        let report = MemoryReporter::new(&store)
            .with_context_limit(2)
            .summarize("busy", 7)
            .expect("summarize");
        assert_eq!(report.recent_contexts, vec!["alpha", "beta"]);
    }

    #[test]
    fn configured_context_limit_is_honored() {
        let (_dir, store) = temp_store();
        let agent = store.register_agent("busy", "ops", &[]).expect("register");
        let today = Utc::now().date_naive();

        for (i, context) in ["alpha", "beta", "gamma"].iter().enumerate() {
            store
                .record_memory_summary(&summary(
                    &agent.id,
                    today - Duration::days(i as i64),
                    1,
                    MoodIndicator::Neutral,
                    context,
                ))
                .expect("write");
        }

        let config = StoreConfig {
            context_limit: 1,
            ..Default::default()
        };
        let report = MemoryReporter::from_config(&store, &config)
            .summarize("busy", 7)
            .expect("summarize");
        assert_eq!(report.recent_contexts, vec!["alpha"]);
    }

    #[test]
    fn unknown_agent_is_not_found() {
        let (_dir, store) = temp_store();
        let err = MemoryReporter::new(&store)
            .summarize("ghost", 7)
            .expect_err("should fail");
        assert!(matches!(err, PersonaError::AgentNotFound(_)));
    }
}
