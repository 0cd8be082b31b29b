use chrono::Utc;
use std::collections::HashMap;

use crate::document::{DocumentStore, DocumentUpdate};
use crate::error::{PersonaError, Result};
use crate::loader::{PersonalityLoader, PersonalitySnapshot};
use crate::model::{EvolutionChange, MemorySummary, MoodIndicator};
use crate::relational::RelationalStore;
use crate::report::{MemoryReport, MemoryReporter};
use crate::template::TemplateEngine;

/// An agent's interaction handle: caches one personality snapshot for the
/// agent's lifetime and renders responses from it.
///
/// Interaction paths never crash the runtime: storage trouble during
/// rendering degrades to a generic acknowledgement, and a missing template
/// variable is patched with a placeholder value.
pub struct PersonaAgent<'a> {
    name: String,
    relational: &'a RelationalStore,
    documents: &'a DocumentStore,
    snapshot: PersonalitySnapshot,
    interactions_this_session: u32,
    context_limit: usize,
}

impl<'a> PersonaAgent<'a> {
    /// Register the agent if it is unknown, then load and cache its
    /// personality.
    pub fn bootstrap(
        name: &str,
        category: &str,
        capabilities: &[String],
        relational: &'a RelationalStore,
        documents: &'a DocumentStore,
    ) -> Result<Self> {
        relational.register_agent(name, category, capabilities)?;
        let snapshot = PersonalityLoader::new(relational, documents).load(name)?;
        tracing::info!(agent = name, "agent bootstrapped");
        Ok(Self {
            name: name.to_string(),
            relational,
            documents,
            snapshot,
            interactions_this_session: 0,
            context_limit: 3,
        })
    }

    /// Apply the configured memory-report context limit.
    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub fn snapshot(&self) -> &PersonalitySnapshot {
        &self.snapshot
    }

    /// Re-pull both stores. Edits never mutate the cached snapshot; they go
    /// through the write APIs and land here on the next reload.
    pub fn reload(&mut self) -> Result<()> {
        self.snapshot = PersonalityLoader::new(self.relational, self.documents).load(&self.name)?;
        Ok(())
    }

    pub fn trait_value(&self, name: &str) -> Option<f64> {
        self.snapshot.trait_value(name)
    }

    /// Session mood derived from interaction volume.
    pub fn session_mood(&self) -> MoodIndicator {
        match self.interactions_this_session {
            n if n > 20 => MoodIndicator::Focused,
            n if n > 10 => MoodIndicator::Active,
            n if n > 5 => MoodIndicator::Engaged,
            _ => MoodIndicator::Neutral,
        }
    }

    pub fn interactions_this_session(&self) -> u32 {
        self.interactions_this_session
    }

    /// Render a personality-conditioned response for one interaction.
    pub fn respond(&mut self, context: &str, response_type: &str) -> String {
        self.interactions_this_session += 1;

        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context.to_string());
        match response_type {
            "analysis" => {
                variables.insert("findings".to_string(), self.analysis_findings());
            }
            "completion" => {
                variables.insert(
                    "summary".to_string(),
                    format!(
                        "processed '{}' using the {} approach",
                        context, self.snapshot.core.personality_type
                    ),
                );
            }
            _ => {}
        }

        let engine = TemplateEngine::new(self.relational);
        // patch missing variables with a placeholder instead of failing the
        // interaction; bail out to the generic line on storage trouble
        for _ in 0..8 {
            match engine.render(&self.snapshot, response_type, &variables) {
                Ok(rendered) => return rendered.text,
                Err(PersonaError::TemplateVariable(name)) => {
                    tracing::warn!(agent = %self.name, variable = %name, "missing template variable, substituting placeholder");
                    variables.insert(name, "?".to_string());
                }
                Err(e) => {
                    tracing::warn!(agent = %self.name, error = %e, "render failed, degrading to generic response");
                    break;
                }
            }
        }
        format!("{}: acknowledged '{}'.", self.name, context)
    }

    /// Rough analysis characterization from the precision/creativity traits,
    /// defaulting to the middle of each scale.
    fn analysis_findings(&self) -> String {
        let precision = self.trait_value("precision").unwrap_or(0.5);
        let creativity = self.trait_value("creativity").unwrap_or(0.5);

        let style = if precision > 0.7 {
            "detailed and systematic"
        } else if precision > 0.4 {
            "balanced"
        } else {
            "high-level"
        };
        let angle = if creativity > 0.7 {
            "with innovative insights"
        } else if creativity > 0.4 {
            "with practical solutions"
        } else {
            "with standard approaches"
        };
        format!("{} analysis {}", style, angle)
    }

    /// Replace the agent's detailed traits. The document is written first
    /// and the evolution record appended second, so a crash between the two
    /// loses the audit entry, never the trait update.
    pub fn update_traits(
        &mut self,
        traits: HashMap<String, serde_json::Value>,
        reason: &str,
        confidence: f64,
    ) -> Result<()> {
        let old_traits = serde_json::to_value(&self.snapshot.detailed.detailed_traits)
            .map_err(|e| PersonaError::Internal(e.to_string()))?;
        let new_traits = serde_json::to_value(&traits)
            .map_err(|e| PersonaError::Internal(e.to_string()))?;

        self.documents
            .write(&self.name, DocumentUpdate::traits(traits))?;
        self.relational.append_evolution(
            &self.snapshot.agent.id,
            &EvolutionChange {
                change_type: "detailed_traits".to_string(),
                old_value: old_traits,
                new_value: new_traits,
                change_reason: reason.to_string(),
                confidence_score: confidence,
            },
        )?;
        self.reload()
    }

    /// Upsert today's memory summary from this session's activity.
    pub fn record_today(&self, key_events: Vec<String>, primary_context: &str) -> Result<()> {
        self.relational.record_memory_summary(&MemorySummary {
            agent_id: self.snapshot.agent.id.clone(),
            event_date: Utc::now().date_naive(),
            key_events,
            interaction_count: i64::from(self.interactions_this_session),
            mood_indicator: self.session_mood(),
            primary_context: primary_context.to_string(),
            learning_insights: vec![],
        })
    }

    pub fn memory_report(&self, window_days: i64) -> Result<MemoryReport> {
        MemoryReporter::new(self.relational)
            .with_context_limit(self.context_limit)
            .summarize(&self.name, window_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        relational: RelationalStore,
        documents: DocumentStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let relational =
            RelationalStore::open_path(dir.path().join("personas.db")).expect("open");
        let documents = DocumentStore::new(dir.path().join("personalities")).expect("new");
        Fixture {
            _dir: dir,
            relational,
            documents,
        }
    }

    #[test]
    fn bootstrap_registers_and_loads() {
        let fx = fixture();
        let agent =
            PersonaAgent::bootstrap("helper", "general", &[], &fx.relational, &fx.documents)
                .expect("bootstrap");
        assert_eq!(agent.snapshot().agent.name, "helper");
        assert_eq!(agent.snapshot().core.personality_type, "generic");
    }

    #[test]
    fn responses_render_from_default_patterns() {
        let fx = fixture();
        let mut agent =
            PersonaAgent::bootstrap("helper", "general", &[], &fx.relational, &fx.documents)
                .expect("bootstrap");

        let greeting = agent.respond("hi", "greeting");
        assert!(greeting.contains("helper"), "got: {}", greeting);

        let analysis = agent.respond("system load", "analysis");
        assert!(analysis.contains("system load"), "got: {}", analysis);
        assert!(analysis.contains("balanced"), "got: {}", analysis);

        let completion = agent.respond("backup", "completion");
        assert!(completion.contains("backup"), "got: {}", completion);

        assert_eq!(agent.interactions_this_session(), 3);
        assert_eq!(agent.session_mood(), MoodIndicator::Neutral);
    }

    #[test]
    fn unknown_response_type_still_answers() {
        let fx = fixture();
        let mut agent =
            PersonaAgent::bootstrap("helper", "general", &[], &fx.relational, &fx.documents)
                .expect("bootstrap");
        let reply = agent.respond("whatever", "soliloquy");
        assert!(!reply.is_empty());
    }

    #[test]
    fn missing_variables_are_patched_not_fatal() {
        let fx = fixture();
        let mut patterns = HashMap::new();
        patterns.insert(
            "greeting".to_string(),
            "Hi, {operator_name}! I'm {agent_name}.".to_string(),
        );
        fx.documents
            .write("helper", DocumentUpdate::patterns(patterns))
            .expect("write");

        let mut agent =
            PersonaAgent::bootstrap("helper", "general", &[], &fx.relational, &fx.documents)
                .expect("bootstrap");
        let reply = agent.respond("hi", "greeting");
        assert_eq!(reply, "Hi, ?! I'm helper.");
    }

    #[test]
    fn trait_update_is_document_first_with_audit_and_reload() {
        let fx = fixture();
        let mut agent =
            PersonaAgent::bootstrap("helper", "general", &[], &fx.relational, &fx.documents)
                .expect("bootstrap");

        let mut traits = HashMap::new();
        traits.insert("precision".to_string(), json!(0.9));
        agent
            .update_traits(traits, "calibration pass", 0.8)
            .expect("update");

        // cached snapshot reflects the write after the internal reload
        assert_eq!(agent.trait_value("precision"), Some(0.9));

        let history = fx
            .relational
            .evolution_history(&agent.snapshot().agent.id, 10)
            .expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].change_type, "detailed_traits");
    }

    #[test]
    fn configured_context_limit_flows_into_the_report() {
        let fx = fixture();
        let agent = PersonaAgent::bootstrap("busy", "ops", &[], &fx.relational, &fx.documents)
            .expect("bootstrap")
            .with_context_limit(1);

        let today = Utc::now().date_naive();
        for (i, context) in ["alpha", "beta"].iter().enumerate() {
            fx.relational
                .record_memory_summary(&MemorySummary {
                    agent_id: agent.snapshot().agent.id.clone(),
                    event_date: today - chrono::Duration::days(i as i64),
                    key_events: vec![],
                    interaction_count: 1,
                    mood_indicator: MoodIndicator::Neutral,
                    primary_context: context.to_string(),
                    learning_insights: vec![],
                })
                .expect("write");
        }

        let report = agent.memory_report(7).expect("report");
        assert_eq!(report.recent_contexts, vec!["alpha"]);
    }

    #[test]
    fn session_activity_lands_in_the_memory_report() {
        let fx = fixture();
        let mut agent =
            PersonaAgent::bootstrap("helper", "general", &[], &fx.relational, &fx.documents)
                .expect("bootstrap");

        for i in 0..7 {
            agent.respond(&format!("task {}", i), "completion");
        }
        agent
            .record_today(vec!["finished seven tasks".to_string()], "maintenance")
            .expect("record");

        let report = agent.memory_report(7).expect("report");
        assert_eq!(report.total_interactions, 7);
        assert_eq!(report.dominant_mood, Some(MoodIndicator::Engaged));
        assert_eq!(report.recent_contexts, vec!["maintenance"]);
    }
}
