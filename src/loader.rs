use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::document::{DetailedPersonality, DocumentStore};
use crate::error::{PersonaError, Result};
use crate::graph::{AgentRelation, RelationshipGraph};
use crate::model::{Agent, CorePersonality};
use crate::relational::RelationalStore;

/// The merged view of one agent's personality at one point in time.
///
/// Immutable once produced: edits go through the store write APIs and a
/// fresh `load`, never by mutating a cached snapshot, so the cache can
/// never silently diverge from storage.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalitySnapshot {
    pub agent: Agent,
    pub core: CorePersonality,
    pub detailed: DetailedPersonality,
    pub relationships: Vec<AgentRelation>,
    pub loaded_at: DateTime<Utc>,
}

impl PersonalitySnapshot {
    pub fn trait_value(&self, name: &str) -> Option<f64> {
        self.detailed.trait_value(name)
    }
}

/// Pulls from the relational store, the document store, and the
/// relationship graph and reconciles the three into one snapshot.
///
/// Precedence: core metadata (type / style / authority) comes from the
/// relational side, traits / templates / memory from the document side,
/// relationships ride along as a side-channel.
pub struct PersonalityLoader<'a> {
    relational: &'a RelationalStore,
    documents: &'a DocumentStore,
}

impl<'a> PersonalityLoader<'a> {
    pub fn new(relational: &'a RelationalStore, documents: &'a DocumentStore) -> Self {
        Self {
            relational,
            documents,
        }
    }

    pub fn load(&self, agent_name: &str) -> Result<PersonalitySnapshot> {
        let agent = self
            .relational
            .get_agent(agent_name)?
            .ok_or_else(|| PersonaError::AgentNotFound(agent_name.to_string()))?;

        // An agent may exist before its personality is configured; that is
        // "not configured", not an error.
        let core = match self.relational.get_core_personality(&agent.id)? {
            Some(core) => core,
            None => {
                tracing::debug!(agent_name, "no core personality row, using defaults");
                CorePersonality::unconfigured(&agent.id)
            }
        };

        let detailed = self.documents.read(agent_name)?;
        let relationships = RelationshipGraph::new(self.relational).for_agent(&agent.id)?;

        tracing::debug!(
            agent_name,
            personality_type = %core.personality_type,
            relationships = relationships.len(),
            "personality loaded"
        );

        Ok(PersonalitySnapshot {
            agent,
            core,
            detailed,
            relationships,
            loaded_at: Utc::now(),
        })
    }

    pub fn relational(&self) -> &RelationalStore {
        self.relational
    }

    pub fn documents(&self) -> &DocumentStore {
        self.documents
    }
}
