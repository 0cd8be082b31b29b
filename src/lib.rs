//! Hybrid personality storage for autonomous agents.
//!
//! Agent personalities live in two stores: a relational SQLite database
//! (identity, core metadata, relationships, daily memory summaries, message
//! templates, an append-only evolution log) and one JSON document per agent
//! (detailed traits, response patterns, learning history, contextual
//! memories). [`loader::PersonalityLoader`] reconciles both into an
//! immutable [`loader::PersonalitySnapshot`]; [`template::TemplateEngine`]
//! renders personality-conditioned text from it, and
//! [`report::MemoryReporter`] digests recent activity.

pub mod agent;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod loader;
pub mod model;
pub mod relational;
pub mod report;
pub mod template;

pub use agent::PersonaAgent;
pub use config::StoreConfig;
pub use document::{DetailedPersonality, DocumentStore, DocumentUpdate};
pub use error::{PersonaError, Result};
pub use graph::{AgentRelation, RelationshipGraph};
pub use loader::{PersonalityLoader, PersonalitySnapshot};
pub use model::{
    Agent, AuthorityLevel, CorePersonality, CorePersonalityUpdate, EvolutionChange,
    EvolutionRecord, MemorySummary, MessageTemplate, MoodIndicator, Relationship,
    RelationshipKind,
};
pub use relational::RelationalStore;
pub use report::{MemoryReport, MemoryReporter};
pub use template::{RenderedResponse, TemplateEngine, TemplateSource};
