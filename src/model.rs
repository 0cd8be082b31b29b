use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered agent. Identity is immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub category: String,
    pub capabilities: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Authority tier stored alongside the core personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorityLevel {
    Low,
    Medium,
    High,
}

impl AuthorityLevel {
    pub fn as_db_str(self) -> &'static str {
        match self {
            AuthorityLevel::Low => "LOW",
            AuthorityLevel::Medium => "MEDIUM",
            AuthorityLevel::High => "HIGH",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => AuthorityLevel::Low,
            "HIGH" => AuthorityLevel::High,
            _ => AuthorityLevel::Medium,
        }
    }
}

/// Relationally-stored personality metadata, one row per agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorePersonality {
    pub agent_id: String,
    pub personality_type: String,
    pub communication_style: String,
    pub authority_level: AuthorityLevel,
    pub cultural_background: String,
    pub expertise_domains: Vec<String>,
    pub management_philosophy: String,
    /// 0.0 (dormant) to 1.0 (hyperactive).
    pub activity_level: f64,
    pub updated_at: DateTime<Utc>,
}

impl CorePersonality {
    /// Minimal placeholder for agents that exist but were never configured.
    /// Distinguishes "not configured" from "misconfigured"; the latter is an
    /// error, this is not.
    pub fn unconfigured(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            personality_type: "generic".to_string(),
            communication_style: "neutral".to_string(),
            authority_level: AuthorityLevel::Medium,
            cultural_background: String::new(),
            expertise_domains: Vec::new(),
            management_philosophy: String::new(),
            activity_level: 0.5,
            updated_at: Utc::now(),
        }
    }
}

/// Field-wise update for [`CorePersonality`]. `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct CorePersonalityUpdate {
    pub personality_type: Option<String>,
    pub communication_style: Option<String>,
    pub authority_level: Option<AuthorityLevel>,
    pub cultural_background: Option<String>,
    pub expertise_domains: Option<Vec<String>>,
    pub management_philosophy: Option<String>,
    pub activity_level: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Alliance,
    Tension,
    Neutral,
    Mentorship,
    /// Forward-compat slot for kinds this build does not know about.
    Other,
}

impl RelationshipKind {
    pub fn as_db_str(self) -> &'static str {
        match self {
            RelationshipKind::Alliance => "alliance",
            RelationshipKind::Tension => "tension",
            RelationshipKind::Neutral => "neutral",
            RelationshipKind::Mentorship => "mentorship",
            RelationshipKind::Other => "other",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "alliance" => RelationshipKind::Alliance,
            "tension" => RelationshipKind::Tension,
            "neutral" => RelationshipKind::Neutral,
            "mentorship" => RelationshipKind::Mentorship,
            _ => RelationshipKind::Other,
        }
    }
}

/// One edge between two distinct agents. Stored once per unordered pair;
/// the stored direction carries no meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub agent_1_id: String,
    pub agent_1_name: String,
    pub agent_2_id: String,
    pub agent_2_name: String,
    pub kind: RelationshipKind,
    /// -1.0 (adversarial) to 1.0 (strong alliance).
    pub strength_score: f64,
    pub description: String,
    pub last_interaction: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodIndicator {
    Vigilant,
    Satisfied,
    Concerned,
    Neutral,
    Focused,
    Engaged,
    Active,
    Other,
}

impl MoodIndicator {
    pub fn as_db_str(self) -> &'static str {
        match self {
            MoodIndicator::Vigilant => "vigilant",
            MoodIndicator::Satisfied => "satisfied",
            MoodIndicator::Concerned => "concerned",
            MoodIndicator::Neutral => "neutral",
            MoodIndicator::Focused => "focused",
            MoodIndicator::Engaged => "engaged",
            MoodIndicator::Active => "active",
            MoodIndicator::Other => "other",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vigilant" => MoodIndicator::Vigilant,
            "satisfied" => MoodIndicator::Satisfied,
            "concerned" => MoodIndicator::Concerned,
            "neutral" => MoodIndicator::Neutral,
            "focused" => MoodIndicator::Focused,
            "engaged" => MoodIndicator::Engaged,
            "active" => MoodIndicator::Active,
            _ => MoodIndicator::Other,
        }
    }
}

/// One day's aggregated interaction record for an agent, unique per
/// (agent, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySummary {
    pub agent_id: String,
    pub event_date: NaiveDate,
    pub key_events: Vec<String>,
    pub interaction_count: i64,
    pub mood_indicator: MoodIndicator,
    pub primary_context: String,
    pub learning_insights: Vec<String>,
}

/// Payload for one personality change written to the evolution log.
#[derive(Debug, Clone)]
pub struct EvolutionChange {
    pub change_type: String,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
    pub change_reason: String,
    /// 0.0 to 1.0 confidence that the change reflects real drift.
    pub confidence_score: f64,
}

/// Immutable audit entry. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionRecord {
    pub id: String,
    pub agent_id: String,
    pub change_type: String,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
    pub change_reason: String,
    pub confidence_score: f64,
    pub recorded_at: DateTime<Utc>,
}

/// A globally-stored fallback template with usage bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub personality_type: String,
    pub template_type: String,
    pub template_text: String,
    pub usage_frequency: i64,
    /// Running average of caller-reported outcomes, 0.0 to 1.0.
    pub success_rate: f64,
    pub last_used: Option<DateTime<Utc>>,
}
