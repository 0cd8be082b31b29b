use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PersonaError, Result};

/// One append-only learning-history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    pub date: NaiveDate,
    pub event: String,
    pub insight: String,
    /// 0.0 to 1.0 confidence in the insight.
    pub confidence: f64,
}

/// One append-only contextual memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextualMemory {
    pub context: String,
    pub memory: String,
    pub frequency: i64,
    pub last_used: DateTime<Utc>,
}

/// The semi-structured half of an agent's personality, stored as one JSON
/// document per agent. Known top-level keys are typed; anything else
/// round-trips through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DetailedPersonality {
    /// Trait name -> numeric score or nested structure.
    #[serde(default)]
    pub detailed_traits: HashMap<String, serde_json::Value>,

    /// Response-type key -> template string with `{variable}` placeholders.
    #[serde(default)]
    pub response_patterns: HashMap<String, String>,

    #[serde(default)]
    pub learning_history: Vec<LearningEvent>,

    #[serde(default)]
    pub contextual_memories: Vec<ContextualMemory>,

    #[serde(default)]
    pub communication_preferences: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub work_patterns: HashMap<String, serde_json::Value>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl DetailedPersonality {
    /// Skeleton used when an agent has no document yet: empty traits and a
    /// minimal set of generic response patterns.
    pub fn default_skeleton(agent_name: &str) -> Self {
        let mut response_patterns = HashMap::new();
        response_patterns.insert(
            "greeting".to_string(),
            "Hello! I'm {agent_name}, ready to help.".to_string(),
        );
        response_patterns.insert(
            "analysis".to_string(),
            "Analyzing {context}: {findings}".to_string(),
        );
        response_patterns.insert(
            "completion".to_string(),
            "Task completed: {summary}".to_string(),
        );

        tracing::debug!(agent_name, "synthesized default personality document");
        Self {
            response_patterns,
            ..Default::default()
        }
    }

    /// Numeric trait lookup; nested or non-numeric values return `None`.
    pub fn trait_value(&self, name: &str) -> Option<f64> {
        self.detailed_traits.get(name).and_then(|v| v.as_f64())
    }
}

/// A partial document update. Replaceable keys are `Option` (set = replace
/// that key wholesale, `None` = leave untouched); append-only keys are
/// plain vectors whose entries are concatenated onto the stored sequence.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub detailed_traits: Option<HashMap<String, serde_json::Value>>,
    pub response_patterns: Option<HashMap<String, String>>,
    pub communication_preferences: Option<HashMap<String, serde_json::Value>>,
    pub work_patterns: Option<HashMap<String, serde_json::Value>>,
    pub learning_events: Vec<LearningEvent>,
    pub contextual_memories: Vec<ContextualMemory>,
}

impl DocumentUpdate {
    pub fn traits(traits: HashMap<String, serde_json::Value>) -> Self {
        Self {
            detailed_traits: Some(traits),
            ..Default::default()
        }
    }

    pub fn patterns(patterns: HashMap<String, String>) -> Self {
        Self {
            response_patterns: Some(patterns),
            ..Default::default()
        }
    }
}

/// Accessor over the per-agent JSON documents.
///
/// A missing document is valid and reads as the default skeleton; only
/// malformed content is an error. Write semantics are a *shallow merge at
/// the top-level key*: replacing `detailed_traits` wholesale leaves
/// `response_patterns` and every other sibling untouched, and vice versa.
/// The two append-only keys (`learning_history`, `contextual_memories`)
/// are the exception: updates concatenate, never replace.
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    fn document_path(&self, agent_name: &str) -> PathBuf {
        self.dir.join(format!("{}_personality.json", agent_name))
    }

    pub fn exists(&self, agent_name: &str) -> bool {
        self.document_path(agent_name).exists()
    }

    /// Read an agent's document, synthesizing the default skeleton when the
    /// file does not exist. Malformed content is `CorruptDocument`, never
    /// silently defaulted.
    pub fn read(&self, agent_name: &str) -> Result<DetailedPersonality> {
        let path = self.document_path(agent_name);
        if !path.exists() {
            return Ok(DetailedPersonality::default_skeleton(agent_name));
        }

        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents)
            .map_err(|e| PersonaError::corrupt_document(agent_name, e))
    }

    /// Apply a partial update and persist the merged document, returning it.
    pub fn write(&self, agent_name: &str, update: DocumentUpdate) -> Result<DetailedPersonality> {
        let mut document = self.read(agent_name)?;

        if let Some(traits) = update.detailed_traits {
            document.detailed_traits = traits;
        }
        if let Some(patterns) = update.response_patterns {
            document.response_patterns = patterns;
        }
        if let Some(preferences) = update.communication_preferences {
            document.communication_preferences = preferences;
        }
        if let Some(patterns) = update.work_patterns {
            document.work_patterns = patterns;
        }
        document.learning_history.extend(update.learning_events);
        document
            .contextual_memories
            .extend(update.contextual_memories);

        self.persist(agent_name, &document)?;
        Ok(document)
    }

    /// Serialize and atomically replace the document file (temp file in the
    /// same directory, then rename).
    fn persist(&self, agent_name: &str, document: &DetailedPersonality) -> Result<()> {
        let path = self.document_path(agent_name);
        let tmp = self.dir.join(format!(".{}_personality.json.tmp", agent_name));

        let contents = serde_json::to_string_pretty(document)
            .map_err(|e| PersonaError::Internal(e.to_string()))?;
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;

        tracing::info!(agent_name, path = %path.display(), "personality document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("personalities")).expect("new");
        (dir, store)
    }

    #[test]
    fn missing_document_reads_as_default_skeleton() {
        let (_dir, store) = temp_store();
        let document = store.read("nobody").expect("read");
        assert!(document.detailed_traits.is_empty());
        for key in ["greeting", "analysis", "completion"] {
            assert!(document.response_patterns.contains_key(key), "missing {}", key);
        }
        assert!(!store.exists("nobody"));
    }

    #[test]
    fn corrupt_document_is_an_error_not_a_default() {
        let (_dir, store) = temp_store();
        fs::write(store.document_path("broken"), "{not json").expect("write");
        let err = store.read("broken").expect_err("should fail");
        assert!(matches!(err, PersonaError::CorruptDocument { .. }));
    }

    #[test]
    fn trait_update_leaves_response_patterns_untouched() {
        let (_dir, store) = temp_store();

        let mut patterns = HashMap::new();
        patterns.insert("greeting".to_string(), "Hi from {agent_name}".to_string());
        store
            .write("sentinel", DocumentUpdate::patterns(patterns))
            .expect("seed patterns");

        let mut traits = HashMap::new();
        traits.insert("vigilance_level".to_string(), json!(0.9));
        let merged = store
            .write("sentinel", DocumentUpdate::traits(traits))
            .expect("write traits");

        assert_eq!(merged.trait_value("vigilance_level"), Some(0.9));
        assert_eq!(
            merged.response_patterns.get("greeting").map(String::as_str),
            Some("Hi from {agent_name}")
        );

        // and the merge survives a round-trip through disk
        let reread = store.read("sentinel").expect("reread");
        assert_eq!(reread.trait_value("vigilance_level"), Some(0.9));
        assert!(reread.response_patterns.contains_key("greeting"));
    }

    #[test]
    fn append_only_sequences_concatenate() {
        let (_dir, store) = temp_store();
        let event = |name: &str| LearningEvent {
            date: Utc::now().date_naive(),
            event: name.to_string(),
            insight: "noted".to_string(),
            confidence: 0.7,
        };

        store
            .write(
                "sentinel",
                DocumentUpdate {
                    learning_events: vec![event("first")],
                    ..Default::default()
                },
            )
            .expect("first append");
        let merged = store
            .write(
                "sentinel",
                DocumentUpdate {
                    learning_events: vec![event("second")],
                    ..Default::default()
                },
            )
            .expect("second append");

        let events: Vec<_> = merged.learning_history.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events, vec!["first", "second"]);
    }

    #[test]
    fn unknown_top_level_keys_round_trip() {
        let (_dir, store) = temp_store();
        let path = store.document_path("sentinel");
        fs::write(
            &path,
            r#"{"detailed_traits": {"focus": 0.5}, "custom_notes": ["keep me"]}"#,
        )
        .expect("write raw");

        let mut traits = HashMap::new();
        traits.insert("focus".to_string(), json!(0.8));
        store
            .write("sentinel", DocumentUpdate::traits(traits))
            .expect("update");

        let reread = store.read("sentinel").expect("reread");
        assert_eq!(reread.extra.get("custom_notes"), Some(&json!(["keep me"])));
    }

    #[test]
    fn numeric_trait_lookup_ignores_nested_values() {
        let mut document = DetailedPersonality::default_skeleton("x");
        document
            .detailed_traits
            .insert("vigilance".to_string(), json!(0.9));
        document
            .detailed_traits
            .insert("nested".to_string(), json!({"inner": 1.0}));
        assert_eq!(document.trait_value("vigilance"), Some(0.9));
        assert_eq!(document.trait_value("nested"), None);
        assert_eq!(document.trait_value("absent"), None);
    }
}
