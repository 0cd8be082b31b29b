use regex_lite::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{PersonaError, Result};
use crate::loader::PersonalitySnapshot;
use crate::model::MessageTemplate;
use crate::relational::RelationalStore;

/// Where a rendered response's template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The agent's own `response_patterns` document entry.
    Snapshot,
    /// A stored `message_templates` row (id kept for outcome reporting).
    Stored(String),
    /// Neither store had anything; the built-in line was used.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct RenderedResponse {
    pub text: String,
    pub source: TemplateSource,
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[A-Za-z0-9_]+\}").expect("placeholder pattern is valid"));

/// Substitute `{name}` placeholders from the variable map. Pure: no
/// storage involved, so selection and substitution test independently.
///
/// Every placeholder must have a variable; the first missing one is a
/// `TemplateVariable` error the caller may catch and patch over.
pub fn substitute(template: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut cursor = 0;
    for found in PLACEHOLDER.find_iter(template) {
        // the match is "{name}"; strip the braces to get the variable name
        let name = &template[found.start() + 1..found.end() - 1];
        let value = variables
            .get(name)
            .ok_or_else(|| PersonaError::TemplateVariable(name.to_string()))?;
        output.push_str(&template[cursor..found.start()]);
        output.push_str(value);
        cursor = found.end();
    }
    output.push_str(&template[cursor..]);
    Ok(output)
}

/// Selects a response template for a snapshot and substitutes variables,
/// feeding usage statistics back to the relational store.
///
/// Lookup order: the snapshot's own `response_patterns`, then a stored
/// template for the snapshot's personality type (falling back to the
/// "generic" row), then a built-in line. An unknown response type is never
/// an error; agent interaction paths stay non-fatal.
pub struct TemplateEngine<'a> {
    store: &'a RelationalStore,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(store: &'a RelationalStore) -> Self {
        Self { store }
    }

    pub fn render(
        &self,
        snapshot: &PersonalitySnapshot,
        response_type: &str,
        variables: &HashMap<String, String>,
    ) -> Result<RenderedResponse> {
        let mut variables = variables.clone();
        variables
            .entry("agent_name".to_string())
            .or_insert_with(|| snapshot.agent.name.clone());

        if let Some(template) = snapshot.detailed.response_patterns.get(response_type) {
            let text = substitute(template, &variables)?;
            return Ok(RenderedResponse {
                text,
                source: TemplateSource::Snapshot,
            });
        }

        if let Some(template) = self.stored_template(&snapshot.core.personality_type, response_type)? {
            let text = substitute(&template.template_text, &variables)?;
            // Usage bookkeeping only applies to stored rows; document-held
            // patterns have no row to update.
            self.store.touch_template_usage(&template.id)?;
            return Ok(RenderedResponse {
                text,
                source: TemplateSource::Stored(template.id),
            });
        }

        tracing::warn!(
            agent = %snapshot.agent.name,
            response_type,
            "no template found, using fallback line"
        );
        Ok(RenderedResponse {
            text: format!(
                "{} has no '{}' response prepared.",
                snapshot.agent.name, response_type
            ),
            source: TemplateSource::Fallback,
        })
    }

    fn stored_template(
        &self,
        personality_type: &str,
        response_type: &str,
    ) -> Result<Option<MessageTemplate>> {
        if let Some(template) = self.store.find_template(personality_type, response_type)? {
            return Ok(Some(template));
        }
        if personality_type != "generic" {
            return self.store.find_template("generic", response_type);
        }
        Ok(None)
    }

    /// Report a caller-observed outcome for a stored template. Success is
    /// an explicit feedback signal, never inferred from rendering.
    pub fn report_outcome(&self, template_id: &str, success: bool) -> Result<MessageTemplate> {
        self.store.record_template_outcome(template_id, success)
    }
}
