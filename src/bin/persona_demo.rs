use anyhow::Result;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

use agent_personas::{
    DocumentStore, DocumentUpdate, PersonaAgent, RelationalStore, StoreConfig,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agent_personas=debug")),
        )
        .init();

    let config = StoreConfig::load();
    tracing::info!(
        database = %config.database_path,
        documents = %config.document_dir,
        "persona demo starting"
    );

    let relational = RelationalStore::open(&config)?;
    let documents = DocumentStore::new(config.document_dir())?;

    // A fresh agent answers from the default personality.
    let mut agent = PersonaAgent::bootstrap(
        "example_agent",
        "general_purpose",
        &["conversation".to_string()],
        &relational,
        &documents,
    )?
    .with_context_limit(config.context_limit);

    println!("{}", agent.respond("Hello there!", "greeting"));
    println!("{}", agent.respond("system performance", "analysis"));
    println!("{}", agent.respond("data processing task", "completion"));

    // Customize the personality and watch the responses change.
    let mut traits = HashMap::new();
    traits.insert("creativity".to_string(), serde_json::json!(0.9));
    traits.insert("precision".to_string(), serde_json::json!(0.8));
    agent.update_traits(traits, "demo customization", 0.9)?;

    let mut patterns = agent.snapshot().detailed.response_patterns.clone();
    patterns.insert(
        "greeting".to_string(),
        "Hey there! {agent_name} here, at your creative service.".to_string(),
    );
    documents.write("example_agent", DocumentUpdate::patterns(patterns))?;
    agent.reload()?;

    println!("{}", agent.respond("Hi again!", "greeting"));
    println!("{}", agent.respond("brainstorming session", "analysis"));

    agent.record_today(
        vec!["demo walkthrough".to_string()],
        "demonstration",
    )?;
    println!("\n{}", agent.memory_report(7)?.render());

    Ok(())
}
