use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::RelationshipKind;
use crate::relational::RelationalStore;

/// One relationship as seen from a specific agent's side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRelation {
    pub other_agent: String,
    pub kind: RelationshipKind,
    pub strength_score: f64,
    pub description: String,
    pub last_interaction: DateTime<Utc>,
}

/// Agent-centric view over stored relationships.
///
/// Storage direction carries no meaning, so a pair stored as (A, B) is
/// returned for queries on either A or B with the "other" side resolved.
/// Ordering is by absolute strength (most significant first), ties broken
/// by most recent interaction.
pub struct RelationshipGraph<'a> {
    store: &'a RelationalStore,
}

impl<'a> RelationshipGraph<'a> {
    pub fn new(store: &'a RelationalStore) -> Self {
        Self { store }
    }

    pub fn for_agent(&self, agent_id: &str) -> Result<Vec<AgentRelation>> {
        let mut relations: Vec<AgentRelation> = self
            .store
            .list_relationships(agent_id)?
            .into_iter()
            .map(|r| {
                let other_agent = if r.agent_1_id == agent_id {
                    r.agent_2_name
                } else {
                    r.agent_1_name
                };
                AgentRelation {
                    other_agent,
                    kind: r.kind,
                    strength_score: r.strength_score,
                    description: r.description,
                    last_interaction: r.last_interaction,
                }
            })
            .collect();

        relations.sort_by(|a, b| {
            b.strength_score
                .abs()
                .partial_cmp(&a.strength_score.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.last_interaction.cmp(&a.last_interaction))
        });

        Ok(relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, RelationalStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RelationalStore::open_path(dir.path().join("personas.db")).expect("open");
        (dir, store)
    }

    #[test]
    fn relationship_visible_from_both_sides() {
        let (_dir, store) = temp_store();
        let a = store.register_agent("a", "ops", &[]).expect("register");
        let b = store.register_agent("b", "ops", &[]).expect("register");
        store
            .add_relationship(&a.id, &b.id, RelationshipKind::Mentorship, 0.7, "mentor")
            .expect("insert");

        let graph = RelationshipGraph::new(&store);

        let from_a = graph.for_agent(&a.id).expect("for a");
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].other_agent, "b");
        assert_eq!(from_a[0].kind, RelationshipKind::Mentorship);

        let from_b = graph.for_agent(&b.id).expect("for b");
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].other_agent, "a");
        assert!((from_b[0].strength_score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn strong_negative_ties_outrank_weak_positive_ones() {
        let (_dir, store) = temp_store();
        let a = store.register_agent("a", "ops", &[]).expect("register");
        let b = store.register_agent("b", "ops", &[]).expect("register");
        let c = store.register_agent("c", "ops", &[]).expect("register");

        store
            .add_relationship(&a.id, &b.id, RelationshipKind::Neutral, 0.3, "")
            .expect("insert");
        store
            .add_relationship(&a.id, &c.id, RelationshipKind::Tension, -0.8, "rivals")
            .expect("insert");

        let relations = RelationshipGraph::new(&store).for_agent(&a.id).expect("query");
        assert_eq!(relations[0].other_agent, "c");
        assert_eq!(relations[1].other_agent, "b");
    }
}
