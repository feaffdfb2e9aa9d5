//! Context assembly for hypernym resolution.
//!
//! A [`ContextBundle`] is everything the deciding model gets to see about one
//! target synset: the synset itself, a reduced view of every hypernym
//! ancestor, and a reduced view of the synsets one hop away through
//! holonym, meronym, domain, domain member or attribute relations.

use std::collections::HashSet;

use serde::Serialize;
use serde::ser::{SerializeSeq, Serializer};
use tracing::{debug, warn};

use crate::closure;
use crate::graph::{GraphError, LexicalGraph};
use crate::models::{HypernymType, OtherType, Relation, RelationKind, Synset, SynsetId, Word};

/// Reduced view of a hypernym ancestor: enough to keep following the chain
/// towards a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AncestorProjection {
    pub id: SynsetId,
    pub words: Vec<Word>,
    pub gloss: String,
    pub hypernyms: Vec<Relation<HypernymType>>,
}

impl From<&Synset> for AncestorProjection {
    fn from(synset: &Synset) -> Self {
        Self {
            id: synset.id.clone(),
            words: synset.words.clone(),
            gloss: synset.gloss.clone(),
            hypernyms: synset.hypernyms.clone(),
        }
    }
}

/// Reduced view of a synset one hop away from the target, tagged with the
/// relation that connects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedProjection {
    pub id: SynsetId,
    pub words: Vec<Word>,
    pub gloss: String,
    pub relation_type: RelationKind,
}

impl RelatedProjection {
    fn new(synset: &Synset, relation_type: RelationKind) -> Self {
        Self {
            id: synset.id.clone(),
            words: synset.words.clone(),
            gloss: synset.gloss.clone(),
            relation_type,
        }
    }
}

/// The bounded, deduplicated context built for one target synset.
///
/// Every element is an owned copy; nothing in a bundle aliases the graph, so
/// bundles for different targets can be built and tagged concurrently.
///
/// Serializes as a JSON array: the full target synset first, then the
/// ancestor projections, then the one-hop projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBundle {
    target: Synset,
    ancestors: Vec<AncestorProjection>,
    related: Vec<RelatedProjection>,
}

impl ContextBundle {
    /// The full target synset.
    pub fn target(&self) -> &Synset {
        &self.target
    }

    /// Hypernym ancestors, nearest first.
    pub fn ancestors(&self) -> &[AncestorProjection] {
        &self.ancestors
    }

    /// One-hop neighbours not already covered by the ancestors.
    pub fn related(&self) -> &[RelatedProjection] {
        &self.related
    }

    /// Returns true if `id` is the target or any synset surfaced in the bundle.
    pub fn contains(&self, id: &SynsetId) -> bool {
        self.target.id == *id
            || self.ancestors.iter().any(|a| a.id == *id)
            || self.related.iter().any(|r| r.id == *id)
    }

    /// Returns every id in the bundle, target first, in bundle order.
    pub fn ids(&self) -> Vec<&SynsetId> {
        std::iter::once(&self.target.id)
            .chain(self.ancestors.iter().map(|a| &a.id))
            .chain(self.related.iter().map(|r| &r.id))
            .collect()
    }

    /// Number of elements in the bundle, target included.
    pub fn len(&self) -> usize {
        1 + self.ancestors.len() + self.related.len()
    }

    /// Always false: a bundle contains at least its target.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Serialize for ContextBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        seq.serialize_element(&self.target)?;
        for ancestor in &self.ancestors {
            seq.serialize_element(ancestor)?;
        }
        for related in &self.related {
            seq.serialize_element(related)?;
        }
        seq.end()
    }
}

/// Returns true for relation kinds whose targets are surfaced as one-hop context.
fn is_context_relation(kind: RelationKind) -> bool {
    matches!(
        kind,
        RelationKind::Holonym(_)
            | RelationKind::Meronym(_)
            | RelationKind::Domain(_)
            | RelationKind::DomainMember(_)
            | RelationKind::Other(OtherType::Attribute)
    )
}

/// Builds the context bundle for `target_id`.
///
/// Ancestors come from the hypernym closure of the target. One-hop
/// neighbours are taken from the target's relation lists in schema order;
/// an id already in the closure is not repeated (the ancestor projection is
/// richer), and an id reachable through several relations keeps the first
/// one. References to synsets missing from the graph are skipped.
///
/// # Errors
///
/// Returns `GraphError::NotFound` if `target_id` is not in the graph.
///
/// # Examples
///
/// ```
/// use hyres::{LexicalGraph, SynsetBuilder, SynsetId};
/// use hyres::context::extract;
/// use hyres::models::{PartType, RelationKind};
///
/// let graph = LexicalGraph::build(vec![
///     SynsetBuilder::new("x-n")
///         .hypernym("a-n")
///         .relation(RelationKind::Holonym(PartType::Part), "c-n")
///         .build(),
///     SynsetBuilder::new("a-n").build(),
///     SynsetBuilder::new("c-n").build(),
/// ])?;
///
/// let bundle = extract(&graph, &SynsetId::new("x-n"))?;
/// assert_eq!(bundle.ancestors().len(), 1);
/// assert_eq!(bundle.related()[0].relation_type, RelationKind::Holonym(PartType::Part));
/// # Ok::<(), hyres::GraphError>(())
/// ```
pub fn extract(graph: &LexicalGraph, target_id: &SynsetId) -> Result<ContextBundle, GraphError> {
    let target = graph.get(target_id)?;

    let ancestors: Vec<AncestorProjection> = closure::ancestors(graph, target_id)?
        .map(AncestorProjection::from)
        .collect();

    let mut surfaced: HashSet<&SynsetId> = ancestors.iter().map(|a| &a.id).collect();
    surfaced.insert(target_id);

    let mut related = Vec::new();
    for (kind, id) in target.relations() {
        if !is_context_relation(kind) || !surfaced.insert(id) {
            continue;
        }
        match graph.get(id) {
            Ok(synset) => related.push(RelatedProjection::new(synset, kind)),
            Err(_) => warn!(target = %target_id, related = %id, "skipping relation to missing synset"),
        }
    }

    debug!(
        target = %target_id,
        ancestors = ancestors.len(),
        related = related.len(),
        "extracted context bundle"
    );

    Ok(ContextBundle {
        target: target.clone(),
        ancestors,
        related,
    })
}
