//! Transitive closure of hypernym relations.
//!
//! The walk keeps an explicit queue and visited set instead of recursing, so
//! it terminates on malformed data with hypernym cycles or self-loops and
//! expands every synset at most once.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::graph::{GraphError, LexicalGraph};
use crate::models::{Synset, SynsetId};

/// Breadth-first iterator over the hypernym ancestors of a synset.
///
/// Yields each reachable ancestor exactly once, nearest first, and never
/// yields the start synset itself even when a cycle leads back to it.
/// Hypernym targets missing from the graph are skipped.
pub struct Ancestors<'g> {
    graph: &'g LexicalGraph,
    queue: VecDeque<&'g SynsetId>,
    visited: HashSet<&'g SynsetId>,
}

impl<'g> Ancestors<'g> {
    fn enqueue_hypernyms(&mut self, synset: &'g Synset) {
        for relation in &synset.hypernyms {
            if self.visited.insert(&relation.id) {
                self.queue.push_back(&relation.id);
            }
        }
    }
}

impl<'g> Iterator for Ancestors<'g> {
    type Item = &'g Synset;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.queue.pop_front() {
            let Ok(synset) = self.graph.get(id) else {
                warn!(synset = %id, "skipping hypernym missing from graph");
                continue;
            };
            self.enqueue_hypernyms(synset);
            return Some(synset);
        }
        None
    }
}

/// Starts an ancestor walk from `start`.
///
/// # Errors
///
/// Returns `GraphError::NotFound` if `start` is not in the graph.
pub fn ancestors<'g>(graph: &'g LexicalGraph, start: &SynsetId) -> Result<Ancestors<'g>, GraphError> {
    let root = graph.get(start)?;
    let mut walk = Ancestors {
        graph,
        queue: VecDeque::new(),
        visited: HashSet::from([&root.id]),
    };
    walk.enqueue_hypernyms(root);
    Ok(walk)
}

/// Computes the set of all ids reachable from `start` through hypernym
/// relations, excluding `start`.
///
/// Membership is fixed for a given graph and start id; callers that need a
/// stable order must sort.
///
/// # Errors
///
/// Returns `GraphError::NotFound` if `start` is not in the graph.
///
/// # Examples
///
/// ```
/// use hyres::{LexicalGraph, SynsetBuilder, SynsetId};
/// use hyres::closure::ancestor_closure;
///
/// let graph = LexicalGraph::build(vec![
///     SynsetBuilder::new("c-n").hypernym("b-n").build(),
///     SynsetBuilder::new("b-n").hypernym("a-n").build(),
///     SynsetBuilder::new("a-n").build(),
/// ])?;
///
/// let closure = ancestor_closure(&graph, &SynsetId::new("c-n"))?;
/// assert_eq!(closure.len(), 2);
/// assert!(closure.contains(&SynsetId::new("a-n")));
/// # Ok::<(), hyres::GraphError>(())
/// ```
pub fn ancestor_closure(
    graph: &LexicalGraph,
    start: &SynsetId,
) -> Result<HashSet<SynsetId>, GraphError> {
    let closure: HashSet<SynsetId> = ancestors(graph, start)?
        .map(|synset| synset.id.clone())
        .collect();
    debug!(start = %start, ancestors = closure.len(), "computed ancestor closure");
    Ok(closure)
}
