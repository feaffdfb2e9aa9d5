//! Immutable, id-indexed store of decoded synsets.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;
use tracing::info;

use crate::models::{RelationKind, Synset, SynsetId};

/// Errors raised while building or querying a [`LexicalGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two synsets share an id.
    #[error("duplicate synset id: {0}")]
    DuplicateId(SynsetId),

    /// A lookup referenced an id that is not in the graph.
    #[error("synset not found: {0}")]
    NotFound(SynsetId),
}

/// A relation whose target is not present in the graph.
///
/// Dangling references are a data quality problem, not a fatal one; they are
/// collected by [`LexicalGraph::validate_integrity`] and reported in bulk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IntegrityWarning {
    pub source: SynsetId,
    pub kind: RelationKind,
    pub target: SynsetId,
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}): target synset is missing",
            self.source, self.target, self.kind
        )
    }
}

/// The full set of synsets, indexed by id.
///
/// Built once and then only read; it holds no interior mutability, so a
/// shared `&LexicalGraph` can be used from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct LexicalGraph {
    synsets: HashMap<SynsetId, Synset>,
}

impl LexicalGraph {
    /// Indexes the given synsets by id.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateId` if two synsets share an id.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyres::{LexicalGraph, SynsetBuilder, SynsetId};
    ///
    /// let graph = LexicalGraph::build(vec![
    ///     SynsetBuilder::new("00000002-n").hypernym("00000001-n").build(),
    ///     SynsetBuilder::new("00000001-n").build(),
    /// ])?;
    /// assert_eq!(graph.len(), 2);
    /// assert!(graph.get(&SynsetId::new("00000001-n")).is_ok());
    /// # Ok::<(), hyres::GraphError>(())
    /// ```
    pub fn build(synsets: impl IntoIterator<Item = Synset>) -> Result<Self, GraphError> {
        let iter = synsets.into_iter();
        let mut index = HashMap::with_capacity(iter.size_hint().0);
        for synset in iter {
            if index.contains_key(&synset.id) {
                return Err(GraphError::DuplicateId(synset.id));
            }
            index.insert(synset.id.clone(), synset);
        }
        info!(synsets = index.len(), "built lexical graph");
        Ok(Self { synsets: index })
    }

    /// Loads a graph from the JSON object written by [`Serialize`]
    /// (synset id mapped to synset).
    ///
    /// # Errors
    ///
    /// Fails if the JSON does not match the synset schema, or if a key does
    /// not match the `id` field of its value.
    pub fn from_json<R: Read>(reader: R) -> anyhow::Result<Self> {
        let map: BTreeMap<SynsetId, Synset> = serde_json::from_reader(reader)?;
        if let Some((key, synset)) = map.iter().find(|(key, synset)| **key != synset.id) {
            anyhow::bail!("entry keyed {key} carries id {}", synset.id);
        }
        Ok(Self::build(map.into_values())?)
    }

    /// Looks up a synset by id.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NotFound` if no synset has that id.
    pub fn get(&self, id: &SynsetId) -> Result<&Synset, GraphError> {
        self.synsets
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    /// Returns true if a synset with this id exists.
    pub fn contains(&self, id: &SynsetId) -> bool {
        self.synsets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.synsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synsets.is_empty()
    }

    /// Iterates over all synsets in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Synset> {
        self.synsets.values()
    }

    /// Scans every relation of every synset for targets missing from the graph.
    ///
    /// Returns one warning per dangling reference, sorted by source, kind and
    /// target. Never fails.
    pub fn validate_integrity(&self) -> Vec<IntegrityWarning> {
        let mut warnings: Vec<IntegrityWarning> = self
            .synsets
            .values()
            .flat_map(|synset| {
                synset
                    .relations()
                    .into_iter()
                    .filter(move |(_, target)| !self.contains(target))
                    .map(move |(kind, target)| IntegrityWarning {
                        source: synset.id.clone(),
                        kind,
                        target: target.clone(),
                    })
            })
            .collect();
        warnings.sort();
        warnings
    }

    /// Returns the ids of synsets with two or more hypernyms, sorted.
    ///
    /// These are the synsets whose hypernyms need to be collapsed into one.
    pub fn multi_hypernym_ids(&self) -> Vec<&SynsetId> {
        let mut ids: Vec<&SynsetId> = self
            .synsets
            .values()
            .filter(|synset| synset.hypernyms.len() >= 2)
            .map(|synset| &synset.id)
            .collect();
        ids.sort();
        ids
    }
}

impl Serialize for LexicalGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut ids: Vec<&SynsetId> = self.synsets.keys().collect();
        ids.sort();
        let mut map = serializer.serialize_map(Some(ids.len()))?;
        for id in ids {
            map.serialize_entry(id, &self.synsets[id])?;
        }
        map.end()
    }
}
