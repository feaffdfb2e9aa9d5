//! Asking a language model how to collapse a synset's hypernyms into one.
//!
//! The [`HypernymResolver`] renders a [`ContextBundle`] into a task prompt,
//! sends it through a [`TextGenerator`], and turns the model's JSON answer
//! into an [`EditProposal`] ready for [`crate::edit::EditApplier`]. It does
//! not apply anything itself.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use hyres::{LexicalGraph, SynsetId};
//! use hyres::context::extract;
//! use hyres::ollama::OllamaClientBuilder;
//! use hyres::resolver::HypernymResolverBuilder;
//!
//! # fn example(graph: &LexicalGraph) -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClientBuilder::new()
//!     .base_url("http://localhost:11434")
//!     .build()?;
//! let resolver = HypernymResolverBuilder::new()
//!     .client(Arc::new(client))
//!     .build();
//!
//! let bundle = extract(graph, &SynsetId::new("02084071-n"))?;
//! let resolution = resolver.resolve("llama3.2", &bundle)?;
//! for record in resolution.proposal.records() {
//!     println!("{}: {} -> {}", record.other_id, record.old_type, record.new_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod breakdown;

pub use breakdown::{BreakdownResolver, BreakdownResolverBuilder};

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::context::ContextBundle;
use crate::edit::{EditProposal, EditRecord, EditSlot};
use crate::models::{Synset, SynsetId};
use crate::ollama::{OllamaError, TextGenerator};
use crate::prompt::render_context;

/// Task prompt. `{synset_id}` and `{wn_data}` are substituted before sending.
const PROMPT_TEMPLATE: &str = r#"You are a WordNet engineer.
----------------------------------------------------------------
Instructions:
Below, under "WordNet data", you are given synsets with their words,
glosses and relations, followed by the ID of a task synset. Study them
and answer the question.
----------------------------------------------------------------
Question:
How should the relations of the task synset change so that it keeps
exactly one hypernym, that hypernym is as specific as possible, and
every other relation stays accurate?
You may add, remove or change relations of the task synset only, as
allowed by the rules. Never change relations of any other synset.
----------------------------------------------------------------
Rules:
The task synset can have relations of these types:
- hypernym (regular or instance)
- holonym (part, substance or member)
- meronym (part, substance or member)
- domain (topic, region or usage)
- domain member (topic, region or usage)
- attribute
- antonym (read only)
Allowed changes:
- add a hypernym relation
- remove a hypernym relation
- change a hypernym relation into any other type except antonym
- change any other relation, except antonym, into a hypernym relation
A relation that has been changed once must not be changed again.
Only synsets listed under "WordNet data" may appear in a change.
Write relation types with their subtype, e.g. "part meronym" or
"topic domain".
----------------------------------------------------------------
Output format:
A JSON list of objects with these properties:
- old_type: relation type before the change, "" if there was none
- new_type: relation type after the change, "" if it is removed
- id: synset ID
- words: synset words
- gloss: synset gloss
The first object is the task synset with empty old_type and new_type.
Then list every synset whose relation to the task synset was added,
removed, changed or kept.
The last item of the list is a string with a short reasoning.
----------------------------------------------------------------
Task synset ID:
{synset_id}
----------------------------------------------------------------
WordNet data:
{wn_data}
----------------------------------------------------------------
Response:"#;

/// Errors from [`HypernymResolver::resolve`] and [`BreakdownResolver::resolve`].
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The model call itself failed.
    #[error("model request failed: {0}")]
    Model(#[from] OllamaError),

    /// The response contained no JSON list of changes.
    #[error("model response contains no JSON list: {excerpt}")]
    UnparseableResponse { excerpt: String },

    /// The candidate ranking did not start with a concept number.
    #[error("model did not rank the candidate hypernyms: {excerpt}")]
    RankingRefused { excerpt: String },

    /// The top-ranked number names no candidate.
    #[error("model ranked concept {rank} first, but only {candidates} were listed")]
    RankOutOfRange { rank: usize, candidates: usize },
}

/// The model's answer for one target synset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Records for every relation the model wants changed.
    pub proposal: EditProposal,
    /// Free-text reasoning, if the model supplied one.
    pub reasoning: Option<String>,
}

/// Builder for constructing `HypernymResolver` instances.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hyres::ollama::OllamaClientBuilder;
/// use hyres::resolver::HypernymResolverBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OllamaClientBuilder::new().build()?;
/// let resolver = HypernymResolverBuilder::new()
///     .client(Arc::new(client))
///     .build();
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct HypernymResolverBuilder {
    client: Option<Arc<dyn TextGenerator>>,
}

impl HypernymResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text generator used to query the model.
    pub fn client(mut self, client: Arc<dyn TextGenerator>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the `HypernymResolver`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> HypernymResolver {
        HypernymResolver {
            client: self.client.expect("client must be set via client() method"),
        }
    }
}

/// Turns a context bundle into an edit proposal by asking a model.
pub struct HypernymResolver {
    client: Arc<dyn TextGenerator>,
}

impl HypernymResolver {
    /// Creates a resolver over the given text generator.
    ///
    /// Prefer [`HypernymResolverBuilder`] for construction.
    #[must_use]
    pub fn new(client: Arc<dyn TextGenerator>) -> Self {
        Self { client }
    }

    /// Builds the full task prompt for `bundle`.
    pub fn prompt(&self, bundle: &ContextBundle) -> String {
        PROMPT_TEMPLATE
            .replace("{synset_id}", bundle.target().id.as_str())
            .replace("{wn_data}", &render_context(bundle))
    }

    /// Asks `model` how to resolve the bundle's target.
    ///
    /// Rows for the task synset itself and rows whose old and new types are
    /// equal are dropped. Rows that cannot be understood are skipped with a
    /// warning rather than failing the call; [`crate::edit::EditApplier`]
    /// still validates whatever remains.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::Model` if the model call fails, or
    /// `ResolverError::UnparseableResponse` if no JSON list can be found in
    /// the answer.
    pub fn resolve(&self, model: &str, bundle: &ContextBundle) -> Result<Resolution, ResolverError> {
        let target = bundle.target();
        let prompt = self.prompt(bundle);
        debug!(target = %target.id, model, prompt_len = prompt.len(), "querying model");

        let response = self.client.generate(model, &prompt)?;
        let rows = extract_rows(&response).ok_or_else(|| ResolverError::UnparseableResponse {
            excerpt: response.chars().take(200).collect(),
        })?;

        let resolution = parse_rows(target, rows);
        info!(
            target = %target.id,
            edits = resolution.proposal.len(),
            "model proposed relation edits"
        );
        Ok(resolution)
    }
}

/// Finds the list of rows in a model answer.
///
/// Accepts a bare JSON list, an object wrapping a list (some servers force
/// a top-level object in JSON mode), or a list surrounded by prose or code
/// fences.
fn extract_rows(response: &str) -> Option<Vec<Value>> {
    let trimmed = response.trim();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(rows)) => return Some(rows),
        Ok(Value::Object(object)) => {
            return object.into_iter().find_map(|(_, value)| match value {
                Value::Array(rows) => Some(rows),
                _ => None,
            });
        }
        _ => {}
    }

    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if start > end {
        return None;
    }
    match serde_json::from_str(&trimmed[start..=end]) {
        Ok(Value::Array(rows)) => Some(rows),
        _ => None,
    }
}

fn string_field<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| row.get(*key).and_then(Value::as_str))
}

/// Parses a relation type from the model, resolving a bare family name
/// ("holonym") against the relation the target already has to `other`.
fn parse_slot(raw: &str, target: &Synset, other: &SynsetId) -> Option<EditSlot> {
    if let Ok(slot) = raw.parse() {
        return Some(slot);
    }
    let family = raw.trim().to_lowercase().replace(['_', '-'], " ");
    target
        .kinds_towards(other)
        .into_iter()
        .find(|kind| kind.family() == family)
        .map(EditSlot::Relation)
}

fn parse_rows(target: &Synset, rows: Vec<Value>) -> Resolution {
    let mut records = Vec::new();
    let mut reasoning = None;

    for row in rows {
        let object = match row {
            Value::String(text) => {
                reasoning = Some(text);
                continue;
            }
            Value::Object(object) => object,
            other => {
                warn!(row = %other, "skipping model row that is not an object");
                continue;
            }
        };

        let Some(id) = string_field(&object, &["id", "synset_id"]) else {
            warn!(row = ?object, "skipping model row without synset id");
            continue;
        };
        let other = SynsetId::new(id);
        if other == target.id {
            continue;
        }

        let old_raw = string_field(&object, &["old_type"]).unwrap_or_default();
        let new_raw = string_field(&object, &["new_type"]).unwrap_or_default();
        let (Some(old_type), Some(new_type)) = (
            parse_slot(old_raw, target, &other),
            parse_slot(new_raw, target, &other),
        ) else {
            warn!(%other, old_raw, new_raw, "skipping model row with unknown relation type");
            continue;
        };
        if old_type == new_type {
            continue;
        }

        records.push(EditRecord::new(target.id.clone(), other, old_type, new_type));
    }

    Resolution {
        proposal: EditProposal::new(records),
        reasoning,
    }
}
