//! Resolution through a series of narrow questions instead of one task prompt.
//!
//! [`BreakdownResolver`] works in five steps, each a plain-text model call:
//!
//! 1. every gloss is extended with a "common meaning" of the synset's words;
//! 2. for each current hypernym, the model ranks the relations it could be
//!    turned into and the top one is kept;
//! 3. for each other candidate (the hypernyms' own hypernyms and the one-hop
//!    neighbours) the model answers whether it is likely a hypernym;
//! 4. all candidate hypernyms are ranked by number;
//! 5. the winner becomes the only hypernym, the other hypernyms become their
//!    top alternative, and everything else is kept.
//!
//! The result is an ordinary [`Resolution`]; nothing is applied here.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Resolution, ResolverError};
use crate::context::ContextBundle;
use crate::edit::{EditProposal, EditRecord, EditSlot};
use crate::models::{DomainType, PartType, RelationKind, SynsetId, Word};
use crate::ollama::TextGenerator;

/// `{words}` is a comma-separated word list.
const COMMON_MEANING_TEMPLATE: &str = "Give one common meaning that fits every word in this list:
({words})
Reply with the meaning only.";

/// `{gloss_a}` is the task concept, `{gloss_b}` its current hypernym.
const ALTERNATIVE_RELATION_TEMPLATE: &str = r#"Rank these possible semantic relations from the concept ({gloss_a}) to the concept ({gloss_b}), most likely first: "holonym", "meronym", "domain", "domain member", "attribute", "no relation".
A relation R from concept A to concept B means "B is a R of A".
Reply with a comma-separated list only, with no bullets, numbers or reasoning, and include every option."#;

/// `{gloss_a}` is the task concept, `{gloss_b}` the candidate.
const IS_HYPERNYM_TEMPLATE: &str = "Is the concept ({gloss_b}) likely to be a hypernym of the concept ({gloss_a})?
Reply with yes or no and nothing else.";

/// `{main_gloss}` is the task concept, `{candidates}` the numbered list.
const RANK_CANDIDATES_TEMPLATE: &str = r#"Rank the numbered concepts below from most likely to least likely to be a hypernym of the concept ({main_gloss}):
{candidates}
A hypernym B of a concept A makes the statements "A is a B" and "A is a type of B" true.
Reply with a comma-separated list of the concept numbers only. Include every number and add no other text."#;

/// A synset the target is, or could become, related to.
struct Concept<'a> {
    id: &'a SynsetId,
    words: &'a [Word],
    gloss: String,
    /// What the target has towards this synset now.
    current: EditSlot,
}

/// Builder for constructing `BreakdownResolver` instances.
#[derive(Default)]
pub struct BreakdownResolverBuilder {
    client: Option<Arc<dyn TextGenerator>>,
}

impl BreakdownResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text generator used to query the model.
    pub fn client(mut self, client: Arc<dyn TextGenerator>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the `BreakdownResolver`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> BreakdownResolver {
        BreakdownResolver {
            client: self.client.expect("client must be set via client() method"),
        }
    }
}

/// Turns a context bundle into an edit proposal one small question at a time.
///
/// Expects plain-text answers, so the client should not force JSON output.
pub struct BreakdownResolver {
    client: Arc<dyn TextGenerator>,
}

impl BreakdownResolver {
    /// Creates a resolver over the given text generator.
    ///
    /// Prefer [`BreakdownResolverBuilder`] for construction.
    #[must_use]
    pub fn new(client: Arc<dyn TextGenerator>) -> Self {
        Self { client }
    }

    /// Asks `model` how to resolve the bundle's target.
    ///
    /// With a single candidate hypernym the ranking call is skipped; with
    /// none, the proposal is empty and [`crate::edit::EditApplier`] decides
    /// whether the entry is acceptable as it is.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::Model` if any model call fails,
    /// `ResolverError::RankingRefused` if the ranking answer does not start
    /// with a number, and `ResolverError::RankOutOfRange` if that number
    /// names no candidate.
    pub fn resolve(&self, model: &str, bundle: &ContextBundle) -> Result<Resolution, ResolverError> {
        let target = bundle.target();
        let main_gloss = self.expand_gloss(model, &target.words, &target.gloss)?;

        let mut hypernyms = Vec::new();
        for relation in &target.hypernyms {
            let Some(ancestor) = bundle.ancestors().iter().find(|a| a.id == relation.id) else {
                warn!(target = %target.id, hypernym = %relation.id, "hypernym missing from context");
                continue;
            };
            hypernyms.push(Concept {
                id: &ancestor.id,
                words: &ancestor.words,
                gloss: self.expand_gloss(model, &ancestor.words, &ancestor.gloss)?,
                current: RelationKind::Hypernym(relation.subtype).into(),
            });
        }

        let mut others = Vec::new();
        for ancestor in bundle.ancestors() {
            let is_grandparent = hypernyms
                .iter()
                .filter_map(|h| bundle.ancestors().iter().find(|a| a.id == *h.id))
                .any(|h| h.hypernyms.iter().any(|r| r.id == ancestor.id));
            if is_grandparent && !hypernyms.iter().any(|h| *h.id == ancestor.id) {
                others.push(Concept {
                    id: &ancestor.id,
                    words: &ancestor.words,
                    gloss: self.expand_gloss(model, &ancestor.words, &ancestor.gloss)?,
                    current: EditSlot::Absent,
                });
            }
        }
        for related in bundle.related() {
            others.push(Concept {
                id: &related.id,
                words: &related.words,
                gloss: self.expand_gloss(model, &related.words, &related.gloss)?,
                current: related.relation_type.into(),
            });
        }

        let mut alternatives = Vec::with_capacity(hypernyms.len());
        for hypernym in &hypernyms {
            let prompt = ALTERNATIVE_RELATION_TEMPLATE
                .replace("{gloss_a}", &main_gloss)
                .replace("{gloss_b}", &hypernym.gloss);
            let reply = self.client.generate(model, &prompt)?;
            let alternative = top_alternative(&reply).unwrap_or_else(|| {
                warn!(hypernym = %hypernym.id, reply = %reply, "no known relation in ranking, removing instead");
                EditSlot::Absent
            });
            alternatives.push(alternative);
        }

        let mut candidates: Vec<&Concept> = hypernyms.iter().collect();
        for other in &others {
            let prompt = IS_HYPERNYM_TEMPLATE
                .replace("{gloss_a}", &main_gloss)
                .replace("{gloss_b}", &other.gloss);
            if is_yes(&self.client.generate(model, &prompt)?) {
                candidates.push(other);
            }
        }
        debug!(target = %target.id, candidates = candidates.len(), "collected candidate hypernyms");

        let winner = match candidates.len() {
            0 => {
                return Ok(Resolution {
                    proposal: EditProposal::default(),
                    reasoning: Some("no candidate hypernyms".to_string()),
                });
            }
            1 => candidates[0].id,
            _ => candidates[self.rank(model, &main_gloss, &candidates)?].id,
        };

        let mut records = Vec::new();
        for (hypernym, alternative) in hypernyms.iter().zip(alternatives) {
            if hypernym.id != winner {
                records.push(EditRecord::new(
                    target.id.clone(),
                    hypernym.id.clone(),
                    hypernym.current,
                    alternative,
                ));
            }
        }
        if let Some(other) = others.iter().find(|o| o.id == winner) {
            records.push(EditRecord::new(
                target.id.clone(),
                other.id.clone(),
                other.current,
                RelationKind::HYPERNYM,
            ));
        }

        info!(target = %target.id, %winner, edits = records.len(), "breakdown resolution finished");
        Ok(Resolution {
            proposal: EditProposal::new(records),
            reasoning: Some(format!(
                "{winner} ranked first of {} candidate hypernyms",
                candidates.len()
            )),
        })
    }

    fn expand_gloss(&self, model: &str, words: &[Word], gloss: &str) -> Result<String, ResolverError> {
        let words = words
            .iter()
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let reply = self
            .client
            .generate(model, &COMMON_MEANING_TEMPLATE.replace("{words}", &words))?;
        let meaning = reply.trim();
        if meaning.is_empty() {
            return Ok(gloss.to_string());
        }
        Ok(format!("{gloss} / {meaning}"))
    }

    /// Returns the index of the top-ranked candidate.
    fn rank(&self, model: &str, main_gloss: &str, candidates: &[&Concept]) -> Result<usize, ResolverError> {
        let numbered = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. ({})", i + 1, c.gloss))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = RANK_CANDIDATES_TEMPLATE
            .replace("{main_gloss}", main_gloss)
            .replace("{candidates}", &numbered);
        let reply = self.client.generate(model, &prompt)?;

        let first = reply
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_end_matches('.');
        let rank: usize = first.parse().map_err(|_| ResolverError::RankingRefused {
            excerpt: reply.chars().take(200).collect(),
        })?;
        if rank == 0 || rank > candidates.len() {
            return Err(ResolverError::RankOutOfRange {
                rank,
                candidates: candidates.len(),
            });
        }
        Ok(rank - 1)
    }
}

/// Picks the first relation in a ranking reply that can replace a hypernym.
///
/// Family names get a default subtype (part, topic) since the question does
/// not ask for one. "no relation" removes the hypernym.
fn top_alternative(reply: &str) -> Option<EditSlot> {
    reply.split(',').find_map(|item| {
        let name = item
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
            .to_lowercase()
            .replace(['_', '-'], " ");
        let kind = match name.as_str() {
            "no relation" | "none" => return Some(EditSlot::Absent),
            "holonym" => RelationKind::Holonym(PartType::Part),
            "meronym" => RelationKind::Meronym(PartType::Part),
            "domain" => RelationKind::Domain(DomainType::Topic),
            "domain member" => RelationKind::DomainMember(DomainType::Topic),
            other => other.parse::<RelationKind>().ok().filter(|kind| {
                !kind.is_hypernym() && !kind.is_antonym() && !matches!(kind, RelationKind::Hyponym(_))
            })?,
        };
        Some(EditSlot::Relation(kind))
    })
}

fn is_yes(reply: &str) -> bool {
    reply.trim().to_lowercase().starts_with("yes")
}
