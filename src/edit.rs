//! Applying relation edit proposals to a single synset.
//!
//! An [`EditApplier`] is opened from the [`ContextBundle`] that was shown to
//! the deciding model. It owns the working copy of the target synset and
//! remembers which `(target, other)` pairs have already been rewritten, so a
//! pair can change at most once no matter how many proposals arrive.
//!
//! Every call to [`EditApplier::apply`] is one transaction: either every
//! record in the proposal is applied and the result has exactly one
//! hypernym, or nothing changes.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::context::ContextBundle;
use crate::models::{RelationKind, Synset, SynsetId, UnknownRelationType};

/// One side of a relation transition: either a concrete relation or no
/// relation at all.
///
/// Serializes as the relation's text form, or `"absent"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EditSlot {
    Absent,
    Relation(RelationKind),
}

impl EditSlot {
    fn is_hypernym(self) -> bool {
        matches!(self, Self::Relation(kind) if kind.is_hypernym())
    }

    /// Hyponyms and antonyms can never be created or rewritten by an edit.
    fn is_frozen(self) -> bool {
        matches!(self, Self::Relation(kind) if kind.is_antonym() || matches!(kind, RelationKind::Hyponym(_)))
    }
}

impl From<RelationKind> for EditSlot {
    fn from(kind: RelationKind) -> Self {
        Self::Relation(kind)
    }
}

impl fmt::Display for EditSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("absent"),
            Self::Relation(kind) => kind.fmt(f),
        }
    }
}

impl FromStr for EditSlot {
    type Err = UnknownRelationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("absent") {
            return Ok(Self::Absent);
        }
        trimmed.parse().map(Self::Relation)
    }
}

impl TryFrom<String> for EditSlot {
    type Error = UnknownRelationType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EditSlot> for String {
    fn from(slot: EditSlot) -> Self {
        slot.to_string()
    }
}

/// The disposition of one relation between the target and another synset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRecord {
    pub target_id: SynsetId,
    pub other_id: SynsetId,
    pub old_type: EditSlot,
    pub new_type: EditSlot,
}

impl EditRecord {
    pub fn new(
        target_id: impl Into<SynsetId>,
        other_id: impl Into<SynsetId>,
        old_type: impl Into<EditSlot>,
        new_type: impl Into<EditSlot>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            other_id: other_id.into(),
            old_type: old_type.into(),
            new_type: new_type.into(),
        }
    }
}

/// An ordered list of edit records for one target synset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditProposal(Vec<EditRecord>);

impl EditProposal {
    pub fn new(records: Vec<EditRecord>) -> Self {
        Self(records)
    }

    pub fn records(&self) -> &[EditRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<EditRecord> for EditProposal {
    fn from_iter<I: IntoIterator<Item = EditRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for EditProposal {
    type Item = EditRecord;
    type IntoIter = std::vec::IntoIter<EditRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Reasons an edit proposal is rejected.
///
/// Any of these rejects the whole proposal; the applier's state is left as
/// it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The record references a synset that was not part of the context shown
    /// to the model.
    #[error("{other} was not part of the context for {target}")]
    ContextBounds { target: SynsetId, other: SynsetId },

    /// The pair was already rewritten, in this proposal or an earlier one.
    #[error("relation between {target} and {other} has already been edited")]
    DuplicateEdit { target: SynsetId, other: SynsetId },

    /// The proposal would not leave exactly one hypernym.
    #[error("{target} would have {hypernyms} hypernyms after the edit, expected exactly 1")]
    ConstraintViolation { target: SynsetId, hypernyms: usize },

    /// The requested `old -> new` change is not an allowed transition.
    #[error("cannot change relation to {other} from {from} to {to}")]
    InvalidTransition {
        other: SynsetId,
        from: EditSlot,
        to: EditSlot,
    },

    /// The record claims a relation that the target does not currently have.
    #[error("{target} has no {expected} relation to {other}")]
    StaleRelation {
        target: SynsetId,
        other: SynsetId,
        expected: RelationKind,
    },

    /// The record belongs to a different target synset.
    #[error("edit for {found} submitted to the applier for {expected}")]
    WrongTarget { expected: SynsetId, found: SynsetId },
}

/// Checks a transition against the allowed set: a hypernym may turn into any
/// other editable relation or be removed, and any other editable relation
/// (or no relation) may become a hypernym.
fn check_transition(other: &SynsetId, from: EditSlot, to: EditSlot) -> Result<(), EditError> {
    let allowed =
        !from.is_frozen() && !to.is_frozen() && (from.is_hypernym() != to.is_hypernym());
    if allowed {
        Ok(())
    } else {
        Err(EditError::InvalidTransition {
            other: other.clone(),
            from,
            to,
        })
    }
}

/// Stateful rule engine for one target synset.
///
/// The applier owns both the working copy of the entry and the record of
/// which pairs have been edited, so it is the transaction boundary: open
/// exactly one applier per target and route every proposal for that target
/// through it. A second applier opened on the same bundle starts again from
/// the unedited entry with an empty edit record and knows nothing of the
/// first one's edits. To share one applier between threads, wrap it in a
/// `Mutex`.
///
/// # Examples
///
/// ```
/// use hyres::{LexicalGraph, SynsetBuilder, SynsetId};
/// use hyres::context::extract;
/// use hyres::edit::{EditApplier, EditProposal, EditRecord, EditSlot};
/// use hyres::models::RelationKind;
///
/// let graph = LexicalGraph::build(vec![
///     SynsetBuilder::new("x-n").hypernym("a-n").hypernym("b-n").build(),
///     SynsetBuilder::new("a-n").build(),
///     SynsetBuilder::new("b-n").build(),
/// ])?;
/// let bundle = extract(&graph, &SynsetId::new("x-n"))?;
///
/// let mut applier = EditApplier::new(&bundle);
/// let updated = applier
///     .apply(EditProposal::new(vec![EditRecord::new(
///         "x-n",
///         "a-n",
///         RelationKind::HYPERNYM,
///         EditSlot::Absent,
///     )]))
///     .expect("leaves one hypernym");
///
/// assert_eq!(updated.hypernyms.len(), 1);
/// assert_eq!(updated.hypernyms[0].id, SynsetId::new("b-n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct EditApplier {
    current: Synset,
    surfaced: HashSet<SynsetId>,
    changed: HashSet<SynsetId>,
}

impl EditApplier {
    /// Opens an applier for the bundle's target.
    ///
    /// Only synsets surfaced in `bundle` may be referenced by later edits.
    pub fn new(bundle: &ContextBundle) -> Self {
        let target = bundle.target();
        let surfaced = bundle
            .ids()
            .into_iter()
            .filter(|id| **id != target.id)
            .cloned()
            .collect();
        Self {
            current: target.clone(),
            surfaced,
            changed: HashSet::new(),
        }
    }

    /// The target synset as of the last successful transaction.
    pub fn current(&self) -> &Synset {
        &self.current
    }

    /// Returns true if the relation towards `other` has already been edited.
    pub fn is_changed(&self, other: &SynsetId) -> bool {
        self.changed.contains(other)
    }

    /// Applies every record of `proposal` as one transaction.
    ///
    /// Returns the updated synset on success. The graph the bundle was built
    /// from is never touched, and neither is the other endpoint of any
    /// edited relation.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found; see [`EditError`]. On error
    /// neither the synset nor the set of edited pairs changes.
    pub fn apply(&mut self, proposal: EditProposal) -> Result<Synset, EditError> {
        let mut working = self.current.clone();
        let mut touched: HashSet<SynsetId> = HashSet::new();

        for record in proposal {
            self.apply_record(&mut working, &touched, &record)?;
            touched.insert(record.other_id);
        }

        let hypernyms = working.hypernyms.len();
        if hypernyms != 1 {
            return Err(EditError::ConstraintViolation {
                target: working.id,
                hypernyms,
            });
        }

        info!(target = %working.id, edits = touched.len(), "applied edit proposal");
        self.changed.extend(touched);
        self.current = working.clone();
        Ok(working)
    }

    fn apply_record(
        &self,
        working: &mut Synset,
        touched: &HashSet<SynsetId>,
        record: &EditRecord,
    ) -> Result<(), EditError> {
        if record.target_id != working.id {
            return Err(EditError::WrongTarget {
                expected: working.id.clone(),
                found: record.target_id.clone(),
            });
        }
        let other = &record.other_id;
        if !self.surfaced.contains(other) {
            return Err(EditError::ContextBounds {
                target: working.id.clone(),
                other: other.clone(),
            });
        }
        if self.changed.contains(other) || touched.contains(other) {
            return Err(EditError::DuplicateEdit {
                target: working.id.clone(),
                other: other.clone(),
            });
        }
        check_transition(other, record.old_type, record.new_type)?;

        if let EditSlot::Relation(expected) = record.old_type {
            // Hypernym subtypes are interchangeable here: the model does not
            // distinguish regular from instance hypernyms.
            let removed = working.remove_relations(other, |kind| {
                kind == expected || (expected.is_hypernym() && kind.is_hypernym())
            });
            if removed == 0 {
                return Err(EditError::StaleRelation {
                    target: working.id.clone(),
                    other: other.clone(),
                    expected,
                });
            }
        }
        if let EditSlot::Relation(kind) = record.new_type {
            working.add_relation(kind, other.clone());
        }

        debug!(
            target = %working.id,
            other = %other,
            from = %record.old_type,
            to = %record.new_type,
            "staged relation edit"
        );
        Ok(())
    }
}
