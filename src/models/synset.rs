use serde::{Deserialize, Serialize};

use super::{
    DomainType, HypernymType, OtherType, PartType, Relation, RelationKind, SynsetId,
};

/// Part of speech of a synset.
///
/// Only nouns are represented; the raw data format carries other parts of
/// speech which the decoder rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartOfSpeech {
    #[default]
    #[serde(rename = "n")]
    Noun,
}

/// One surface form of a synset together with its lexical id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Surface form with underscores already replaced by spaces.
    pub word: String,
    /// Lexical id distinguishing senses of the same lemma in one lexicographer file.
    pub lex_id: u32,
}

impl Word {
    /// Creates a new word.
    pub fn new(word: impl Into<String>, lex_id: u32) -> Self {
        Self {
            word: word.into(),
            lex_id,
        }
    }
}

/// A synset: one lexical meaning with its words, gloss and typed relations.
///
/// Every relation list is always present, possibly empty. The serialized form
/// is the Entry schema consumed by downstream tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synset {
    pub id: SynsetId,
    pub pos: PartOfSpeech,
    /// Words in file order; the first one is the canonical lemma.
    pub words: Vec<Word>,
    pub hypernyms: Vec<Relation<HypernymType>>,
    pub hyponyms: Vec<Relation<HypernymType>>,
    pub holonyms: Vec<Relation<PartType>>,
    pub meronyms: Vec<Relation<PartType>>,
    pub domains: Vec<Relation<DomainType>>,
    pub domain_members: Vec<Relation<DomainType>>,
    pub other_relations: Vec<Relation<OtherType>>,
    pub gloss: String,
}

impl Synset {
    /// Returns the canonical lemma, if the synset has any words.
    pub fn lemma(&self) -> Option<&str> {
        self.words.first().map(|w| w.word.as_str())
    }

    /// Returns every outgoing relation as `(kind, target)` pairs.
    ///
    /// Order is the serialized list order: hypernyms, hyponyms, holonyms,
    /// meronyms, domains, domain members, other relations.
    pub fn relations(&self) -> Vec<(RelationKind, &SynsetId)> {
        let mut out = Vec::with_capacity(self.relation_count());
        collect(&mut out, &self.hypernyms, RelationKind::Hypernym);
        collect(&mut out, &self.hyponyms, RelationKind::Hyponym);
        collect(&mut out, &self.holonyms, RelationKind::Holonym);
        collect(&mut out, &self.meronyms, RelationKind::Meronym);
        collect(&mut out, &self.domains, RelationKind::Domain);
        collect(&mut out, &self.domain_members, RelationKind::DomainMember);
        collect(&mut out, &self.other_relations, RelationKind::Other);
        out
    }

    /// Returns the total number of outgoing relations across all lists.
    pub fn relation_count(&self) -> usize {
        self.hypernyms.len()
            + self.hyponyms.len()
            + self.holonyms.len()
            + self.meronyms.len()
            + self.domains.len()
            + self.domain_members.len()
            + self.other_relations.len()
    }

    /// Returns the kinds of all relations pointing at `target`.
    pub fn kinds_towards(&self, target: &SynsetId) -> Vec<RelationKind> {
        self.relations()
            .into_iter()
            .filter(|(_, id)| *id == target)
            .map(|(kind, _)| kind)
            .collect()
    }

    /// Appends a relation to the list matching `kind`, keeping duplicates.
    pub fn push_relation(&mut self, kind: RelationKind, target: SynsetId) {
        match kind {
            RelationKind::Hypernym(t) => self.hypernyms.push(Relation::new(target, t)),
            RelationKind::Hyponym(t) => self.hyponyms.push(Relation::new(target, t)),
            RelationKind::Holonym(t) => self.holonyms.push(Relation::new(target, t)),
            RelationKind::Meronym(t) => self.meronyms.push(Relation::new(target, t)),
            RelationKind::Domain(t) => self.domains.push(Relation::new(target, t)),
            RelationKind::DomainMember(t) => self.domain_members.push(Relation::new(target, t)),
            RelationKind::Other(t) => self.other_relations.push(Relation::new(target, t)),
        }
    }

    /// Appends a relation unless an identical one is already present.
    ///
    /// Returns `false` if the synset was left unchanged.
    pub fn add_relation(&mut self, kind: RelationKind, target: SynsetId) -> bool {
        if self.kinds_towards(&target).contains(&kind) {
            return false;
        }
        self.push_relation(kind, target);
        true
    }

    /// Removes every relation to `target` whose kind satisfies `pred`.
    ///
    /// Returns the number of relations removed.
    pub fn remove_relations<F>(&mut self, target: &SynsetId, pred: F) -> usize
    where
        F: Fn(RelationKind) -> bool,
    {
        remove_matching(&mut self.hypernyms, target, RelationKind::Hypernym, &pred)
            + remove_matching(&mut self.hyponyms, target, RelationKind::Hyponym, &pred)
            + remove_matching(&mut self.holonyms, target, RelationKind::Holonym, &pred)
            + remove_matching(&mut self.meronyms, target, RelationKind::Meronym, &pred)
            + remove_matching(&mut self.domains, target, RelationKind::Domain, &pred)
            + remove_matching(&mut self.domain_members, target, RelationKind::DomainMember, &pred)
            + remove_matching(&mut self.other_relations, target, RelationKind::Other, &pred)
    }
}

fn collect<'a, T: Copy>(
    out: &mut Vec<(RelationKind, &'a SynsetId)>,
    list: &'a [Relation<T>],
    kind: fn(T) -> RelationKind,
) {
    out.extend(list.iter().map(|r| (kind(r.subtype), &r.id)));
}

fn remove_matching<T: Copy, F>(
    list: &mut Vec<Relation<T>>,
    target: &SynsetId,
    kind: fn(T) -> RelationKind,
    pred: &F,
) -> usize
where
    F: Fn(RelationKind) -> bool,
{
    let before = list.len();
    list.retain(|r| !(r.id == *target && pred(kind(r.subtype))));
    before - list.len()
}

/// Builder for constructing `Synset` instances.
///
/// # Examples
///
/// ```
/// use hyres::SynsetBuilder;
/// use hyres::models::RelationKind;
///
/// let synset = SynsetBuilder::new("00001740-n")
///     .word("entity", 0)
///     .gloss("that which is perceived to have its own distinct existence")
///     .relation(RelationKind::Hyponym(hyres::models::HypernymType::Regular), "00001930-n")
///     .build();
///
/// assert_eq!(synset.lemma(), Some("entity"));
/// assert_eq!(synset.hyponyms.len(), 1);
/// assert!(synset.hypernyms.is_empty());
/// ```
#[derive(Debug)]
pub struct SynsetBuilder {
    synset: Synset,
}

impl SynsetBuilder {
    /// Creates a builder for a synset with the given id and no words or relations.
    pub fn new(id: impl Into<SynsetId>) -> Self {
        Self {
            synset: Synset {
                id: id.into(),
                pos: PartOfSpeech::Noun,
                words: Vec::new(),
                hypernyms: Vec::new(),
                hyponyms: Vec::new(),
                holonyms: Vec::new(),
                meronyms: Vec::new(),
                domains: Vec::new(),
                domain_members: Vec::new(),
                other_relations: Vec::new(),
                gloss: String::new(),
            },
        }
    }

    /// Appends a word.
    pub fn word(mut self, word: impl Into<String>, lex_id: u32) -> Self {
        self.synset.words.push(Word::new(word, lex_id));
        self
    }

    /// Sets the gloss.
    pub fn gloss(mut self, gloss: impl Into<String>) -> Self {
        self.synset.gloss = gloss.into();
        self
    }

    /// Adds a regular hypernym.
    pub fn hypernym(self, target: impl Into<SynsetId>) -> Self {
        self.relation(RelationKind::HYPERNYM, target)
    }

    /// Adds a relation of any kind.
    pub fn relation(mut self, kind: RelationKind, target: impl Into<SynsetId>) -> Self {
        self.synset.add_relation(kind, target.into());
        self
    }

    pub fn build(self) -> Synset {
        self.synset
    }
}
