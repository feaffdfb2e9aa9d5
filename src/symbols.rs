//! Pointer symbol table for the raw lexical database format.
//!
//! Maps the short pointer codes found in noun data lines (`@`, `@i`, `#p`,
//! `;c`, ...) to a [`RelationKind`]. The table is closed: codes that carry
//! lexical or non-noun relations (derivation `+`, also-see `^`, similar-to
//! `&`, ...) are reported as [`SymbolLookup::Unrecognized`] and the decoder
//! drops them.

use crate::models::{DomainType, HypernymType, OtherType, PartType, RelationKind};

/// Result of looking up a pointer symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolLookup {
    /// The symbol names a synset relation kept in the noun model.
    Relation(RelationKind),
    /// The symbol is outside the noun relation vocabulary.
    Unrecognized,
}

const TABLE: &[(&str, RelationKind)] = &[
    ("@", RelationKind::Hypernym(HypernymType::Regular)),
    ("@i", RelationKind::Hypernym(HypernymType::Instance)),
    ("~", RelationKind::Hyponym(HypernymType::Regular)),
    ("~i", RelationKind::Hyponym(HypernymType::Instance)),
    ("#m", RelationKind::Holonym(PartType::Member)),
    ("#s", RelationKind::Holonym(PartType::Substance)),
    ("#p", RelationKind::Holonym(PartType::Part)),
    ("%m", RelationKind::Meronym(PartType::Member)),
    ("%s", RelationKind::Meronym(PartType::Substance)),
    ("%p", RelationKind::Meronym(PartType::Part)),
    (";c", RelationKind::Domain(DomainType::Topic)),
    (";r", RelationKind::Domain(DomainType::Region)),
    (";u", RelationKind::Domain(DomainType::Usage)),
    ("-c", RelationKind::DomainMember(DomainType::Topic)),
    ("-r", RelationKind::DomainMember(DomainType::Region)),
    ("-u", RelationKind::DomainMember(DomainType::Usage)),
    ("!", RelationKind::Other(OtherType::Antonym)),
    ("=", RelationKind::Other(OtherType::Attribute)),
];

/// Looks up a pointer symbol.
///
/// # Examples
///
/// ```
/// use hyres::symbols::{lookup, SymbolLookup};
/// use hyres::models::{PartType, RelationKind};
///
/// assert_eq!(lookup("#p"), SymbolLookup::Relation(RelationKind::Holonym(PartType::Part)));
/// assert_eq!(lookup("+"), SymbolLookup::Unrecognized);
/// ```
pub fn lookup(symbol: &str) -> SymbolLookup {
    TABLE
        .iter()
        .find(|(code, _)| *code == symbol)
        .map_or(SymbolLookup::Unrecognized, |(_, kind)| {
            SymbolLookup::Relation(*kind)
        })
}

/// Returns the pointer symbol that encodes `kind`.
pub fn symbol_for(kind: RelationKind) -> &'static str {
    use RelationKind::*;

    match kind {
        Hypernym(HypernymType::Regular) => "@",
        Hypernym(HypernymType::Instance) => "@i",
        Hyponym(HypernymType::Regular) => "~",
        Hyponym(HypernymType::Instance) => "~i",
        Holonym(PartType::Member) => "#m",
        Holonym(PartType::Substance) => "#s",
        Holonym(PartType::Part) => "#p",
        Meronym(PartType::Member) => "%m",
        Meronym(PartType::Substance) => "%s",
        Meronym(PartType::Part) => "%p",
        Domain(DomainType::Topic) => ";c",
        Domain(DomainType::Region) => ";r",
        Domain(DomainType::Usage) => ";u",
        DomainMember(DomainType::Topic) => "-c",
        DomainMember(DomainType::Region) => "-r",
        DomainMember(DomainType::Usage) => "-u",
        Other(OtherType::Antonym) => "!",
        Other(OtherType::Attribute) => "=",
    }
}
