use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::SynsetId;

/// Error returned when a relation type string does not name a known relation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized relation type: '{0}'")]
pub struct UnknownRelationType(pub String);

/// Subtype of a hypernym or hyponym relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HypernymType {
    Regular,
    Instance,
}

/// Subtype of a holonym or meronym relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartType {
    Part,
    Substance,
    Member,
}

/// Subtype of a domain or domain member relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainType {
    Topic,
    Region,
    Usage,
}

/// Relations that live in the `other_relations` list of a synset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtherType {
    Antonym,
    Attribute,
}

impl fmt::Display for HypernymType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Instance => write!(f, "instance"),
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Part => write!(f, "part"),
            Self::Substance => write!(f, "substance"),
            Self::Member => write!(f, "member"),
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic => write!(f, "topic"),
            Self::Region => write!(f, "region"),
            Self::Usage => write!(f, "usage"),
        }
    }
}

impl fmt::Display for OtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Antonym => write!(f, "antonym"),
            Self::Attribute => write!(f, "attribute"),
        }
    }
}

/// A typed outgoing relation from one synset to another.
///
/// Serializes as `{"id": "...", "type": "..."}`, the subtype being the
/// lowercase name of the variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation<T> {
    /// Target synset of the relation.
    pub id: SynsetId,
    /// Subtype within the relation kind.
    #[serde(rename = "type")]
    pub subtype: T,
}

impl<T> Relation<T> {
    /// Creates a relation pointing at `id`.
    pub fn new(id: SynsetId, subtype: T) -> Self {
        Self { id, subtype }
    }
}

/// A relation kind together with its subtype.
///
/// This is the closed vocabulary shared by the pointer symbol table, the
/// context bundle tags and edit proposals. Its text form is
/// `"[<subtype> ]<kind>"`, e.g. `"hypernym"`, `"instance hypernym"`,
/// `"part holonym"`, `"topic domain member"` or `"attribute"`.
///
/// # Examples
///
/// ```
/// use hyres::models::{PartType, RelationKind};
///
/// let kind: RelationKind = "substance_meronym".parse().unwrap();
/// assert_eq!(kind, RelationKind::Meronym(PartType::Substance));
/// assert_eq!(kind.to_string(), "substance meronym");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelationKind {
    Hypernym(HypernymType),
    Hyponym(HypernymType),
    Holonym(PartType),
    Meronym(PartType),
    Domain(DomainType),
    DomainMember(DomainType),
    Other(OtherType),
}

impl RelationKind {
    /// Regular (non-instance) hypernym.
    pub const HYPERNYM: Self = Self::Hypernym(HypernymType::Regular);
    /// Antonym relation.
    pub const ANTONYM: Self = Self::Other(OtherType::Antonym);
    /// Attribute relation.
    pub const ATTRIBUTE: Self = Self::Other(OtherType::Attribute);

    /// Returns true for both regular and instance hypernyms.
    pub fn is_hypernym(self) -> bool {
        matches!(self, Self::Hypernym(_))
    }

    /// Returns true for antonym relations.
    pub fn is_antonym(self) -> bool {
        self == Self::ANTONYM
    }

    /// Returns the kind name without its subtype, e.g. `"holonym"`.
    pub fn family(self) -> &'static str {
        match self {
            Self::Hypernym(_) => "hypernym",
            Self::Hyponym(_) => "hyponym",
            Self::Holonym(_) => "holonym",
            Self::Meronym(_) => "meronym",
            Self::Domain(_) => "domain",
            Self::DomainMember(_) => "domain member",
            Self::Other(OtherType::Antonym) => "antonym",
            Self::Other(OtherType::Attribute) => "attribute",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hypernym(HypernymType::Regular) | Self::Hyponym(HypernymType::Regular) => {
                f.write_str(self.family())
            }
            Self::Hypernym(t) | Self::Hyponym(t) => write!(f, "{t} {}", self.family()),
            Self::Holonym(t) | Self::Meronym(t) => write!(f, "{t} {}", self.family()),
            Self::Domain(t) | Self::DomainMember(t) => write!(f, "{t} {}", self.family()),
            Self::Other(_) => f.write_str(self.family()),
        }
    }
}

impl FromStr for RelationKind {
    type Err = UnknownRelationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace(['_', '-'], " ");
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let unknown = || UnknownRelationType(s.to_string());

        let hypernym_type = |word: &str| match word {
            "regular" => Some(HypernymType::Regular),
            "instance" => Some(HypernymType::Instance),
            _ => None,
        };
        let part_type = |word: &str| match word {
            "part" => Some(PartType::Part),
            "substance" => Some(PartType::Substance),
            "member" => Some(PartType::Member),
            _ => None,
        };
        let domain_type = |word: &str| match word {
            "topic" => Some(DomainType::Topic),
            "region" => Some(DomainType::Region),
            "usage" => Some(DomainType::Usage),
            _ => None,
        };

        let kind = match words.as_slice() {
            ["hypernym"] => Self::HYPERNYM,
            ["hyponym"] => Self::Hyponym(HypernymType::Regular),
            [sub, "hypernym"] => Self::Hypernym(hypernym_type(*sub).ok_or_else(unknown)?),
            [sub, "hyponym"] => Self::Hyponym(hypernym_type(*sub).ok_or_else(unknown)?),
            [sub, "holonym"] => Self::Holonym(part_type(*sub).ok_or_else(unknown)?),
            [sub, "meronym"] => Self::Meronym(part_type(*sub).ok_or_else(unknown)?),
            [sub, "domain"] => Self::Domain(domain_type(*sub).ok_or_else(unknown)?),
            [sub, "domain", "member"] => Self::DomainMember(domain_type(*sub).ok_or_else(unknown)?),
            ["antonym"] => Self::ANTONYM,
            ["attribute"] => Self::ATTRIBUTE,
            _ => return Err(unknown()),
        };
        Ok(kind)
    }
}

impl TryFrom<String> for RelationKind {
    type Error = UnknownRelationType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelationKind> for String {
    fn from(kind: RelationKind) -> Self {
        kind.to_string()
    }
}
