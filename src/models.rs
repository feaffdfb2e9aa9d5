mod ids;
mod relation;
mod synset;

pub use ids::SynsetId;
pub use relation::{
    DomainType, HypernymType, OtherType, PartType, Relation, RelationKind, UnknownRelationType,
};
pub use synset::{PartOfSpeech, Synset, SynsetBuilder, Word};
