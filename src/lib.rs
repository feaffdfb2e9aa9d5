pub mod closure;
pub mod config;
pub mod context;
pub mod decoder;
pub mod edit;
pub mod graph;
pub mod models;
pub mod ollama;
pub mod prompt;
pub mod resolver;
pub mod symbols;
pub mod utils;

pub use config::ResolverConfig;
pub use context::{ContextBundle, extract};
pub use decoder::{ParseError, ParseErrorReason, decode_all, decode_line};
pub use edit::{EditApplier, EditError, EditProposal, EditRecord, EditSlot};
pub use graph::{GraphError, IntegrityWarning, LexicalGraph};
pub use models::{RelationKind, Synset, SynsetBuilder, SynsetId};
