//! Integration tests for the model-driven resolution loop, using a canned
//! text generator in place of a running Ollama server.

use std::sync::{Arc, Mutex};

use hyres::models::PartType;
use hyres::ollama::{OllamaError, TextGenerator};
use hyres::resolver::{BreakdownResolverBuilder, HypernymResolverBuilder, ResolverError};
use hyres::{EditApplier, EditError, LexicalGraph, RelationKind, SynsetId, decode_all, extract};

const DATA: &str = include_str!("fixtures/data.noun");

struct CannedGenerator {
    response: String,
    calls: Mutex<Vec<(String, String)>>,
}

impl CannedGenerator {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

impl TextGenerator for CannedGenerator {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        Ok(self.response.clone())
    }
}

fn graph() -> LexicalGraph {
    LexicalGraph::build(decode_all(DATA).unwrap()).unwrap()
}

fn mouse() -> SynsetId {
    SynsetId::new("00000005-n")
}

#[test]
fn model_answer_is_applied_to_target() {
    // Arrange
    let generator = CannedGenerator::new(
        r#"```json
[
  {"old_type": "", "new_type": "", "id": "00000005-n", "words": ["mouse", "computer mouse"], "gloss": "..."},
  {"old_type": "hypernym", "new_type": "hypernym", "id": "00000004-n", "words": ["device"], "gloss": "..."},
  {"old_type": "hypernym", "new_type": "", "id": "00000006-n", "words": ["rodent"], "gloss": "..."},
  {"old_type": "part holonym", "new_type": "part holonym", "id": "00000007-n", "words": ["computer"], "gloss": "..."},
  "A computer mouse is a device, not a rodent."
]
```"#,
    );
    let resolver = HypernymResolverBuilder::new()
        .client(generator.clone())
        .build();
    let graph = graph();
    let bundle = extract(&graph, &mouse()).unwrap();

    // Act
    let resolution = resolver.resolve("llama3.2", &bundle).expect("answer parses");
    let updated = EditApplier::new(&bundle)
        .apply(resolution.proposal)
        .expect("proposal is valid");

    // Assert
    assert_eq!(
        resolution.reasoning.as_deref(),
        Some("A computer mouse is a device, not a rodent.")
    );
    assert_eq!(updated.hypernyms.len(), 1);
    assert_eq!(updated.hypernyms[0].id, SynsetId::new("00000004-n"));
    assert_eq!(
        updated.kinds_towards(&SynsetId::new("00000007-n")),
        vec![RelationKind::Holonym(PartType::Part)]
    );

    let calls = generator.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "llama3.2");
    assert!(calls[0].1.contains("Task synset ID:\n00000005-n"));
    assert!(calls[0].1.contains("## Data for 00000008-n"));
}

#[test]
fn out_of_context_suggestion_is_rejected_by_applier() {
    let generator = CannedGenerator::new(
        r#"[
  {"id": "00000006-n", "old_type": "hypernym", "new_type": "absent"},
  {"id": "00000099-n", "old_type": "", "new_type": "hypernym"}
]"#,
    );
    let resolver = HypernymResolverBuilder::new().client(generator).build();
    let graph = graph();
    let bundle = extract(&graph, &mouse()).unwrap();

    let resolution = resolver.resolve("llama3.2", &bundle).unwrap();
    let mut applier = EditApplier::new(&bundle);
    let err = applier.apply(resolution.proposal).unwrap_err();

    assert!(matches!(err, EditError::ContextBounds { ref other, .. } if other.as_str() == "00000099-n"));
    assert_eq!(applier.current().hypernyms.len(), 2, "nothing was applied");
}

#[test]
fn keeping_both_hypernyms_violates_constraint() {
    let generator = CannedGenerator::new(
        r#"[
  {"id": "00000004-n", "old_type": "hypernym", "new_type": "hypernym"},
  {"id": "00000006-n", "old_type": "hypernym", "new_type": "hypernym"},
  "Both are fine."
]"#,
    );
    let resolver = HypernymResolverBuilder::new().client(generator).build();
    let graph = graph();
    let bundle = extract(&graph, &mouse()).unwrap();

    let resolution = resolver.resolve("llama3.2", &bundle).unwrap();
    assert!(resolution.proposal.is_empty());

    let err = EditApplier::new(&bundle).apply(resolution.proposal).unwrap_err();
    assert!(matches!(err, EditError::ConstraintViolation { hypernyms: 2, .. }));
}

#[test]
fn refusal_is_reported_as_unparseable() {
    let generator = CannedGenerator::new("I cannot help with WordNet today.");
    let resolver = HypernymResolverBuilder::new().client(generator).build();
    let graph = graph();
    let bundle = extract(&graph, &mouse()).unwrap();

    let err = resolver.resolve("llama3.2", &bundle).unwrap_err();
    assert!(matches!(err, ResolverError::UnparseableResponse { .. }));
}

/// Plain-text answers for the step-by-step strategy: every gloss gets a
/// meaning, every hypernym's best alternative is `alternative`, nothing else
/// is a hypernym, and the first listed candidate wins.
struct StepGenerator {
    alternative: &'static str,
}

impl TextGenerator for StepGenerator {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, OllamaError> {
        let reply = if prompt.starts_with("Give one common meaning") {
            "a thing"
        } else if prompt.starts_with("Rank these possible semantic relations") {
            self.alternative
        } else if prompt.starts_with("Is the concept") {
            "no"
        } else {
            "1, 2"
        };
        Ok(reply.to_string())
    }
}

#[test]
fn breakdown_answer_is_applied_to_target() {
    // Arrange
    let resolver = BreakdownResolverBuilder::new()
        .client(Arc::new(StepGenerator { alternative: "no relation, holonym" }))
        .build();
    let graph = graph();
    let bundle = extract(&graph, &mouse()).unwrap();

    // Act
    let resolution = resolver.resolve("llama3.2", &bundle).expect("ranking parses");
    let updated = EditApplier::new(&bundle)
        .apply(resolution.proposal)
        .expect("proposal is valid");

    // Assert
    assert_eq!(updated.hypernyms.len(), 1);
    assert_eq!(updated.hypernyms[0].id, SynsetId::new("00000004-n"));
    assert!(updated.kinds_towards(&SynsetId::new("00000006-n")).is_empty());
    assert_eq!(updated.holonyms.len(), 1, "neighbours are kept");
}

#[test]
fn breakdown_alternative_keeps_former_hypernym_related() {
    let resolver = BreakdownResolverBuilder::new()
        .client(Arc::new(StepGenerator { alternative: "meronym" }))
        .build();
    let graph = graph();
    let bundle = extract(&graph, &mouse()).unwrap();

    let resolution = resolver.resolve("llama3.2", &bundle).unwrap();
    let updated = EditApplier::new(&bundle).apply(resolution.proposal).unwrap();

    assert_eq!(
        updated.kinds_towards(&SynsetId::new("00000006-n")),
        vec![RelationKind::Meronym(PartType::Part)]
    );
}
