//! Plain-text rendering of a [`ContextBundle`] for the deciding model.
//!
//! Each bundle element becomes a `## Data for <id>` block listing its words,
//! its gloss and one sentence per relation. Hyponyms are left out: they are
//! never editable and tend to dominate the block for general synsets.

use crate::context::ContextBundle;
use crate::models::{RelationKind, SynsetId, Word};

fn article(noun: &str) -> &'static str {
    match noun.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn relation_sentence(source: &SynsetId, kind: RelationKind, target: &SynsetId) -> String {
    let name = kind.to_string();
    format!("{source} has {} {name} relation to {target}.", article(&name))
}

fn render_block(id: &SynsetId, words: &[Word], gloss: &str, lines: Vec<String>) -> String {
    let words = words
        .iter()
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let mut block = vec![
        format!("## Data for {id}"),
        format!("Words for {id}: {words}"),
        format!("Gloss (meaning) for {id}: {gloss}"),
    ];
    block.extend(lines);
    block.join("\n")
}

/// Renders the bundle: the target first, then its ancestors, then the
/// one-hop neighbours with the relation that links them to the target.
///
/// # Examples
///
/// ```
/// use hyres::{LexicalGraph, SynsetBuilder, SynsetId};
/// use hyres::context::extract;
/// use hyres::prompt::render_context;
///
/// let graph = LexicalGraph::build(vec![
///     SynsetBuilder::new("x-n").word("mouse", 0).gloss("a rodent").hypernym("r-n").build(),
///     SynsetBuilder::new("r-n").word("rodent", 0).build(),
/// ])?;
/// let text = render_context(&extract(&graph, &SynsetId::new("x-n"))?);
///
/// assert!(text.starts_with("## Data for x-n\nWords for x-n: mouse\n"));
/// assert!(text.contains("x-n has a hypernym relation to r-n."));
/// # Ok::<(), hyres::GraphError>(())
/// ```
pub fn render_context(bundle: &ContextBundle) -> String {
    let target = bundle.target();
    let mut blocks = Vec::with_capacity(bundle.len());

    let target_lines = target
        .relations()
        .into_iter()
        .filter(|(kind, _)| !matches!(kind, RelationKind::Hyponym(_)))
        .map(|(kind, id)| relation_sentence(&target.id, kind, id))
        .collect();
    blocks.push(render_block(&target.id, &target.words, &target.gloss, target_lines));

    for ancestor in bundle.ancestors() {
        let lines = ancestor
            .hypernyms
            .iter()
            .map(|r| relation_sentence(&ancestor.id, RelationKind::Hypernym(r.subtype), &r.id))
            .collect();
        blocks.push(render_block(&ancestor.id, &ancestor.words, &ancestor.gloss, lines));
    }

    for related in bundle.related() {
        let line = format!(
            "{} is linked to {} through the {} relation.",
            related.id, target.id, related.relation_type
        );
        blocks.push(render_block(&related.id, &related.words, &related.gloss, vec![line]));
    }

    let mut text = blocks.join("\n\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::extract;
    use crate::graph::LexicalGraph;
    use crate::models::{DomainType, HypernymType, PartType, SynsetBuilder};

    fn bundle() -> ContextBundle {
        let graph = LexicalGraph::build(vec![
            SynsetBuilder::new("x-n")
                .word("oak", 0)
                .word("oak tree", 0)
                .gloss("a tree of the genus Quercus")
                .hypernym("a-n")
                .relation(RelationKind::Hypernym(HypernymType::Instance), "b-n")
                .relation(RelationKind::Hyponym(HypernymType::Regular), "h-n")
                .relation(RelationKind::Holonym(PartType::Member), "g-n")
                .relation(RelationKind::Domain(DomainType::Topic), "t-n")
                .relation(RelationKind::ANTONYM, "n-n")
                .relation(RelationKind::ATTRIBUTE, "q-n")
                .build(),
            SynsetBuilder::new("a-n").word("tree", 0).gloss("a tall plant").hypernym("r-n").build(),
            SynsetBuilder::new("b-n").word("wood", 0).build(),
            SynsetBuilder::new("r-n").word("plant", 0).build(),
            SynsetBuilder::new("h-n").word("cork oak", 0).build(),
            SynsetBuilder::new("g-n").word("Quercus", 0).build(),
            SynsetBuilder::new("t-n").word("botany", 0).build(),
            SynsetBuilder::new("n-n").word("opposite", 0).build(),
            SynsetBuilder::new("q-n").word("height", 0).build(),
        ])
        .unwrap();
        extract(&graph, &SynsetId::new("x-n")).unwrap()
    }

    #[test]
    fn target_block_lists_words_gloss_and_relations() {
        let text = render_context(&bundle());
        let target_block = text.split("\n\n").next().unwrap();

        assert_eq!(
            target_block,
            "## Data for x-n\n\
             Words for x-n: oak, oak tree\n\
             Gloss (meaning) for x-n: a tree of the genus Quercus\n\
             x-n has a hypernym relation to a-n.\n\
             x-n has an instance hypernym relation to b-n.\n\
             x-n has a member holonym relation to g-n.\n\
             x-n has a topic domain relation to t-n.\n\
             x-n has an antonym relation to n-n.\n\
             x-n has an attribute relation to q-n."
        );
    }

    #[test]
    fn hyponyms_are_not_rendered() {
        assert!(!render_context(&bundle()).contains("h-n"));
    }

    #[test]
    fn ancestors_show_only_their_hypernyms() {
        let text = render_context(&bundle());
        assert!(text.contains(
            "## Data for a-n\nWords for a-n: tree\nGloss (meaning) for a-n: a tall plant\n\
             a-n has a hypernym relation to r-n."
        ));
        assert!(text.contains("## Data for r-n\nWords for r-n: plant\nGloss (meaning) for r-n: \n"));
    }

    #[test]
    fn neighbours_carry_connecting_relation() {
        let text = render_context(&bundle());
        assert!(text.contains("g-n is linked to x-n through the member holonym relation."));
        assert!(text.contains("q-n is linked to x-n through the attribute relation."));
        assert!(text.ends_with(".\n"));
    }

    #[test]
    fn block_order_follows_bundle_order() {
        let bundle = bundle();
        let text = render_context(&bundle);
        let headers: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("## Data for "))
            .collect();
        let ids: Vec<&str> = bundle.ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(headers, ids);
    }
}
