//! Shared helpers for loading graphs and moving text in and out of the CLI.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::decoder::decode_all;
use crate::graph::LexicalGraph;
use crate::models::SynsetId;

/// Returns true if `path` names a serialized JSON entry collection rather
/// than a raw data file.
pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Decodes raw data text into a graph.
///
/// # Errors
///
/// Returns the first [`crate::decoder::ParseError`] or a duplicate id error.
pub fn graph_from_raw(text: &str) -> Result<LexicalGraph> {
    let synsets = decode_all(text)?;
    Ok(LexicalGraph::build(synsets)?)
}

/// Loads a graph from a `.json` entry collection or a raw data file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its contents do not
/// decode.
pub fn load_graph(path: &Path) -> Result<LexicalGraph> {
    let graph = if is_json_path(path) {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        LexicalGraph::from_json(BufReader::new(file))
            .with_context(|| format!("Failed to load graph from {}", path.display()))?
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        graph_from_raw(&text)
            .with_context(|| format!("Failed to decode {}", path.display()))?
    };
    info!(path = %path.display(), synsets = graph.len(), "loaded graph");
    Ok(graph)
}

/// Reads all of `path`, or standard input when no path is given.
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read standard input")?;
            Ok(text)
        }
    }
}

/// Writes `text` to `path`, or standard output when no path is given.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write standard output")
        }
    }
}

/// Picks up to `count` ids at random, returned sorted.
///
/// A fixed `seed` makes the pick reproducible.
pub fn sample_ids<'a>(ids: &[&'a SynsetId], count: usize, seed: Option<u64>) -> Vec<&'a SynsetId> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut picked: Vec<&SynsetId> = ids.choose_multiple(&mut rng, count).copied().collect();
    picked.sort();
    picked
}
