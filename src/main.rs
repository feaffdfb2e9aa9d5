use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use hyres::context::extract;
use hyres::ollama::{OllamaError, TextGenerator};
use hyres::prompt::render_context;
use hyres::resolver::{BreakdownResolverBuilder, HypernymResolverBuilder};
use hyres::utils::{graph_from_raw, load_graph, read_input, sample_ids, write_output};
use hyres::{EditApplier, EditError, GraphError, ParseError, ResolverConfig, SynsetId};
use tracing_subscriber::EnvFilter;

/// hyres - resolve multiple hypernyms in a WordNet noun graph
#[derive(Parser)]
#[command(name = "hyres")]
#[command(about = "Decode WordNet noun data and collapse multiple hypernyms into one")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Convert a raw noun data file into a JSON entry collection
    Convert(ConvertCommand),
    /// Report relations that point at missing synsets
    Check(GraphArgs),
    /// List synsets that have two or more hypernyms
    Candidates(CandidatesCommand),
    /// Print the context bundle for one synset
    Context(ContextCommand),
    /// Ask a model to resolve a synset's hypernyms and print the updated entry
    Resolve(ResolveCommand),
}

/// Convert raw data to JSON
#[derive(Parser)]
struct ConvertCommand {
    /// Raw data file (reads standard input when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file (writes standard output when omitted)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

/// A graph file argument
#[derive(Parser)]
struct GraphArgs {
    /// JSON entry collection (.json) or raw data file
    #[arg(value_name = "GRAPH")]
    graph: PathBuf,
}

/// List resolution candidates
#[derive(Parser)]
struct CandidatesCommand {
    #[command(flatten)]
    graph: GraphArgs,

    /// Print only a random sample of this many ids
    #[arg(short, long, value_name = "N")]
    sample: Option<usize>,

    /// Seed for the random sample
    #[arg(long, value_name = "SEED", requires = "sample")]
    seed: Option<u64>,
}

/// Show a context bundle
#[derive(Parser)]
struct ContextCommand {
    #[command(flatten)]
    graph: GraphArgs,

    /// Synset id, e.g. 02084071-n
    #[arg(value_name = "ID")]
    id: String,

    /// Print the rendered model prompt data instead of JSON
    #[arg(long)]
    prompt: bool,
}

/// Resolve one synset
#[derive(Parser)]
struct ResolveCommand {
    #[command(flatten)]
    graph: GraphArgs,

    /// Synset id, e.g. 02084071-n
    #[arg(value_name = "ID")]
    id: String,

    /// Model name (overrides OLLAMA_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server URL (overrides OLLAMA_HOST)
    #[arg(long, value_name = "URL")]
    host: Option<String>,

    /// How to ask the model
    #[arg(long, value_enum, default_value_t = Strategy::Single)]
    strategy: Strategy,
}

/// Resolution strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// One prompt with the whole context, answered as a JSON list
    Single,
    /// A series of small plain-text questions, ranked at the end
    Breakdown,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Convert(cmd) => handle_convert(cmd),
        Commands::Check(cmd) => handle_check(cmd),
        Commands::Candidates(cmd) => handle_candidates(cmd),
        Commands::Context(cmd) => handle_context(cmd),
        Commands::Resolve(cmd) => handle_resolve(cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are problems with the input data or the request: malformed
/// lines, unknown ids, rejected edits and unreadable JSON. Everything else
/// (I/O, model server) is internal. A model server failure stays internal
/// even when its source is a JSON error.
fn is_user_error(error: &anyhow::Error) -> bool {
    if error.chain().any(|cause| cause.is::<OllamaError>()) {
        return false;
    }
    error.chain().any(|cause| {
        cause.is::<ParseError>()
            || cause.is::<GraphError>()
            || cause.is::<EditError>()
            || cause.is::<serde_json::Error>()
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    text.push('\n');
    Ok(text)
}

fn handle_convert(cmd: &ConvertCommand) -> Result<()> {
    let input = read_input(cmd.input.as_deref())?;
    let graph = graph_from_raw(&input)?;

    let warnings = graph.validate_integrity();
    for warning in &warnings {
        tracing::warn!(%warning, "dangling relation");
    }

    write_output(cmd.output.as_deref(), &to_json(&graph)?)?;
    eprintln!(
        "Converted {} synsets ({} integrity warnings)",
        graph.len(),
        warnings.len()
    );
    Ok(())
}

fn handle_check(cmd: &GraphArgs) -> Result<()> {
    let graph = load_graph(&cmd.graph)?;
    let warnings = graph.validate_integrity();
    for warning in &warnings {
        println!("{warning}");
    }
    eprintln!(
        "{} synsets checked, {} dangling relations",
        graph.len(),
        warnings.len()
    );
    Ok(())
}

fn handle_candidates(cmd: &CandidatesCommand) -> Result<()> {
    let graph = load_graph(&cmd.graph.graph)?;
    let mut ids = graph.multi_hypernym_ids();
    if let Some(count) = cmd.sample {
        ids = sample_ids(&ids, count, cmd.seed);
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

fn handle_context(cmd: &ContextCommand) -> Result<()> {
    let graph = load_graph(&cmd.graph.graph)?;
    let bundle = extract(&graph, &SynsetId::new(cmd.id.as_str()))?;
    let text = if cmd.prompt {
        render_context(&bundle)
    } else {
        to_json(&bundle)?
    };
    write_output(None, &text)
}

fn handle_resolve(cmd: &ResolveCommand) -> Result<()> {
    let mut config = ResolverConfig::from_env();
    if let Some(model) = &cmd.model {
        config.model.clone_from(model);
    }
    if let Some(host) = &cmd.host {
        config.host.clone_from(host);
    }
    if cmd.strategy == Strategy::Breakdown {
        config.json_format = false;
    }

    let graph = load_graph(&cmd.graph.graph)?;
    let bundle = extract(&graph, &SynsetId::new(cmd.id.as_str()))?;

    let client: Arc<dyn TextGenerator> =
        Arc::new(config.client().context("Failed to create Ollama client")?);
    let resolution = match cmd.strategy {
        Strategy::Single => HypernymResolverBuilder::new()
            .client(client)
            .build()
            .resolve(&config.model, &bundle),
        Strategy::Breakdown => BreakdownResolverBuilder::new()
            .client(client)
            .build()
            .resolve(&config.model, &bundle),
    }
    .with_context(|| format!("Failed to resolve {}", cmd.id))?;

    if let Some(reasoning) = &resolution.reasoning {
        eprintln!("Reasoning: {reasoning}");
    }

    let mut applier = EditApplier::new(&bundle);
    let updated = applier
        .apply(resolution.proposal)
        .with_context(|| format!("Model proposal for {} was rejected", cmd.id))?;

    write_output(None, &to_json(&updated)?)
}
