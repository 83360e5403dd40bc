// Command-line SPARQL resource browser
//
// Browses one resource of an endpoint in both directions, printing each
// predicate row as soon as it is complete, then the serialized statements.

use anyhow::Result;
use clap::Parser;
use kodegen_tools_sparql::{BrowseContext, Direction, Plugin, Session, load_yaml_config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Browse a SPARQL resource's outgoing and incoming statements
#[derive(Parser, Debug)]
#[command(name = "kodegen-sparql")]
#[command(version, about, long_about = None)]
struct Args {
    /// Resource to browse: `<iri>`, `prefix:local` or a bare IRI
    resource: String,

    /// SPARQL endpoint URL (overrides the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Config file (defaults to <config dir>/kodegen/sparql.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rows requested per page
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Output format MIME type, e.g. text/turtle or application/n-triples
    #[arg(short, long)]
    format: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_yaml_config(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    let prefixes = Arc::new(config.prefix_map());
    let printer = Plugin::new("cli-printer").on_row(move |event| {
        let values: Vec<String> = event.terms.iter().map(|t| t.to_turtle(&prefixes)).collect();
        let arrow = match event.direction {
            Direction::Outgoing => "->",
            Direction::Incoming => "<-",
        };
        println!("{} {} {}", arrow, prefixes.terse(event.predicate), values.join(", "));
    });
    let ctx = BrowseContext::from_config(config)?.with_plugin(printer)?;
    let session = Session::new(ctx);

    session.browse(&args.resource).await?;
    let outcome = session.wait().await?;
    tracing::info!(
        resource = %outcome.resource,
        triples = outcome.triples(),
        "Loaded '{}'",
        outcome.title()
    );

    println!();
    println!("{}", session.serialize(args.format.as_deref())?);
    Ok(())
}
