//! Number a document from a JSON file and print one path per paragraph.
//!
//! Input shape:
//!
//! ```text
//! { "definitions": { "lists": [ ... ] },
//!   "paragraphs": [ { "position": 0, "list": 1, "level": 0 }, { "position": 1 } ] }
//! ```
//!
//! Reads the file named by the first argument, or stdin. Set `RUST_LOG` to see
//! pass diagnostics.

use std::io::Read;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use numbering::config::Definitions;
use numbering::scan::Paragraph;
use numbering::scan::Rendered;
use numbering::scan::rescan;
use numbering::store::CounterStore;

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    definitions: Definitions,
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
}

fn read_input() -> numbering::Result<String> {
    let mut input = String::new();
    match std::env::args().nth(1) {
        Some(path) => input = std::fs::read_to_string(path)?,
        None => {
            std::io::stdin().read_to_string(&mut input)?;
        }
    }
    return Ok(input);
}

fn run() -> numbering::Result<()> {
    let document: Document = serde_json::from_str(&read_input()?)?;

    let mut store = CounterStore::new();
    let mut rendered: Vec<Rendered> = Vec::with_capacity(document.paragraphs.len());
    let summary = rescan(&mut store, &document.definitions, document.paragraphs, &mut rendered)?;

    for entry in &rendered {
        let label = match entry.path() {
            Some(path) => path.iter().map(|count| count.to_string()).collect::<Vec<_>>().join("."),
            None => "-".to_string(),
        };
        println!("{}\t{}", entry.position, label);
    }
    tracing::info!(
        numbered = summary.numbered,
        cleared = summary.cleared,
        "{}; paths {}",
        summary.stats,
        summary.path_stats
    );
    return Ok(());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
