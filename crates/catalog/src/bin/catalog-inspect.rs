//! catalog-inspect — print catalogue facets for a metric name list.
//!
//! Reads newline-separated metric names from a file (or stdin with `-`) and
//! prints the requested facet as JSON. Handy for eyeballing how a scrape's
//! names will group before wiring a UI to the library.

use std::fs;
use std::io::Read;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use metriscope_catalog::{
    build_trie, category_groups, flatten_sorted_by, prefix_groups, rules_split, sub_prefix_groups,
    suffix_groups, CategoryRegistry, MetricEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Facet {
    Prefix,
    Suffix,
    Categories,
    Rules,
    Trie,
}

/// Inspect catalogue facets for a list of metric names.
#[derive(Parser, Debug)]
#[command(name = "catalog-inspect", version, about)]
struct Cli {
    /// Path to a newline-separated name list, or `-` for stdin.
    input: String,

    /// Which facet to print.
    #[arg(long, value_enum, default_value_t = Facet::Prefix)]
    facet: Facet,

    /// Restrict prefix grouping to the second level under this parent.
    #[arg(long)]
    parent: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let raw = if cli.input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading names from stdin")?;
        buf
    } else {
        fs::read_to_string(&cli.input)
            .with_context(|| format!("reading names from {}", cli.input))?
    };

    let names: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    info!(names = names.len(), facet = ?cli.facet, "inspecting catalogue");

    let entries: Vec<MetricEntry> = names.iter().map(|n| MetricEntry::new(*n)).collect();

    let json = match cli.facet {
        Facet::Prefix => match &cli.parent {
            Some(parent) => serde_json::to_string_pretty(&sub_prefix_groups(&entries, parent))?,
            None => serde_json::to_string_pretty(&prefix_groups(&entries))?,
        },
        Facet::Suffix => serde_json::to_string_pretty(&suffix_groups(&entries))?,
        Facet::Categories => {
            let registry = CategoryRegistry::builtin();
            serde_json::to_string_pretty(&category_groups(&entries, &registry))?
        }
        Facet::Rules => serde_json::to_string_pretty(&rules_split(&entries))?,
        Facet::Trie => {
            let root = build_trie(&names);
            let array = flatten_sorted_by(&root, &|a, b| {
                b.count.cmp(&a.count).then_with(|| a.part.cmp(&b.part))
            });
            serde_json::to_string_pretty(&array)?
        }
    };

    println!("{json}");
    Ok(())
}
