//! Network command - build and print the fused network

use super::{print_json, spinner, NetworkArgs};
use crate::cache::ResponseCache;
use crate::config::Settings;
use crate::graph::{build, Network};
use crate::sources::EvidenceRegistry;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;

/// Build the network described by `net` against the live providers
pub(super) fn fetch(settings: &Settings, net: &NetworkArgs) -> Result<Network> {
    let request = net.request(settings)?;
    let cache = Arc::new(ResponseCache::from_settings(settings));
    let registry = EvidenceRegistry::http(cache, settings, &request.params);

    let bar = spinner(format!(
        "Fetching evidence for {} seed(s)...",
        request.query_seeds().len()
    ));
    let network = build(&request, &registry);
    bar.finish_and_clear();

    network.context("Failed to build network")
}

pub(super) fn print_summary(network: &Network) {
    let meta = network.meta();
    println!(
        "\n{} Network: {} nodes, {} edges\n",
        style("🧬").bold(),
        style(network.node_count()).cyan(),
        style(network.edge_count()).cyan()
    );
    println!("  {}: {}", style("Seeds").bold(), meta.seeds.join(", "));
    println!(
        "  {}: {}",
        style("Sources").bold(),
        meta.sources
            .iter()
            .map(|s| s.id())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Some(pruned) = &meta.pruned {
        println!(
            "  {} pruned to {} nodes (from {} nodes, {} edges)",
            style("!").yellow().bold(),
            pruned.node_budget,
            pruned.original.nodes,
            pruned.original.edges
        );
    }
}

pub(super) fn run(settings: &Settings, net: &NetworkArgs, output: Option<&Path>, json: bool) -> Result<()> {
    let network = fetch(settings, net)?;

    if let Some(path) = output {
        let text = serde_json::to_string_pretty(&network)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if json {
        return print_json(&network);
    }

    print_summary(&network);
    let mut by_kind = std::collections::BTreeMap::new();
    for edge in network.edges() {
        *by_kind
            .entry((edge.kind.as_str(), edge.source_db.as_str()))
            .or_insert(0usize) += 1;
    }
    if !by_kind.is_empty() {
        println!("\n  {}", style("Edges by evidence").bold());
        for ((kind, db), count) in by_kind {
            println!("    {:<12} {:<8} {}", kind, db, count);
        }
    }
    if let Some(path) = output {
        println!(
            "\n{} Wrote {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}
