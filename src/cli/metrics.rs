//! Metrics command - degree and betweenness hubs

use super::network::fetch;
use super::{print_json, NetworkArgs};
use crate::config::Settings;
use crate::graph::metrics::BETWEENNESS_MAX_NODES;
use crate::graph::summarize;
use anyhow::Result;
use console::style;
use std::collections::HashSet;

pub(super) fn run(settings: &Settings, net: &NetworkArgs, ignore_seeds: bool, json: bool) -> Result<()> {
    let network = fetch(settings, net)?;
    let ignore: HashSet<String> = if ignore_seeds {
        network.seeds().iter().cloned().collect()
    } else {
        HashSet::new()
    };
    let summary = summarize(&network, &ignore);

    if json {
        return print_json(&summary);
    }

    println!(
        "\n{} Metrics: {} nodes, {} edges\n",
        style("📊").bold(),
        summary.node_count,
        summary.edge_count
    );
    println!("  {}", style("Top degree").bold());
    for entry in &summary.top_degree {
        println!("    {:<16} {}", entry.node, entry.degree);
    }
    match &summary.top_betweenness {
        Some(top) => {
            println!("\n  {}", style("Top betweenness").bold());
            for entry in top {
                println!("    {:<16} {:.4}", entry.node, entry.betweenness);
            }
        }
        None => println!(
            "\n  {}",
            style(format!(
                "Betweenness skipped ({} nodes > {})",
                summary.node_count, BETWEENNESS_MAX_NODES
            ))
            .dim()
        ),
    }
    Ok(())
}
