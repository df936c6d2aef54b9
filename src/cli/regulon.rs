//! Regulon command - shared interactors of the seed set

use super::network::fetch;
use super::{print_json, NetworkArgs};
use crate::config::Settings;
use crate::scoring::{score, CoverageMode};
use anyhow::Result;
use console::style;

pub(super) struct Options {
    pub mode: CoverageMode,
    pub min_coverage: Option<usize>,
    pub top: usize,
    pub exclude_seed_nodes: bool,
}

pub(super) fn run(settings: &Settings, net: &NetworkArgs, opts: Options, json: bool) -> Result<()> {
    let network = fetch(settings, net)?;
    let seeds = network.seeds().to_vec();
    let min_coverage = opts
        .min_coverage
        .unwrap_or_else(|| opts.mode.min_coverage(seeds.len()));

    let report = score(&network, &seeds, min_coverage, opts.top, opts.exclude_seed_nodes);

    if json {
        return print_json(&report);
    }

    println!(
        "\n{} Regulon: {} seed(s), min coverage {} ({})\n",
        style("🎯").bold(),
        report.seed_count,
        report.min_coverage,
        opts.mode
    );
    println!(
        "  {} candidates, {} connected to every seed\n",
        style(report.total_candidates).cyan(),
        style(report.intersection_count).cyan()
    );
    if report.top_interactors.is_empty() {
        println!("  {}", style("No candidate reaches the coverage threshold").dim());
        return Ok(());
    }

    println!(
        "  {:<4} {:<16} {:>8} {:>10} {:>10} {:>4} {:>6}",
        "#", "node", "coverage", "conf_sum", "specific", "dbs", "degree"
    );
    for (rank, c) in report.top_interactors.iter().enumerate() {
        let node = if c.coverage == report.seed_count {
            style(&c.node).green().bold().to_string()
        } else {
            c.node.clone()
        };
        println!(
            "  {:<4} {:<16} {:>8} {:>10.3} {:>10.3} {:>4} {:>6}",
            rank + 1,
            node,
            format!("{}/{}", c.coverage, report.seed_count),
            c.confidence_sum,
            c.specificity,
            c.db_support,
            c.degree
        );
    }
    Ok(())
}
