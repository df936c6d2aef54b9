//! Community, module and module-label commands

use super::network::{fetch, print_summary};
use super::{print_json, NetworkArgs};
use crate::config::Settings;
use crate::graph::{extract_module, partition, Network, Partition};
use crate::scoring::label_module;
use anyhow::{Context, Result};
use console::style;
use serde_json::json;

/// Members shown per community in text mode
const PREVIEW: usize = 12;

fn partitioned(settings: &Settings, net: &NetworkArgs, min_size: usize) -> Result<(Network, Partition)> {
    let network = fetch(settings, net)?;
    let parts = partition(&network, min_size);
    Ok((network, parts))
}

pub(super) fn communities(settings: &Settings, net: &NetworkArgs, min_size: usize, json: bool) -> Result<()> {
    let (network, parts) = partitioned(settings, net, min_size)?;

    if json {
        let communities: Vec<_> = parts
            .communities
            .iter()
            .enumerate()
            .map(|(cid, members)| json!({ "cid": cid, "size": members.len(), "members": members }))
            .collect();
        return print_json(&json!({
            "algorithm": parts.algorithm,
            "min_size": parts.min_size,
            "count": parts.len(),
            "communities": communities,
            "node_to_community": parts.index,
        }));
    }

    println!(
        "\n{} {} communities (min size {}, {}) in {} nodes\n",
        style("🧩").bold(),
        style(parts.len()).cyan(),
        parts.min_size,
        parts.algorithm,
        network.node_count()
    );
    for (cid, members) in parts.communities.iter().enumerate() {
        let mut preview = members.iter().take(PREVIEW).cloned().collect::<Vec<_>>().join(", ");
        if members.len() > PREVIEW {
            preview.push_str(&format!(", ... {} more", members.len() - PREVIEW));
        }
        println!(
            "  {} {:>4}  {}",
            style(format!("C{:<3}", cid)).cyan().bold(),
            members.len(),
            preview
        );
    }
    Ok(())
}

pub(super) fn module(settings: &Settings, net: &NetworkArgs, cid: usize, min_size: usize, json: bool) -> Result<()> {
    let (network, parts) = partitioned(settings, net, min_size)?;
    let sub = extract_module(&network, &parts, cid).context("Invalid --cid")?;

    if json {
        return print_json(&sub);
    }
    println!("\n{} Module C{}", style("🔎").bold(), cid);
    print_summary(&sub);
    Ok(())
}

pub(super) fn label(
    settings: &Settings,
    net: &NetworkArgs,
    cid: usize,
    min_size: usize,
    top_hubs: usize,
    json: bool,
) -> Result<()> {
    let (network, parts) = partitioned(settings, net, min_size)?;
    let sub = extract_module(&network, &parts, cid).context("Invalid --cid")?;
    let info = label_module(&sub, top_hubs);

    if json {
        return print_json(&json!({
            "cid": cid,
            "module_size": sub.node_count(),
            "label": info.label,
            "score": info.score,
            "evidence": {
                "hub_hits": info.hub_hits,
                "gene_hits": info.gene_hits,
                "rule_patterns": info.rule,
                "top_hubs": info.top_hubs,
            },
        }));
    }

    println!(
        "\n{} C{} ({} nodes): {} (score {})\n",
        style("🏷").bold(),
        cid,
        sub.node_count(),
        style(&info.label).green().bold(),
        info.score
    );
    if !info.hub_hits.is_empty() {
        println!("  {}: {}", style("Hub hits").bold(), info.hub_hits.join(", "));
    }
    if !info.gene_hits.is_empty() {
        println!("  {}: {}", style("Gene hits").bold(), info.gene_hits.join(", "));
    }
    println!("  {}: {}", style("Top hubs").bold(), info.top_hubs.join(", "));
    Ok(())
}

pub(super) fn labels(
    settings: &Settings,
    net: &NetworkArgs,
    top_k: usize,
    min_size: usize,
    top_hubs: usize,
    json: bool,
) -> Result<()> {
    let (network, parts) = partitioned(settings, net, min_size)?;
    let k = top_k.min(parts.len());

    let mut rows = Vec::with_capacity(k);
    for cid in 0..k {
        let sub = extract_module(&network, &parts, cid)?;
        rows.push((cid, sub.node_count(), label_module(&sub, top_hubs)));
    }

    if json {
        let labels: Vec<_> = rows
            .iter()
            .map(|(cid, size, info)| {
                json!({
                    "cid": cid,
                    "size": size,
                    "label": info.label,
                    "score": info.score,
                    "hub_hits": info.hub_hits,
                })
            })
            .collect();
        return print_json(&json!({ "count": labels.len(), "labels": labels }));
    }

    println!("\n{} Module labels ({} of {})\n", style("🏷").bold(), k, parts.len());
    for (cid, size, info) in &rows {
        println!(
            "  {} {:>4}  {} {}",
            style(format!("C{:<3}", cid)).cyan().bold(),
            size,
            style(&info.label).green(),
            style(format!("(score {})", info.score)).dim()
        );
    }
    Ok(())
}
