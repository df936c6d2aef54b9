//! Node-budget pruning

use super::model::{Network, PruneInfo};
use super::view::NetworkView;
use rustc_hash::FxHashSet;
use tracing::info;

/// Reduce `network` to at most `node_budget` nodes.
///
/// Seeds present in the network are always kept (even past the budget); the
/// remaining slots go to the highest-degree nodes, ties by id ascending.
/// Degree is the number of distinct neighbours in the unpruned graph. Edges
/// touching a dropped node are dropped. A budget of 0, or a network already
/// within budget, returns an unchanged copy.
pub fn prune(network: &Network, node_budget: usize) -> Network {
    if node_budget == 0 || network.node_count() <= node_budget {
        return network.clone();
    }

    let view = NetworkView::new(network);
    let mut ranked: Vec<(&str, usize)> = network
        .nodes()
        .map(|n| {
            let degree = view.index_of(&n.id).map(|ix| view.degree(ix)).unwrap_or(0);
            (n.id.as_str(), degree)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut keep: FxHashSet<&str> = network
        .seeds()
        .iter()
        .map(String::as_str)
        .filter(|s| network.contains_node(s))
        .collect();
    for (id, _) in ranked {
        if keep.len() >= node_budget {
            break;
        }
        keep.insert(id);
    }

    let mut meta = network.meta().clone();
    meta.pruned = Some(PruneInfo {
        node_budget,
        original: network.meta().counts,
    });
    let pruned = network.induced(|id| keep.contains(id), meta);
    info!(
        "Pruned network to {} nodes, {} edges (budget {}, was {} nodes)",
        pruned.node_count(),
        pruned.edge_count(),
        node_budget,
        network.node_count()
    );
    pruned
}
