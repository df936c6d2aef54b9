//! Sources command - list evidence sources

use super::print_json;
use crate::sources::EvidenceSource;
use anyhow::Result;
use console::style;
use serde_json::json;

pub(super) fn run(json: bool) -> Result<()> {
    if json {
        let rows: Vec<_> = EvidenceSource::ALL
            .iter()
            .map(|s| {
                json!({
                    "id": s.id(),
                    "description": s.description(),
                    "aliases": s.aliases(),
                })
            })
            .collect();
        return print_json(&json!({ "sources": rows }));
    }

    println!("\n{} Evidence sources\n", style("📚").bold());
    for source in EvidenceSource::ALL {
        println!("  {:<22} {}", style(source.id()).cyan().bold(), source.description());
        println!("  {:<22} {}", "", style(format!("aliases: {}", source.aliases().join(", "))).dim());
    }
    Ok(())
}
