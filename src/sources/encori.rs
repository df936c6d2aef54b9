//! ENCORI adapters: RBPs binding a target RNA, and RNA-RNA pairs.
//!
//! ENCORI answers with tab-separated text. Whether the first row is a header
//! depends on the endpoint and release, so columns are resolved by name when
//! a header is present and by fixed position otherwise.

use super::tsv::{self, Table};
use super::{
    Evidence, EvidenceAdapter, EvidenceSource, InteractionRecord, Pass, RbpTargetParams,
    RnaRnaParams,
};
use crate::cache::{CachedRequest, ResponseCache};
use crate::config::Settings;
use crate::error::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const ENCORI_DB: &str = "ENCORI";

/// Shared request plumbing for both endpoints
struct EncoriClient {
    cache: Arc<ResponseCache>,
    api_base: String,
    ttl: Duration,
}

impl EncoriClient {
    fn new(cache: Arc<ResponseCache>, settings: &Settings) -> Self {
        Self {
            cache,
            api_base: settings.encori_api_base.trim_end_matches('/').to_string(),
            ttl: settings.cache_ttl(),
        }
    }

    fn table(&self, endpoint: &str, params: Value) -> Result<Table> {
        let url = format!("{}/{}/", self.api_base, endpoint);
        let raw = self
            .cache
            .fetch(&CachedRequest::get(url, params), self.ttl)
            .map_err(|e| e.with_provider(ENCORI_DB))?;
        Ok(tsv::parse(&String::from_utf8_lossy(&raw)))
    }
}

pub struct RbpTargetAdapter {
    client: EncoriClient,
    params: RbpTargetParams,
}

impl RbpTargetAdapter {
    pub fn new(cache: Arc<ResponseCache>, settings: &Settings, params: RbpTargetParams) -> Self {
        Self {
            client: EncoriClient::new(cache, settings),
            params,
        }
    }

    fn query(&self, target: &str) -> Value {
        json!({
            "assembly": self.params.assembly,
            "geneType": self.params.gene_type,
            "RBP": "all",
            "clipExpNum": self.params.clip_exp_num,
            "pancancerNum": self.params.pancancer_num,
            "target": target,
            "cellType": self.params.cell_type,
        })
    }
}

/// RBP and target columns; headerless payloads put them at 0 and 2
fn rbp_target_records(table: &Table, target: &str) -> Vec<InteractionRecord> {
    let rbp_col = table.column_or("RBP", 0);
    let gene_col = table.column_or("geneName", 2);
    // Without a header, short rows are upstream messages rather than data
    let min_len = if table.header.is_empty() { 3 } else { 0 };

    table
        .rows
        .iter()
        .filter_map(|row| {
            if row.len() < min_len {
                return None;
            }
            let rbp = tsv::cell(row, rbp_col);
            if rbp.is_empty() {
                return None;
            }
            let gene = match tsv::cell(row, gene_col) {
                "" => target.trim(),
                g => g,
            };
            Some(
                Evidence::RbpTarget {
                    rbp: rbp.to_string(),
                    target: gene.to_string(),
                    source_db: ENCORI_DB.to_string(),
                    row: table.row_object(row),
                }
                .into(),
            )
        })
        .collect()
}

impl EvidenceAdapter for RbpTargetAdapter {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::RbpTarget
    }

    fn source_db(&self) -> &str {
        ENCORI_DB
    }

    fn fetch(&self, identifiers: &[String], _pass: Pass) -> Result<Vec<InteractionRecord>> {
        let mut records = Vec::new();
        for target in identifiers {
            let table = self.client.table("RBPTarget", self.query(target))?;
            let found = rbp_target_records(&table, target);
            debug!("ENCORI RBPTarget {}: {} records", target, found.len());
            records.extend(found);
        }
        Ok(records)
    }
}

pub struct RnaRnaAdapter {
    client: EncoriClient,
    params: RnaRnaParams,
}

impl RnaRnaAdapter {
    pub fn new(cache: Arc<ResponseCache>, settings: &Settings, params: RnaRnaParams) -> Self {
        Self {
            client: EncoriClient::new(cache, settings),
            params,
        }
    }

    fn query(&self, rna: &str) -> Value {
        json!({
            "assembly": self.params.assembly,
            "geneType": self.params.gene_type,
            "RNA": rna,
            "interNum": self.params.inter_num,
            "expNum": self.params.exp_num,
            "cellType": self.params.cell_type,
        })
    }
}

/// Pair columns; headerless payloads put them at 1 and 4
fn rna_rna_records(table: &Table) -> Vec<InteractionRecord> {
    let a_col = table.column_or("geneName", 1);
    let b_col = table.column_or("pairGeneName", 4);

    table
        .rows
        .iter()
        .filter_map(|row| {
            let a = tsv::cell(row, a_col);
            let b = tsv::cell(row, b_col);
            if a.is_empty() || b.is_empty() {
                return None;
            }
            Some(
                Evidence::RnaRna {
                    rna_a: a.to_string(),
                    rna_b: b.to_string(),
                    source_db: ENCORI_DB.to_string(),
                    row: table.row_object(row),
                }
                .into(),
            )
        })
        .collect()
}

impl EvidenceAdapter for RnaRnaAdapter {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::RnaRna
    }

    fn source_db(&self) -> &str {
        ENCORI_DB
    }

    fn fetch(&self, identifiers: &[String], _pass: Pass) -> Result<Vec<InteractionRecord>> {
        let mut records = Vec::new();
        for rna in identifiers {
            let table = self.client.table("RNARNA", self.query(rna))?;
            let found = rna_rna_records(&table);
            debug!("ENCORI RNARNA {}: {} records", rna, found.len());
            records.extend(found);
        }
        Ok(records)
    }
}
