//! STRING protein-protein interaction adapter
//!
//! Two calls per batch: map free-text identifiers to STRING ids, then fetch
//! interaction partners in chunks. Both go through the response cache.

use super::{EvidenceAdapter, EvidenceSource, Evidence, InteractionRecord, Pass, PpiParams};
use crate::cache::{CachedRequest, ResponseCache};
use crate::config::Settings;
use crate::error::{FusionError, Result};
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const STRING_DB: &str = "STRING";

/// Identifiers per interaction_partners request
const PARTNER_CHUNK: usize = 60;

pub struct StringPpiAdapter {
    cache: Arc<ResponseCache>,
    api_base: String,
    caller_identity: String,
    species: u32,
    params: PpiParams,
    ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct MappedId {
    #[serde(rename = "stringId")]
    string_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PartnerRow {
    #[serde(rename = "stringId_A")]
    string_id_a: Option<String>,
    #[serde(rename = "stringId_B")]
    string_id_b: Option<String>,
    #[serde(rename = "preferredName_A")]
    preferred_name_a: Option<String>,
    #[serde(rename = "preferredName_B")]
    preferred_name_b: Option<String>,
    score: Option<Value>,
}

fn pick_name(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
    preferred
        .filter(|s| !s.trim().is_empty())
        .or(fallback)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// STRING reports scores as numbers, occasionally as strings
fn parse_score(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl StringPpiAdapter {
    pub fn new(cache: Arc<ResponseCache>, settings: &Settings, species: u32, params: PpiParams) -> Self {
        Self {
            cache,
            api_base: settings.string_api_base.trim_end_matches('/').to_string(),
            caller_identity: settings.string_caller_identity.clone(),
            species,
            params,
            ttl: settings.cache_ttl(),
        }
    }

    fn post_json<T: for<'de> Deserialize<'de>>(&self, endpoint: &str, body: Value) -> Result<T> {
        let url = format!("{}/json/{}", self.api_base, endpoint);
        let request = CachedRequest::post_form(url, body);
        let raw = self
            .cache
            .fetch(&request, self.ttl)
            .map_err(|e| e.with_provider(STRING_DB))?;
        serde_json::from_slice(&raw).map_err(|e| {
            FusionError::upstream(STRING_DB, format!("undecodable {} response: {}", endpoint, e))
        })
    }

    /// Resolve identifiers to STRING ids (best match each)
    fn map_identifiers(&self, identifiers: &[String]) -> Result<Vec<String>> {
        let body = json!({
            "identifiers": identifiers.join("\r"),
            "species": self.species,
            "limit": 1,
            "echo_query": 1,
            "caller_identity": self.caller_identity,
        });
        let mapped: Vec<MappedId> = self.post_json("get_string_ids", body)?;
        Ok(mapped.into_iter().filter_map(|m| m.string_id).collect())
    }

    fn partners(&self, string_ids: &[String], limit: u32) -> Result<Vec<PartnerRow>> {
        let body = json!({
            "identifiers": string_ids.join("\r"),
            "species": self.species,
            "required_score": self.params.required_score,
            "limit": limit,
            "caller_identity": self.caller_identity,
        });
        self.post_json("interaction_partners", body)
    }
}

impl EvidenceAdapter for StringPpiAdapter {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::Ppi
    }

    fn source_db(&self) -> &str {
        STRING_DB
    }

    fn fetch(&self, identifiers: &[String], pass: Pass) -> Result<Vec<InteractionRecord>> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }

        let mapped = self.map_identifiers(identifiers)?;
        let string_ids = if !mapped.is_empty() {
            mapped
        } else if pass == Pass::Primary {
            // Let STRING try the raw names
            identifiers.to_vec()
        } else {
            return Ok(Vec::new());
        };

        let limit = match pass {
            Pass::Primary => self.params.limit,
            Pass::Expansion => self.params.depth2_limit,
        };

        // Chunks run in parallel; collect keeps chunk order
        let chunks: Vec<Vec<PartnerRow>> = string_ids
            .par_chunks(PARTNER_CHUNK)
            .map(|chunk| self.partners(chunk, limit))
            .collect::<Result<_>>()?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in chunks.into_iter().flatten() {
            let a = pick_name(row.preferred_name_a, row.string_id_a);
            let b = pick_name(row.preferred_name_b, row.string_id_b);
            let (Some(a), Some(b)) = (a, b) else {
                skipped += 1;
                continue;
            };
            records.push(
                Evidence::ProteinProtein {
                    protein_a: a,
                    protein_b: b,
                    score: parse_score(row.score.as_ref()),
                    source_db: STRING_DB.to_string(),
                    depth: pass.depth(),
                }
                .into(),
            );
        }

        debug!(
            "STRING depth {}: {} identifiers -> {} records ({} skipped)",
            pass.depth(),
            string_ids.len(),
            records.len(),
            skipped
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{HostThrottle, Transport};
    use std::sync::Mutex;

    /// Answers STRING endpoints from fixed payloads
    struct FakeString {
        ids: &'static str,
        partners: &'static str,
        seen: Mutex<Vec<CachedRequest>>,
    }

    impl Transport for FakeString {
        fn name(&self) -> &str {
            "fake-string"
        }

        fn send(&self, request: &CachedRequest) -> Result<Vec<u8>> {
            self.seen.lock().unwrap().push(request.clone());
            let body = if request.url.ends_with("get_string_ids") {
                self.ids
            } else {
                self.partners
            };
            Ok(body.as_bytes().to_vec())
        }
    }

    fn adapter(
        ids: &'static str,
        partners: &'static str,
    ) -> (tempfile::TempDir, Arc<FakeString>, StringPpiAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeString {
            ids,
            partners,
            seen: Mutex::new(Vec::new()),
        });
        let cache = Arc::new(ResponseCache::new(
            dir.path(),
            transport.clone(),
            Arc::new(HostThrottle::disabled()),
        ));
        let adapter = StringPpiAdapter::new(cache, &Settings::default(), 9606, PpiParams::default());
        (dir, transport, adapter)
    }

    const PARTNERS: &str = r#"[
        {"stringId_A":"9606.ENSP1","stringId_B":"9606.ENSP2","preferredName_A":"TP53","preferredName_B":"MDM2","score":0.999},
        {"stringId_A":"9606.ENSP1","stringId_B":"9606.ENSP3","preferredName_A":"TP53","score":"0.8"},
        {"stringId_A":"9606.ENSP1","preferredName_A":"TP53","score":0.7}
    ]"#;

    #[test]
    fn test_fetch_maps_then_queries_partners() {
        let (_dir, transport, adapter) =
            adapter(r#"[{"queryIndex":0,"stringId":"9606.ENSP1"}]"#, PARTNERS);
        let recs = adapter.fetch(&["tp53".to_string()], Pass::Primary).unwrap();

        // Third row has no B end and is skipped; second falls back to the STRING id
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].node_b.id, "MDM2");
        assert_eq!(recs[1].node_b.id, "9606.ENSP3");
        assert_eq!(recs[1].score, Some(0.8));
        assert_eq!(recs[0].evidence["depth"], 1);

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].body["echo_query"], 1);
        assert_eq!(seen[0].body["caller_identity"], "API_Interactomes");
        assert_eq!(seen[1].body["identifiers"], "9606.ENSP1");
        assert_eq!(seen[1].body["limit"], 50);
        assert_eq!(seen[1].body["required_score"], 700);
    }

    #[test]
    fn test_unmapped_primary_falls_back_to_raw_names() {
        let (_dir, transport, adapter) = adapter("[]", "[]");
        adapter
            .fetch(&["TP53".to_string(), "BRCA1".to_string()], Pass::Primary)
            .unwrap();
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[1].body["identifiers"], "TP53\rBRCA1");
    }

    #[test]
    fn test_unmapped_expansion_is_empty() {
        let (_dir, transport, adapter) = adapter("[]", PARTNERS);
        let recs = adapter.fetch(&["X".to_string()], Pass::Expansion).unwrap();
        assert!(recs.is_empty());
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_expansion_uses_depth2_limit() {
        let (_dir, transport, adapter) =
            adapter(r#"[{"stringId":"9606.ENSP2"}]"#, PARTNERS);
        let recs = adapter.fetch(&["MDM2".to_string()], Pass::Expansion).unwrap();
        assert_eq!(recs[0].evidence["depth"], 2);
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[1].body["limit"], 10);
    }

    #[test]
    fn test_error_payload_is_upstream_failure() {
        let (_dir, _transport, adapter) =
            adapter(r#"{"Error":"not found"}"#, "[]");
        let err = adapter.fetch(&["TP53".to_string()], Pass::Primary).unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().starts_with("STRING"));
    }

    #[test]
    fn test_pick_name_prefers_preferred() {
        assert_eq!(
            pick_name(Some("TP53".into()), Some("9606.ENSP1".into())),
            Some("TP53".to_string())
        );
        assert_eq!(
            pick_name(Some("  ".into()), Some("9606.ENSP1".into())),
            Some("9606.ENSP1".to_string())
        );
        assert_eq!(pick_name(None, None), None);
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score(Some(&json!(0.95))), Some(0.95));
        assert_eq!(parse_score(Some(&json!("0.5"))), Some(0.5));
        assert_eq!(parse_score(Some(&json!("n/a"))), None);
        assert_eq!(parse_score(None), None);
    }

    #[test]
    fn test_partner_row_decodes_string_payload() {
        let raw = r#"[{"stringId_A":"9606.ENSP1","stringId_B":"9606.ENSP2",
            "preferredName_A":"TP53","preferredName_B":"MDM2","ncbiTaxonId":9606,
            "score":0.999,"nscore":0,"escore":0.99}]"#;
        let rows: Vec<PartnerRow> = serde_json::from_str(raw).unwrap();
        assert_eq!(rows[0].preferred_name_b.as_deref(), Some("MDM2"));
        assert_eq!(parse_score(rows[0].score.as_ref()), Some(0.999));
    }
}
