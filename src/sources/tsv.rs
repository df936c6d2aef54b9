//! Tab-separated payload decoding for ENCORI responses

/// Column names that mark the first row as a header
const HEADER_MARKERS: &[&str] = &[
    "RBP",
    "geneID",
    "geneName",
    "pairGeneName",
    "miRNAname",
    "miRNAid",
];

/// A decoded TSV table. `header` is empty when the payload had none.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Position of a named column, if the table has a header containing it.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Resolve a column: by header name when present, else a fixed fallback.
    pub fn column_or(&self, name: &str, fallback: usize) -> usize {
        if self.header.is_empty() {
            fallback
        } else {
            self.column(name).unwrap_or(fallback)
        }
    }

    /// Row as a header-keyed JSON object (positional keys when headerless).
    pub fn row_object(&self, row: &[String]) -> serde_json::Map<String, serde_json::Value> {
        row.iter()
            .enumerate()
            .map(|(i, cell)| {
                let key = self
                    .header
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("col{}", i));
                (key, serde_json::Value::String(cell.clone()))
            })
            .collect()
    }
}

/// Parse TSV text. Blank rows and `#` comment lines are dropped.
pub fn parse(text: &str) -> Table {
    let mut rows: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| {
            line.trim_end_matches('\r')
                .split('\t')
                .map(|cell| cell.to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .collect();

    if rows.is_empty() {
        return Table::default();
    }

    let is_header = rows[0]
        .iter()
        .any(|cell| HEADER_MARKERS.contains(&cell.as_str()));
    if is_header {
        let header = rows.remove(0);
        Table { header, rows }
    } else {
        Table {
            header: Vec::new(),
            rows,
        }
    }
}

/// Cell at `idx`, trimmed; empty when the row is short.
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|c| c.trim()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_detected() {
        let t = parse("RBP\tgeneID\tgeneName\nELAVL1\tENSG1\tTP53\n\nFUS\tENSG1\tTP53\n");
        assert_eq!(t.header, vec!["RBP", "geneID", "geneName"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.column_or("geneName", 9), 2);
    }

    #[test]
    fn test_headerless_uses_fallback() {
        let t = parse("ELAVL1\tx\tTP53\r\n");
        assert!(t.header.is_empty());
        assert_eq!(t.column_or("geneName", 2), 2);
        assert_eq!(cell(&t.rows[0], 2), "TP53");
        assert_eq!(cell(&t.rows[0], 7), "");
    }

    #[test]
    fn test_comments_and_blank_rows_dropped() {
        let t = parse("# ENCORI output\n\t\t\n   \ngeneName\tpairGeneName\nA\tB\n");
        assert_eq!(t.header, vec!["geneName", "pairGeneName"]);
        assert_eq!(t.rows, vec![vec!["A".to_string(), "B".to_string()]]);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(parse(""), Table::default());
    }

    #[test]
    fn test_row_object_keys() {
        let t = parse("RBP\tgeneName\nFUS\tTP53\n");
        let obj = t.row_object(&t.rows[0]);
        assert_eq!(obj["RBP"], "FUS");
        assert_eq!(obj["geneName"], "TP53");
    }
}
