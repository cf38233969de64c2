// Embedding table loading.
//
// Accepts JSON Lines (`.jsonl` / `.ndjson`, one record per line) or a single
// JSON array of records. Records are plain objects; which keys hold the text,
// the embedding, and the optional triple parts comes from `TableSchema`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::info;

use super::models::{EmbeddingRow, TableSchema};

/// Load every row of an embedding table.
pub fn load_table(path: &Path, schema: &TableSchema) -> Result<Vec<EmbeddingRow>> {
    let records = read_records(path)?;
    if records.is_empty() {
        bail!("Embedding table {} has no rows", path.display());
    }

    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_row(index, record, schema))
        .collect::<Result<Vec<_>>>()?;

    let dim = rows[0].embedding.len();
    info!(
        rows = rows.len(),
        dim,
        path = %path.display(),
        "Loaded embedding table"
    );
    Ok(rows)
}

fn read_records(path: &Path) -> Result<Vec<Value>> {
    let is_lines = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jsonl") | Some("ndjson")
    );
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    if is_lines {
        let mut records = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(&line)
                .with_context(|| format!("Invalid JSON on line {}", line_no + 1))?;
            records.push(value);
        }
        Ok(records)
    } else {
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        match value {
            Value::Array(items) => Ok(items),
            _ => bail!(
                "{} must hold a JSON array of records (or use a .jsonl file)",
                path.display()
            ),
        }
    }
}

/// Turn one JSON record into a row.
pub fn parse_row(index: usize, record: &Value, schema: &TableSchema) -> Result<EmbeddingRow> {
    let obj = record
        .as_object()
        .with_context(|| format!("Row {index} is not a JSON object"))?;

    let text = match obj.get(&schema.text_field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            bail!("Row {index} is missing the '{}' field", schema.text_field)
        }
        Some(other) => other.to_string(),
    };

    let embedding = match obj.get(&schema.embedding_field) {
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).with_context(|| {
                    format!(
                        "Row {index}: '{}' contains a non-numeric value",
                        schema.embedding_field
                    )
                })
            })
            .collect::<Result<Vec<f32>>>()?,
        _ => bail!(
            "Row {index} is missing the '{}' array",
            schema.embedding_field
        ),
    };
    if embedding.is_empty() {
        bail!("Row {index} has an empty embedding");
    }

    let optional = |field: &str| -> Option<String> {
        match obj.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    };

    Ok(EmbeddingRow {
        index,
        text,
        source_file: optional(&schema.source_field).unwrap_or_else(|| "unknown".to_string()),
        embedding,
        subject_text: optional(&schema.subject_field),
        object_text: optional(&schema.object_field),
    })
}

/// Collect the embeddings into a dense matrix, checking dimensions agree.
pub fn embedding_matrix(rows: &[EmbeddingRow]) -> Result<Vec<Vec<f32>>> {
    let Some(first) = rows.first() else {
        bail!("No rows to build an embedding matrix from");
    };
    let dim = first.embedding.len();
    for row in rows {
        if row.embedding.len() != dim {
            bail!(
                "Row {} has a {}-dimensional embedding, expected {}",
                row.index,
                row.embedding.len(),
                dim
            );
        }
    }
    Ok(rows.iter().map(|r| r.embedding.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_claim_row() {
        let record = json!({
            "claim_text": "Computers changed the humanities",
            "claim_embedding": [0.1, 0.2, 0.3],
            "source_file": "interview_01.json"
        });
        let row = parse_row(3, &record, &TableSchema::default()).unwrap();
        assert_eq!(row.index, 3);
        assert_eq!(row.text, "Computers changed the humanities");
        assert_eq!(row.embedding.len(), 3);
        assert_eq!(row.source_file, "interview_01.json");
        assert!(!row.is_triple());
    }

    #[test]
    fn missing_source_becomes_unknown() {
        let record = json!({"claim_text": "x", "claim_embedding": [1.0]});
        let row = parse_row(0, &record, &TableSchema::default()).unwrap();
        assert_eq!(row.source_file, "unknown");
    }

    #[test]
    fn missing_embedding_is_an_error() {
        let record = json!({"claim_text": "x"});
        let err = parse_row(7, &record, &TableSchema::default()).unwrap_err();
        assert!(err.to_string().contains("Row 7"));
    }

    #[test]
    fn non_numeric_embedding_is_an_error() {
        let record = json!({"claim_text": "x", "claim_embedding": [1.0, "a"]});
        assert!(parse_row(0, &record, &TableSchema::default()).is_err());
    }

    #[test]
    fn matrix_rejects_ragged_rows() {
        let schema = TableSchema::default();
        let a = parse_row(0, &json!({"claim_text": "a", "claim_embedding": [1.0, 2.0]}), &schema).unwrap();
        let b = parse_row(1, &json!({"claim_text": "b", "claim_embedding": [1.0]}), &schema).unwrap();
        assert!(embedding_matrix(&[a.clone()]).is_ok());
        assert!(embedding_matrix(&[a, b]).is_err());
    }
}
