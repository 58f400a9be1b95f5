//! Result rendering for `--output json|text|csv`

use crate::error::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Json,
    #[default]
    Text,
    Csv,
}

/// What a successful command hands to the formatter
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Nothing to print
    Empty,
    Json(Value),
    /// Pre-rendered text, printed as-is in every mode
    Text(String),
}

impl Output {
    /// Keep only `properties` on objects (or arrays of objects) for text and csv output
    pub fn project(self, properties: Option<&[&str]>, mode: OutputMode) -> Self {
        match (self, properties) {
            (Output::Json(value), Some(properties)) if mode != OutputMode::Json => {
                Output::Json(match value {
                    Value::Array(items) => Value::Array(
                        items.iter().map(|item| project_value(item, properties)).collect(),
                    ),
                    Value::Object(_) => project_value(&value, properties),
                    other => other,
                })
            }
            (output, _) => output,
        }
    }
}

fn project_value(value: &Value, properties: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut projected = Map::new();
            for property in properties {
                if let Some(v) = map.get(*property) {
                    projected.insert(property.to_string(), v.clone());
                }
            }
            Value::Object(projected)
        }
        other => other.clone(),
    }
}

/// Render output; `None` when there is nothing to print
pub fn render(output: &Output, mode: OutputMode) -> Result<Option<String>> {
    match output {
        Output::Empty => Ok(None),
        Output::Text(text) => Ok(Some(text.clone())),
        Output::Json(value) => match mode {
            OutputMode::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
            OutputMode::Text => Ok(Some(render_text(value))),
            OutputMode::Csv => render_csv(value).map(Some),
        },
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Column names in first-seen order across all rows
fn columns(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
            let columns = columns(rows);
            let widths: Vec<usize> = columns
                .iter()
                .map(|c| {
                    rows.iter()
                        .map(|r| scalar(&r[c.as_str()]).chars().count())
                        .max()
                        .unwrap_or(0)
                        .max(c.chars().count())
                })
                .collect();

            let mut lines = Vec::with_capacity(rows.len() + 2);
            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<w$}", c, w = *w))
                .collect();
            lines.push(header.join("  ").bold().to_string());
            lines.push(
                widths
                    .iter()
                    .map(|w| "-".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("  "),
            );
            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{:<w$}", scalar(&row[c.as_str()]), w = *w))
                    .collect();
                lines.push(cells.join("  ").trim_end().to_string());
            }
            lines.join("\n")
        }
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join("\n"),
        Value::Object(map) => {
            let width = map.keys().map(|k| k.chars().count()).max().unwrap_or(0);
            map.iter()
                .map(|(k, v)| format!("{:<w$}: {}", k, scalar(v), w = width))
                .collect::<Vec<_>>()
                .join("\n")
        }
        other => scalar(other),
    }
}

fn render_csv(value: &Value) -> Result<String> {
    let rows: Vec<Value> = match value {
        Value::Array(items) => items.clone(),
        Value::Object(_) => vec![value.clone()],
        other => return Ok(scalar(other)),
    };

    let columns = columns(&rows);
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for row in &rows {
        if columns.is_empty() {
            writer.write_record([scalar(row)])?;
        } else {
            writer.write_record(columns.iter().map(|c| scalar(&row[c.as_str()])))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grants() -> Value {
        json!([
            {"clientId": "c1", "objectId": "o1", "resourceId": "r1", "scope": "User.Read"},
            {"clientId": "c1", "objectId": "o2", "resourceId": "r2", "scope": "Mail.Read"}
        ])
    }

    #[test]
    fn test_projection_applies_to_text_only() {
        let props: &[&str] = &["objectId", "scope"];

        let projected = Output::Json(grants()).project(Some(props), OutputMode::Text);
        assert_eq!(
            projected,
            Output::Json(json!([
                {"objectId": "o1", "scope": "User.Read"},
                {"objectId": "o2", "scope": "Mail.Read"}
            ]))
        );

        let untouched = Output::Json(grants()).project(Some(props), OutputMode::Json);
        assert_eq!(untouched, Output::Json(grants()));
    }

    #[test]
    fn test_projection_ignores_scalars_and_text() {
        let props: &[&str] = &["id"];
        assert_eq!(
            Output::Json(json!("abc")).project(Some(props), OutputMode::Text),
            Output::Json(json!("abc"))
        );
        assert_eq!(
            Output::Text("a,b".into()).project(Some(props), OutputMode::Csv),
            Output::Text("a,b".into())
        );
    }

    #[test]
    fn test_render_empty_prints_nothing() {
        assert_eq!(render(&Output::Empty, OutputMode::Text).unwrap(), None);
    }

    #[test]
    fn test_render_text_table() {
        colored::control::set_override(false);
        let text = render(&Output::Json(grants()), OutputMode::Text).unwrap().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("clientId"));
        assert!(lines[2].contains("User.Read"));
    }

    #[test]
    fn test_render_text_object_and_string() {
        let text = render(&Output::Json(json!({"id": "1", "status": "ok"})), OutputMode::Text)
            .unwrap()
            .unwrap();
        assert_eq!(text, "id    : 1\nstatus: ok");

        let text = render(&Output::Json(json!("tenant-id")), OutputMode::Text)
            .unwrap()
            .unwrap();
        assert_eq!(text, "tenant-id");
    }

    #[test]
    fn test_render_csv() {
        let csv = render(&Output::Json(grants()), OutputMode::Csv).unwrap().unwrap();
        assert_eq!(
            csv,
            "clientId,objectId,resourceId,scope\nc1,o1,r1,User.Read\nc1,o2,r2,Mail.Read"
        );
    }

    #[test]
    fn test_render_json_pretty() {
        let json = render(&Output::Json(json!({"a": 1})), OutputMode::Json).unwrap().unwrap();
        assert_eq!(json, "{\n  \"a\": 1\n}");
    }
}
