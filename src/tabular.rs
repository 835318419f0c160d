//! Conversion between delimited text and tables of records.
//!
//! Encoding quotes every cell. Decoding is a plain split on the delimiter:
//! keyed cells lose one pair of enclosing quotes, but a quoted cell that
//! contains the delimiter or a newline is still split apart.

use crate::error::{FormatError, FormatResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::borrow::Cow;

pub const DEFAULT_DELIMITER: &str = ",";

/// Field name to value mapping that keeps header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn new() -> Self {
        Fields(Vec::new())
    }

    /// Insert a field, replacing the value of an existing field of the same
    /// name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One row of tabular data.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum Record {
    /// Row read with a header: cells keyed by header name
    Keyed(Fields),
    /// Row read without a header: raw cells in column order
    Positional(Vec<String>),
}

pub type Table = Vec<Record>;

fn effective_delimiter(delimiter: &str) -> &str {
    if delimiter.is_empty() {
        DEFAULT_DELIMITER
    } else {
        delimiter
    }
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Strip one pair of enclosing double quotes and collapse doubled quotes.
fn unquote(cell: &str) -> Cow<'_, str> {
    match cell
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => Cow::Owned(inner.replace("\"\"", "\"")),
        None => Cow::Borrowed(cell),
    }
}

fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Encode a JSON array of objects as delimited text.
///
/// The header is the key order of the first object. Every header cell and
/// value is double-quoted, with embedded quotes doubled. Rows are separated by
/// `\n` with no trailing newline.
pub fn encode_to_delimited(records: &Value, delimiter: &str) -> FormatResult<String> {
    let not_records = || FormatError::new("input must be a non-empty array of objects");

    let rows = match records {
        Value::Array(rows) if !rows.is_empty() => rows,
        _ => return Err(not_records()),
    };
    let objects = rows
        .iter()
        .map(Value::as_object)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(not_records)?;

    let delimiter = effective_delimiter(delimiter);
    let headers: Vec<&String> = objects[0].keys().collect();

    let mut lines = Vec::with_capacity(objects.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| quote(h))
            .collect::<Vec<_>>()
            .join(delimiter),
    );
    for object in &objects {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| quote(&stringify(object.get(h.as_str()))))
            .collect();
        lines.push(cells.join(delimiter));
    }

    Ok(lines.join("\n"))
}

/// Parse JSON text and encode it with [`encode_to_delimited`].
pub fn json_to_delimited(json_text: &str, delimiter: &str) -> FormatResult<String> {
    let json_text = json_text.trim();
    if json_text.is_empty() {
        return Err(FormatError::new("input is empty"));
    }
    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| FormatError::new(format!("invalid JSON: {}", e)))?;
    encode_to_delimited(&value, delimiter)
}

/// Decode delimited text into a table.
///
/// Blank lines are dropped. With `has_header`, the first remaining line names
/// the fields and every other line becomes a [`Record::Keyed`] with trimmed,
/// unquoted values (missing cells become empty strings). Without a header each line
/// becomes a [`Record::Positional`] holding the untrimmed cells.
pub fn decode_from_delimited(text: &str, delimiter: &str, has_header: bool) -> FormatResult<Table> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FormatError::new("input is empty"));
    }

    let delimiter = effective_delimiter(delimiter);
    let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());

    let Some(first) = lines.next() else {
        return Err(FormatError::new("no valid rows"));
    };

    if !has_header {
        let table = std::iter::once(first)
            .chain(lines)
            .map(|line| Record::Positional(line.split(delimiter).map(String::from).collect()))
            .collect();
        return Ok(table);
    }

    let headers: Vec<Cow<'_, str>> = first.split(delimiter).map(|h| unquote(h.trim())).collect();
    let table = lines
        .map(|line| {
            let cells: Vec<&str> = line.split(delimiter).collect();
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = cells.get(i).map(|c| unquote(c.trim())).unwrap_or_default();
                    (header.to_string(), value.into_owned())
                })
                .collect();
            Record::Keyed(fields)
        })
        .collect();

    Ok(table)
}

/// Render a table as JSON indented by two spaces.
pub fn table_to_json(table: &Table) -> FormatResult<String> {
    serde_json::to_string_pretty(table)
        .map_err(|e| FormatError::new(format!("failed to serialize table: {}", e)))
}

/// Decode delimited text and render the result with [`table_to_json`].
pub fn delimited_to_json(text: &str, delimiter: &str, has_header: bool) -> FormatResult<String> {
    let table = decode_from_delimited(text, delimiter, has_header)?;
    table_to_json(&table)
}
