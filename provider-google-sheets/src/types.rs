//! Google Sheets API response types and the sheet record model

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// spreadsheets.get response (only `sheets.properties`)
///
/// See: https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetMetadata {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

impl SpreadsheetMetadata {
    /// The worksheet shown first in the spreadsheet.
    pub fn first_sheet(&self) -> Option<&SheetProperties> {
        self.sheets
            .iter()
            .map(|sheet| &sheet.properties)
            .min_by_key(|properties| properties.index)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

/// spreadsheets.values.get response
///
/// See: https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    /// Rows of cells; trailing empty rows and cells are omitted by the API
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    /// Rows with every cell rendered as text.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect()
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One data row keyed by the header row, in column order
///
/// Serializes as a JSON object whose keys follow the sheet's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRecord {
    fields: Vec<(String, String)>,
}

impl SheetRecord {
    /// Pair `row` with `headers`. Missing cells become empty strings and
    /// cells past the last header are dropped.
    pub fn from_row(headers: &[String], row: &[String]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    /// The last non-blank data row below the header row, if any.
    pub fn latest(rows: &[Vec<String>]) -> Option<Self> {
        let (headers, data) = rows.split_first()?;
        data.iter()
            .rev()
            .find(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| Self::from_row(headers, row))
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for SheetRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
