//! Spreadsheet access: the worksheet traits the rest of the crate reads and
//! writes through, A1 cell notation, and the Google Sheets v4 REST client.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::request::join_segments;
use crate::{info_time, Error, Result};

/// One cell, 1-based, column 1 is `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: String,
}

impl Cell {
    pub fn new(row: u32, col: u32, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }

    pub fn label(&self) -> String {
        cell_label(self.row, self.col)
    }
}

#[async_trait]
pub trait Spreadsheet: Send + Sync {
    type Sheet: Worksheet;

    async fn worksheet(&self, name: &str) -> Result<Self::Sheet>;
}

#[async_trait]
pub trait Worksheet: Send + Sync {
    fn title(&self) -> &str;

    /// Every cell of the A1 `range` (e.g. `A2:B101`) in row-major order.
    /// Blank cells come back with an empty value.
    async fn read_range(&self, range: &str) -> Result<Vec<Cell>>;

    async fn write_cells(&self, cells: &[Cell]) -> Result<()>;

    /// Writes `value` into the cell at A1 `label` (e.g. `D1`).
    async fn write_single_cell(&self, label: &str, value: &str) -> Result<()>;
}

/// A rectangular block of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl CellRange {
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn rows(&self) -> u32 {
        self.bottom - self.top + 1
    }

    pub fn cols(&self) -> u32 {
        self.right - self.left + 1
    }

    /// `(row, col)` of every cell, row by row.
    pub fn coordinates(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.top..=self.bottom).flat_map(move |row| (self.left..=self.right).map(move |col| (row, col)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_label(self.top, self.left),
            cell_label(self.bottom, self.right)
        )
    }
}

impl FromStr for CellRange {
    type Err = Error;

    /// Accepts `A2:B101` or a single cell like `D1`.
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s.split_once(':').unwrap_or((s, s));
        let (top, left) = parse_cell_label(start)?;
        let (bottom, right) = parse_cell_label(end)?;
        if bottom < top || right < left {
            return Err(Error::InvalidCellReference(s.into()));
        }
        Ok(Self::new(top, left, bottom, right))
    }
}

/// `1 -> A`, `26 -> Z`, `27 -> AA`.
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

pub fn cell_label(row: u32, col: u32) -> String {
    format!("{}{row}", column_letters(col))
}

/// `B101 -> (101, 2)`.
pub fn parse_cell_label(label: &str) -> Result<(u32, u32)> {
    let invalid = || Error::InvalidCellReference(label.into());
    let label = label.trim();
    let split = label
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = label.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let col = letters
        .chars()
        .try_fold(0u32, |acc, c| {
            acc.checked_mul(26)?
                .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
        })
        .ok_or_else(invalid)?;
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }
    Ok((row, col))
}

/// Entry point to the Google Sheets v4 REST API.
#[derive(Clone)]
pub struct GoogleSheets {
    client: Client,
    api_base: Url,
    token: String,
}

impl GoogleSheets {
    /// `api_base` is the spreadsheets collection, e.g. `https://sheets.googleapis.com/v4/spreadsheets`.
    pub fn new(api_base: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_base: Url::parse(api_base)?,
            token: token.into(),
        })
    }

    pub fn open(&self, spreadsheet_id: &str) -> GoogleSpreadsheet {
        GoogleSpreadsheet {
            api: self.clone(),
            id: spreadsheet_id.into(),
        }
    }
}

impl fmt::Debug for GoogleSheets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSheets")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct GoogleSpreadsheet {
    api: GoogleSheets,
    id: String,
}

impl GoogleSpreadsheet {
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut all = vec![self.id.as_str()];
        all.extend_from_slice(segments);
        join_segments(&self.api.api_base, &all)
    }
}

#[async_trait]
impl Spreadsheet for GoogleSpreadsheet {
    type Sheet = GoogleWorksheet;

    async fn worksheet(&self, name: &str) -> Result<GoogleWorksheet> {
        let mut url = self.endpoint(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let res = self
            .api
            .client
            .get(url)
            .bearer_auth(&self.api.token)
            .send()
            .await?;
        let meta: SpreadsheetMeta = check(res).await?.json().await?;

        if meta.sheets.iter().any(|s| s.properties.title == name) {
            Ok(GoogleWorksheet {
                spreadsheet: self.clone(),
                title: name.into(),
            })
        } else {
            Err(Error::WorksheetNotFound(name.into()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleWorksheet {
    spreadsheet: GoogleSpreadsheet,
    title: String,
}

impl GoogleWorksheet {
    /// `'Sheet Name'!A1:B2`, quotes in the title doubled.
    fn qualified(&self, range: &str) -> String {
        format!("'{}'!{range}", self.title.replace('\'', "''"))
    }

    fn api(&self) -> &GoogleSheets {
        &self.spreadsheet.api
    }
}

#[async_trait]
impl Worksheet for GoogleWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn read_range(&self, range: &str) -> Result<Vec<Cell>> {
        let bounds: CellRange = range.parse()?;
        let qualified = self.qualified(range);
        let mut url = self.spreadsheet.endpoint(&["values", qualified.as_str()])?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");

        let res = self
            .api()
            .client
            .get(url)
            .bearer_auth(&self.api().token)
            .send()
            .await?;
        let values: ValueRange = check(res).await?.json().await?;

        Ok(expand_to_grid(&bounds, &values.values))
    }

    async fn write_cells(&self, cells: &[Cell]) -> Result<()> {
        let url = self.spreadsheet.endpoint(&["values:batchUpdate"])?;
        let body = BatchUpdate {
            value_input_option: "RAW",
            data: cells
                .iter()
                .map(|cell| ValueRangeUpdate {
                    range: self.qualified(&cell.label()),
                    values: vec![vec![cell.value.clone()]],
                })
                .collect(),
        };

        let res = self
            .api()
            .client
            .post(url)
            .bearer_auth(&self.api().token)
            .json(&body)
            .send()
            .await?;
        check(res).await?;
        info_time!("Wrote {} cells to `{}`", cells.len(), self.title);
        Ok(())
    }

    async fn write_single_cell(&self, label: &str, value: &str) -> Result<()> {
        parse_cell_label(label)?;
        let qualified = self.qualified(label);
        let mut url = self.spreadsheet.endpoint(&["values", qualified.as_str()])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueRangeUpdate {
            range: qualified,
            values: vec![vec![value.to_string()]],
        };
        let res = self
            .api()
            .client
            .put(url)
            .bearer_auth(&self.api().token)
            .json(&body)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// The API leaves out trailing blank rows and trailing blank cells of a row.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct ValueRangeUpdate {
    range: String,
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdate {
    value_input_option: &'static str,
    data: Vec<ValueRangeUpdate>,
}

/// Pads the ragged rows the API returns out to every cell of `bounds`.
fn expand_to_grid(bounds: &CellRange, rows: &[Vec<Value>]) -> Vec<Cell> {
    bounds
        .coordinates()
        .map(|(row, col)| {
            let value = rows
                .get((row - bounds.top) as usize)
                .and_then(|r| r.get((col - bounds.left) as usize))
                .map(cell_text)
                .unwrap_or_default();
            Cell::new(row, col, value)
        })
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turns non-2xx responses into `SheetsApi` errors.
async fn check(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(Error::SheetsApi {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

/// Google wraps errors as `{"error": {"message": ...}}`; fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn column_letters_roll_over_after_z() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(2), "B");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn labels_parse_back_to_coordinates() {
        assert_eq!(parse_cell_label("A1").unwrap(), (1, 1));
        assert_eq!(parse_cell_label("b101").unwrap(), (101, 2));
        assert_eq!(parse_cell_label("AA7").unwrap(), (7, 27));
        assert!(parse_cell_label("7A").is_err());
        assert!(parse_cell_label("A0").is_err());
        assert!(parse_cell_label("AB").is_err());
    }

    #[test]
    fn ranges_display_and_parse() {
        let range = CellRange::new(2, 1, 101, 2);
        assert_eq!(range.to_string(), "A2:B101");
        assert_eq!("A2:B101".parse::<CellRange>().unwrap(), range);
        assert_eq!("D1".parse::<CellRange>().unwrap(), CellRange::new(1, 4, 1, 4));
        assert!("B5:A1".parse::<CellRange>().is_err());
        assert_eq!(range.rows(), 100);
        assert_eq!(range.cols(), 2);
    }

    #[test]
    fn ragged_api_rows_are_padded_row_major() {
        let bounds = CellRange::new(2, 1, 4, 2);
        let rows = vec![vec![json!("q1"), json!("a1")], vec![json!("q2")]];
        let cells = expand_to_grid(&bounds, &rows);

        let values: Vec<_> = cells.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["q1", "a1", "q2", "", "", ""]);
        assert_eq!(cells[3], Cell::new(3, 2, ""));
        assert_eq!(cells[5].label(), "B4");
    }

    #[test]
    fn numbers_come_back_as_text() {
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&json!(null)), "");
    }

    #[test]
    fn api_errors_are_reduced_to_their_message() {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(api_error_message(body), "The caller does not have permission");
        assert_eq!(api_error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn worksheet_titles_are_quoted_in_ranges() {
        let api = GoogleSheets::new("https://sheets.googleapis.com/v4/spreadsheets", "t").unwrap();
        let sheet = GoogleWorksheet {
            spreadsheet: api.open("abc"),
            title: "Bob's Entries".into(),
        };
        assert_eq!(sheet.qualified("A2:B101"), "'Bob''s Entries'!A2:B101");

        let url = sheet.spreadsheet.endpoint(&["values", sheet.qualified("D1").as_str()]).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc/values/"));
    }
}
