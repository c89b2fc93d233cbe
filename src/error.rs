use std::time::Duration;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    InvalidSelector(String),
    #[error("Couldn't extract {reason}. Offending markup: {snippet}")]
    Extraction { reason: String, snippet: String },

    #[error("Timed out after {} sec waiting for `{selector}` to appear", .timeout.as_secs())]
    AcquisitionTimeout { selector: String, timeout: Duration },

    #[error("Found {count} Q&A values, expected an even number! An unanswered question or orphaned answer exists in the spreadsheet.")]
    Integrity { count: usize },

    #[error("WebDriver Error (HTTP {status}): {message}")]
    WebDriver { status: u16, message: String },
    #[error("Sheets API Error (HTTP {status}): {message}")]
    SheetsApi { status: u16, message: String },
    #[error("Worksheet `{0}` doesn't exist in the spreadsheet.")]
    WorksheetNotFound(String),
    #[error("Invalid cell reference: {0}")]
    InvalidCellReference(String),
    #[error("Endpoint can't take path segments: {0}")]
    InvalidEndpoint(String),

    #[error("Config Error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Url Error: {0}")]
    Url(#[from] url::ParseError),
}
