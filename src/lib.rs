//! Help center Q&A helper.
//!
//! Scrapes every question/answer pair from the help center into a Google
//! Sheets worksheet, and compiles the worksheets back into a flat text
//! document that can be dropped onto a chatbot dashboard.

use std::time::Duration;

mod macros;

pub mod config;
mod error;
pub mod export;
pub mod markdown;
pub mod parse;
pub mod process;
pub mod qna;
pub mod request;
pub mod sheet_io;
pub mod sheets;
#[cfg(test)]
mod testing;

pub use crate::config::{PacingMode, Settings};
pub use error::{Error, Result};
pub use qna::{FlatQaList, QuestionAnswerPair, QuestionLinkPair};

/// Element that marks a loaded help center index page.
pub const INDEX_WAIT_SELECTOR: &str = ".collections-list-item";
/// One entry per question on the index page.
pub const INDEX_ENTRY_SELECTOR: &str = "li.collections-list-item";
/// Container holding the answer body on a subpage.
pub const ANSWER_CONTAINER_SELECTOR: &str = "div.content-wrap";
pub const ANSWER_WAIT_SELECTOR: &str = ".content-wrap";
/// How long a page gets to present the element we wait for.
pub const ELEMENT_WAIT_TIMEOUT: Duration = Duration::from_secs(20);
pub const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const SCRAPED_WORKSHEET: &str = "Scraped from Helpcenter";
pub const MANUAL_WORKSHEET: &str = "Manual Entries";
/// Worksheets compiled into an export, in this order.
pub const EXPORT_WORKSHEETS: [&str; 2] = [SCRAPED_WORKSHEET, MANUAL_WORKSHEET];
pub const HEADER_LABELS: [&str; 2] = ["Question", "Answer"];
/// Row 1 is the header, data starts below it.
pub const FIRST_DATA_ROW: u32 = 2;
/// Rows fetched per window while reading a worksheet back.
pub const WINDOW_ROWS: u32 = 100;
pub const LAST_UPDATED_CELL: &str = "D1";

/// Human readable timestamp used in the sheet stamp and export filename.
pub(crate) const DISPLAY_TIME_FORMAT: &str = "%A %b %d, %Y, %I:%M%p";
