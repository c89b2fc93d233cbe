//! In-memory stand-ins for the browser and the spreadsheet.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::request::{Browser, BrowserLauncher};
use crate::sheets::{parse_cell_label, Cell, CellRange, Spreadsheet, Worksheet};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct FakePage {
    pub url: String,
    pub html: String,
}

impl FakePage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

#[derive(Debug, Default)]
struct LauncherState {
    launched: usize,
    shut_down: usize,
    visited: Vec<String>,
}

/// Serves fixed pages by URL. Unknown URLs load as an empty page.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    pages: Arc<HashMap<String, String>>,
    state: Arc<Mutex<LauncherState>>,
}

impl FakeLauncher {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages: Arc::new(pages.into_iter().map(|p| (p.url, p.html)).collect()),
            state: Arc::default(),
        }
    }

    pub fn launched(&self) -> usize {
        self.state.lock().unwrap().launched
    }

    pub fn shut_down(&self) -> usize {
        self.state.lock().unwrap().shut_down
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Session = FakeBrowser;

    async fn launch(&self) -> Result<FakeBrowser> {
        self.state.lock().unwrap().launched += 1;
        Ok(FakeBrowser {
            launcher: self.clone(),
            current: String::new(),
        })
    }
}

pub struct FakeBrowser {
    launcher: FakeLauncher,
    current: String,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.launcher.state.lock().unwrap().visited.push(url.into());
        self.current = self.launcher.pages.get(url).cloned().unwrap_or_default();
        Ok(())
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool> {
        let selector =
            Selector::parse(selector).map_err(|_| Error::InvalidSelector(selector.into()))?;
        Ok(Html::parse_document(&self.current)
            .select(&selector)
            .next()
            .is_some())
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn shutdown(self) -> Result<()> {
        self.launcher.state.lock().unwrap().shut_down += 1;
        Ok(())
    }
}

/// A worksheet backed by a map of cells. Clones share the same cells.
#[derive(Debug, Clone)]
pub struct FakeWorksheet {
    title: String,
    cells: Arc<Mutex<HashMap<(u32, u32), String>>>,
    reads: Arc<Mutex<Vec<String>>>,
}

impl FakeWorksheet {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.into(),
            cells: Arc::default(),
            reads: Arc::default(),
        }
    }

    pub fn set(&self, row: u32, col: u32, value: impl Into<String>) {
        self.cells.lock().unwrap().insert((row, col), value.into());
    }

    pub fn get(&self, row: u32, col: u32) -> String {
        self.cells
            .lock()
            .unwrap()
            .get(&(row, col))
            .cloned()
            .unwrap_or_default()
    }

    /// Ranges passed to `read_range`, in call order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Worksheet for FakeWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn read_range(&self, range: &str) -> Result<Vec<Cell>> {
        let bounds: CellRange = range.parse()?;
        self.reads.lock().unwrap().push(range.into());
        Ok(bounds
            .coordinates()
            .map(|(row, col)| Cell::new(row, col, self.get(row, col)))
            .collect())
    }

    async fn write_cells(&self, cells: &[Cell]) -> Result<()> {
        for cell in cells {
            self.set(cell.row, cell.col, cell.value.as_str());
        }
        Ok(())
    }

    async fn write_single_cell(&self, label: &str, value: &str) -> Result<()> {
        let (row, col) = parse_cell_label(label)?;
        self.set(row, col, value);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeSpreadsheet {
    sheets: HashMap<String, FakeWorksheet>,
}

impl FakeSpreadsheet {
    pub fn with_sheets(titles: &[&str]) -> Self {
        Self {
            sheets: titles
                .iter()
                .map(|t| (t.to_string(), FakeWorksheet::new(t)))
                .collect(),
        }
    }

    pub fn sheet(&self, title: &str) -> FakeWorksheet {
        self.sheets[title].clone()
    }
}

#[async_trait]
impl Spreadsheet for FakeSpreadsheet {
    type Sheet = FakeWorksheet;

    async fn worksheet(&self, name: &str) -> Result<FakeWorksheet> {
        self.sheets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::WorksheetNotFound(name.into()))
    }
}
