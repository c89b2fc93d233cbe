use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use rand::Rng;
use tokio::task::spawn_blocking;

use crate::export::{export_dir, running_in_container, write_export, write_scrape_dump};
use crate::parse::{extract_answer, extract_question_links};
use crate::request::{acquire_page_source, BrowserLauncher};
use crate::sheet_io::{read_flat_qna, write_qna_pairs};
use crate::sheets::Spreadsheet;
use crate::{
    info_time, warn_time, PacingMode, QuestionAnswerPair, Result, Settings, ANSWER_WAIT_SELECTOR,
    EXPORT_WORKSHEETS, INDEX_WAIT_SELECTOR, SCRAPED_WORKSHEET,
};

/// Random delay before each subpage request, to stay under the site's rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn next_delay(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        tokio::time::sleep(delay).await;
    }
}

impl From<PacingMode> for Pacing {
    fn from(mode: PacingMode) -> Self {
        let (min, max) = mode.delay_range();
        Self::new(min, max)
    }
}

/// Scrapes every question on the help center index and the answer on its subpage.
/// One attempt per page: the first failure aborts the whole run.
pub async fn scrape_helpcenter<L: BrowserLauncher>(
    launcher: &L,
    settings: &Settings,
    pacing: Pacing,
) -> Result<Vec<QuestionAnswerPair>> {
    let start_time = Local::now();
    info_time!("Loading the help center");

    let index_html =
        acquire_page_source(launcher, &settings.helpcenter_url, INDEX_WAIT_SELECTOR).await?;
    let base_url = settings.article_base_url.clone();
    let links =
        spawn_blocking(move || extract_question_links(&index_html, &base_url)).await??;

    info_time!("{} Q&A links found:", links.len());
    for (i, link) in links.iter().enumerate() {
        println!("\t{}. {}", i + 1, link.question);
    }

    let total = links.len();
    let mut pairs = Vec::with_capacity(total);
    for (i, link) in links.into_iter().enumerate() {
        pacing.pause().await;
        info_time!("Parsing subpage {}/{}", i + 1, total);

        let html = acquire_page_source(launcher, &link.url, ANSWER_WAIT_SELECTOR).await?;
        let answer = spawn_blocking(move || extract_answer(&html)).await??;
        pairs.push(link.answered(answer));
    }

    info_time!(start_time, "Scraped {} Q&As.", pairs.len());
    Ok(pairs)
}

/// Menu option 1: scrape the help center and overwrite the scraped worksheet with it.
pub async fn update_sheets_with_qnas<L, S>(
    launcher: &L,
    spreadsheet: &S,
    settings: &Settings,
) -> Result<Vec<QuestionAnswerPair>>
where
    L: BrowserLauncher,
    S: Spreadsheet,
{
    // Fail on a missing worksheet before spending minutes scraping.
    let sheet = spreadsheet.worksheet(SCRAPED_WORKSHEET).await?;

    let pairs = scrape_helpcenter(launcher, settings, settings.pacing.into()).await?;
    if let Some(dump_path) = &settings.scrape_dump {
        write_scrape_dump(&pairs, dump_path).await?;
    }

    write_qna_pairs(&sheet, &pairs, Local::now()).await?;
    Ok(pairs)
}

/// Menu option 2: read every worksheet back and compile them into a text file.
pub async fn download_qnas_from_sheets<S: Spreadsheet>(
    spreadsheet: &S,
    settings: &Settings,
) -> Result<PathBuf> {
    let dir = export_dir(
        running_in_container(&settings.container_env_var),
        &settings.container_export_dir,
    );
    export_worksheets(spreadsheet, &dir).await
}

/// Reads the export worksheets in order and writes them as one file under `dir`.
pub async fn export_worksheets<S: Spreadsheet>(spreadsheet: &S, dir: &Path) -> Result<PathBuf> {
    let mut sheets = Vec::with_capacity(EXPORT_WORKSHEETS.len());
    for name in EXPORT_WORKSHEETS {
        sheets.push(spreadsheet.worksheet(name).await?);
    }

    let list = read_flat_qna(&sheets).await?;
    if list.is_empty() {
        warn_time!("No Q&As found in {:?}, the export will be empty", EXPORT_WORKSHEETS);
    }
    write_export(&list, dir, Local::now()).await
}
