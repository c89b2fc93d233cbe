use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::{fs, io::AsyncWriteExt};

use crate::{info_time, FlatQaList, QuestionAnswerPair, Result};

/// Same as the sheet stamp, but with `;` since `:` isn't allowed in every filesystem.
const FILENAME_TIME_FORMAT: &str = "%A %b %d, %Y, %I;%M%p";
const DUMP_DIVIDER: &str = "-------------------------------";

/// Checks the container signal, e.g. `PCH_IN_CONTAINER=1`.
pub fn running_in_container(env_var: &str) -> bool {
    is_truthy(std::env::var(env_var).ok().as_deref())
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

/// Containers write to their fixed directory, everything else to the working directory.
pub fn export_dir(in_container: bool, container_dir: &Path) -> PathBuf {
    if in_container {
        container_dir.to_path_buf()
    } else {
        PathBuf::from(".")
    }
}

pub fn export_file_name(at: DateTime<Local>) -> String {
    format!(
        "All entries from Google Sheet at {}.txt",
        at.format(FILENAME_TIME_FORMAT)
    )
}

/// Questions become `# ` headings, answers follow as body text with a blank line after.
pub fn render_export(list: &FlatQaList) -> String {
    let mut doc = String::new();
    for (question, answer) in list.pairs() {
        doc.push_str("# ");
        doc.push_str(question.trim());
        doc.push('\n');
        doc.push_str(answer.trim_end());
        doc.push_str("\n\n");
    }
    doc
}

/// Writes the export into `dir`, creating it if needed. Returns the file written.
///
/// The name only carries the time down to the minute, so a second export in the
/// same minute replaces the first.
pub async fn write_export(list: &FlatQaList, dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(export_file_name(at));

    let mut file = fs::File::create(&path).await?;
    file.write_all(render_export(list).as_bytes()).await?;
    file.flush().await?;

    info_time!("Wrote {} Q&As to {}", list.len() / 2, path.display());
    Ok(path)
}

/// Numbered listing of freshly scraped pairs, for eyeballing a run.
pub fn render_scrape_dump(pairs: &[QuestionAnswerPair]) -> String {
    let mut dump = String::new();
    for (i, pair) in pairs.iter().enumerate() {
        dump.push_str(&format!(
            "{DUMP_DIVIDER}\n{}. {}\n{DUMP_DIVIDER}\n{}",
            i + 1,
            pair.question,
            pair.answer
        ));
        if !pair.answer.ends_with('\n') {
            dump.push('\n');
        }
    }
    dump
}

pub async fn write_scrape_dump(pairs: &[QuestionAnswerPair], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, render_scrape_dump(pairs)).await?;
    info_time!("Dumped {} scraped Q&As to {}", pairs.len(), path.display());
    Ok(())
}
