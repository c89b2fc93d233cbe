use scraper::{ElementRef, Html, Selector};

use crate::markdown::{element_to_markdown, MarkdownOptions};
use crate::{Error, QuestionLinkPair, Result, ANSWER_CONTAINER_SELECTOR, INDEX_ENTRY_SELECTOR};

/// Markup quoted in extraction errors is cut to this many chars.
const SNIPPET_LEN: usize = 200;

/// Finds every question entry on the help center index page.
/// Returns one `QuestionLinkPair` per entry in document order, with the entry's
/// link appended to `base_url`.
pub fn extract_question_links(html: &str, base_url: &str) -> Result<Vec<QuestionLinkPair>> {
    let doc = Html::parse_document(html);

    let entry_selector = create_selector(INDEX_ENTRY_SELECTOR)?;
    let link_selector = create_selector("a[href]")?;

    doc.select(&entry_selector)
        .map(|entry| {
            let link = entry
                .select(&link_selector)
                .next()
                .ok_or_else(|| extraction_error("a question link", entry))?;

            let href = link.value().attr("href").unwrap_or_default().trim();
            let question = collapse_whitespace(&link.text().collect::<String>());
            if href.is_empty() || question.is_empty() {
                return Err(extraction_error("a question link", entry));
            }

            Ok(QuestionLinkPair::new(question, format!("{base_url}{href}")))
        })
        .collect()
}

/// Pulls the answer body out of a subpage and renders it as markdown.
/// Scripts and styles inside the container are left out.
pub fn extract_answer(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    let container_selector = create_selector(ANSWER_CONTAINER_SELECTOR)?;

    let container = doc
        .select(&container_selector)
        .next()
        .ok_or_else(|| Error::Extraction {
            reason: format!("the answer container `{ANSWER_CONTAINER_SELECTOR}`"),
            snippet: snippet(html),
        })?;

    Ok(element_to_markdown(container, &MarkdownOptions::default()))
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::InvalidSelector(sel_str.into()))
}

fn extraction_error(what: &str, el: ElementRef<'_>) -> Error {
    Error::Extraction {
        reason: what.into(),
        snippet: snippet(&el.html()),
    }
}

fn snippet(markup: &str) -> String {
    let mut cut: String = markup.chars().take(SNIPPET_LEN).collect();
    if markup.chars().count() > SNIPPET_LEN {
        cut.push_str("...");
    }
    cut
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
