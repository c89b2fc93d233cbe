use chrono::{DateTime, Local};

use crate::sheets::{Cell, CellRange, Worksheet};
use crate::{
    info_time, FlatQaList, QuestionAnswerPair, Result, DISPLAY_TIME_FORMAT, FIRST_DATA_ROW,
    HEADER_LABELS, LAST_UPDATED_CELL, WINDOW_ROWS,
};

/// Overwrites `A1:B{N+1}` with the header row followed by one pair per row, then
/// stamps the `last updated` cell.
///
/// Rows below the new pairs are left alone, so a shorter list leaves the old
/// tail in place.
pub async fn write_qna_pairs<W: Worksheet>(
    sheet: &W,
    pairs: &[QuestionAnswerPair],
    updated_at: DateTime<Local>,
) -> Result<()> {
    let mut cells = Vec::with_capacity((pairs.len() + 1) * 2);
    cells.push(Cell::new(1, 1, HEADER_LABELS[0]));
    cells.push(Cell::new(1, 2, HEADER_LABELS[1]));
    for (row, pair) in (FIRST_DATA_ROW..).zip(pairs) {
        cells.push(Cell::new(row, 1, pair.question.as_str()));
        cells.push(Cell::new(row, 2, pair.answer.as_str()));
    }

    sheet.write_cells(&cells).await?;
    sheet
        .write_single_cell(
            LAST_UPDATED_CELL,
            &format!("Last updated: {}", updated_at.format(DISPLAY_TIME_FORMAT)),
        )
        .await?;

    info_time!("Sent {} Q&As to `{}`", pairs.len(), sheet.title());
    Ok(())
}

/// Reads the question/answer columns of one worksheet without knowing its length,
/// `WINDOW_ROWS` rows per request.
///
/// A window whose last cell is filled is taken whole and the next window is
/// fetched. A window whose last cell is blank holds the end of the sheet: its
/// values are taken up to the first blank cell.
pub async fn read_qna_values<W: Worksheet>(sheet: &W) -> Result<Vec<String>> {
    let mut values = Vec::new();
    let mut top = FIRST_DATA_ROW;

    loop {
        let window = CellRange::new(top, 1, top + WINDOW_ROWS - 1, 2);
        info_time!("Reading `{}` rows {}-{}", sheet.title(), window.top, window.bottom);
        let batch = sheet.read_range(&window.to_string()).await?;

        let reached_end = batch.last().map_or(true, |cell| cell.value.is_empty());
        if reached_end {
            values.extend(
                batch
                    .into_iter()
                    .map(|cell| cell.value)
                    .take_while(|value| !value.is_empty()),
            );
            return Ok(values);
        }

        values.extend(batch.into_iter().map(|cell| cell.value));
        top = window.bottom + 1;
    }
}

/// Reads every worksheet in order into one flat question/answer list.
pub async fn read_flat_qna<W: Worksheet>(sheets: &[W]) -> Result<FlatQaList> {
    let mut values = Vec::new();
    for sheet in sheets {
        let sheet_values = read_qna_values(sheet).await?;
        info_time!("Got {} values from `{}`", sheet_values.len(), sheet.title());
        values.extend(sheet_values);
    }
    FlatQaList::try_from_values(values)
}
