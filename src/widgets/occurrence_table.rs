//! The occurrence table: the capped, sorted view plus a count line that
//! always reports the true match count.

use polars::prelude::*;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table, Widget};

use crate::occurrence;
use crate::query::DISPLAY_ROW_CAP;

use super::{ACCENT, TEXT_DIM, TEXT_PRIMARY};

const HEADERS: [&str; 6] = [
    "Identifier",
    "Accession",
    "Genus",
    "Epithet",
    "Year",
    "Remarks",
];

/// The line shown above the table. The count is the true number of matches;
/// the suffix appears only when the display cap truncated the view.
pub fn count_line(matched: usize, displayed: usize) -> String {
    let noun = if matched == 1 {
        "matching occurrence"
    } else {
        "matching occurrences"
    };
    if matched > displayed {
        format!("{} {} (showing first {})", matched, noun, DISPLAY_ROW_CAP)
    } else {
        format!("{} {}", matched, noun)
    }
}

/// Extract display strings from the capped frame, row-major. Every row has
/// one cell per expected column so the cells stay aligned with [`HEADERS`];
/// nulls and absent columns render as empty cells.
pub fn rows_from(df: &DataFrame) -> Vec<Vec<String>> {
    let columns: Vec<Option<Series>> = occurrence::COLUMNS
        .iter()
        .map(|name| {
            df.column(name)
                .ok()
                .map(|c| c.as_materialized_series().clone())
        })
        .collect();

    (0..df.height())
        .map(|i| {
            columns
                .iter()
                .map(|series| match series.as_ref().map(|s| s.get(i)) {
                    Some(Ok(AnyValue::Null)) | Some(Err(_)) | None => String::new(),
                    Some(Ok(v)) => v.str_value().to_string(),
                })
                .collect()
        })
        .collect()
}

/// Render the count line and the table into `area`.
pub fn render(area: Rect, buf: &mut Buffer, df: &DataFrame, matched: usize) {
    let title = count_line(matched, df.height());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title);

    let header = Row::new(HEADERS.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let rows = rows_from(df).into_iter().map(|cells| {
        Row::new(
            cells
                .into_iter()
                .map(|c| Cell::from(c).style(Style::default().fg(TEXT_PRIMARY))),
        )
    });

    let widths = [
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(6),
        Constraint::Min(10),
    ];

    Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1)
        .style(Style::default().fg(TEXT_DIM))
        .render(area, buf);
}
