//! Visualization export to PNG (plotters bitmap backend).
//!
//! Both exporters consume a [`FrequencyTable`]: the bar chart takes the
//! top-N truncation, the word cloud takes the full table. Export is one-shot
//! and isolated from the live view; an empty table is an export error, not a
//! pipeline error.

use chrono::NaiveDate;
use color_eyre::Result;
use std::path::Path;

use crate::frequency::FrequencyTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizKind {
    WordCloud,
    BarChart,
}

impl VizKind {
    pub const ALL: [Self; 2] = [Self::WordCloud, Self::BarChart];

    pub fn label(self) -> &'static str {
        match self {
            Self::WordCloud => "Word cloud",
            Self::BarChart => "Bar chart",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::WordCloud => "word-cloud",
            Self::BarChart => "bar-chart",
        }
    }
}

/// Deterministic export filename from the visualization kind and a date.
pub fn export_filename(kind: VizKind, date: NaiveDate) -> String {
    format!("{}-{}.png", kind.slug(), date.format("%Y-%m-%d"))
}

const EXPORT_WIDTH: u32 = 900;
const EXPORT_HEIGHT: u32 = 600;
const MIN_FONT: f64 = 14.0;
const MAX_FONT: f64 = 52.0;

/// Font size for a word with `count` occurrences, scaled against the table
/// maximum. Linear between [`MIN_FONT`] and [`MAX_FONT`].
fn font_size_for(count: u32, max_count: u32) -> f64 {
    if max_count <= 1 {
        return MIN_FONT;
    }
    let ratio = (count.saturating_sub(1)) as f64 / (max_count - 1) as f64;
    MIN_FONT + ratio * (MAX_FONT - MIN_FONT)
}

/// One positioned word in the cloud layout.
#[derive(Debug, Clone, PartialEq)]
struct PlacedWord {
    text: String,
    x: f64,
    y: f64,
    font_size: f64,
}

/// Lay the words out in rows, left to right, wrapping at `width`. The layout
/// is deterministic: table order in, reading order out.
fn layout_cloud(table: &FrequencyTable, width: f64) -> Vec<PlacedWord> {
    const MARGIN: f64 = 20.0;
    const GAP: f64 = 14.0;
    // crude but stable glyph-width estimate; plotters measures nothing for us here
    const CHAR_ASPECT: f64 = 0.6;

    let max_count = table.max_count();
    let mut placed = Vec::with_capacity(table.len());
    let mut x = MARGIN;
    let mut y = MARGIN;
    let mut row_height: f64 = 0.0;

    for entry in table.entries() {
        let size = font_size_for(entry.count, max_count);
        let word_width = entry.value.chars().count() as f64 * size * CHAR_ASPECT;
        if x + word_width > width - MARGIN && x > MARGIN {
            x = MARGIN;
            y += row_height + GAP;
            row_height = 0.0;
        }
        placed.push(PlacedWord {
            text: entry.value.clone(),
            x,
            y,
            font_size: size,
        });
        x += word_width + GAP;
        row_height = row_height.max(size);
    }
    placed
}

/// Write the word cloud to a PNG. Word size is proportional to frequency.
pub fn write_word_cloud_png(path: &Path, table: &FrequencyTable) -> Result<()> {
    use plotters::prelude::*;

    if table.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }

    let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let palette = [
        RGBColor(0, 114, 178),
        RGBColor(213, 94, 0),
        RGBColor(0, 158, 115),
        RGBColor(204, 121, 167),
        RGBColor(230, 159, 0),
    ];

    for (idx, word) in layout_cloud(table, EXPORT_WIDTH as f64).iter().enumerate() {
        let color = palette[idx % palette.len()];
        root.draw(&Text::new(
            word.text.clone(),
            (word.x as i32, word.y as i32),
            ("sans-serif", word.font_size).into_font().color(&color),
        ))?;
    }

    root.present()?;
    Ok(())
}

/// Write the bar chart to a PNG: a horizontal ranking, highest count on top,
/// value labels on the left and counts at the bar ends.
pub fn write_bar_chart_png(path: &Path, table: &FrequencyTable, column_label: &str) -> Result<()> {
    use plotters::prelude::*;

    if table.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }

    let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = table.len();
    let x_max = table.max_count() as f64 * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(0.0..x_max, 0.0..n as f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_desc(format!("Occurrences by {}", column_label))
        .draw()?;

    let bar_color = RGBColor(0, 114, 178);
    // row 0 (highest count) at the top of the axis
    chart.draw_series(table.entries().iter().enumerate().map(|(i, entry)| {
        let y0 = (n - 1 - i) as f64 + 0.15;
        let y1 = (n - i) as f64 - 0.15;
        Rectangle::new([(0.0, y0), (entry.count as f64, y1)], bar_color.filled())
    }))?;

    chart.draw_series(table.entries().iter().enumerate().map(|(i, entry)| {
        let y = (n - i) as f64 - 0.5;
        Text::new(
            format!("{} ({})", entry.value, entry.count),
            (entry.count as f64, y),
            ("sans-serif", 16).into_font().color(&BLACK),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Dispatch to the exporter for `kind`.
pub fn write_visualization(
    path: &Path,
    kind: VizKind,
    table: &FrequencyTable,
    column_label: &str,
) -> Result<()> {
    match kind {
        VizKind::WordCloud => write_word_cloud_png(path, table),
        VizKind::BarChart => write_bar_chart_png(path, table, column_label),
    }
}
