//! In-terminal visualizations: the word cloud and the top-N bar chart.
//!
//! Both take a [`FrequencyTable`] computed over the filtered view. The cloud
//! shows every distinct value with frequency mapped to text emphasis; the bar
//! chart shows the top entries ranked by count.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Paragraph, Widget, Wrap};

use crate::frequency::FrequencyTable;

use super::{ACCENT, TEXT_DIM, TEXT_PRIMARY};

/// Emphasis bucket for a cloud word, from its count relative to the table
/// maximum. A cell grid has no font sizes, so frequency maps to style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudTier {
    Faint,
    Normal,
    Strong,
    Dominant,
}

impl CloudTier {
    pub fn for_count(count: u32, max_count: u32) -> Self {
        if max_count == 0 {
            return Self::Faint;
        }
        let ratio = count as f64 / max_count as f64;
        if ratio >= 0.75 {
            Self::Dominant
        } else if ratio >= 0.5 {
            Self::Strong
        } else if ratio >= 0.25 {
            Self::Normal
        } else {
            Self::Faint
        }
    }

    fn style(self) -> Style {
        match self {
            Self::Faint => Style::default().fg(TEXT_DIM),
            Self::Normal => Style::default().fg(TEXT_PRIMARY),
            Self::Strong => Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
            Self::Dominant => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        }
    }
}

fn empty_placeholder(area: Rect, buf: &mut Buffer, block: Block) {
    Paragraph::new("No matching occurrences to visualize")
        .style(Style::default().fg(TEXT_DIM))
        .block(block)
        .centered()
        .render(area, buf);
}

/// Render the word cloud: every entry, table (first-seen) order, wrapped to
/// the panel width.
pub fn render_word_cloud(area: Rect, buf: &mut Buffer, table: &FrequencyTable, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title.to_string());
    if table.is_empty() {
        empty_placeholder(area, buf, block);
        return;
    }

    let max = table.max_count();
    let mut spans: Vec<Span> = Vec::with_capacity(table.len() * 2);
    for (i, entry) in table.entries().iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let tier = CloudTier::for_count(entry.count, max);
        spans.push(Span::styled(entry.value.clone(), tier.style()));
    }

    Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .block(block)
        .render(area, buf);
}

/// Render the bar chart over the (already top-N-truncated) table.
pub fn render_bar_chart(area: Rect, buf: &mut Buffer, table: &FrequencyTable, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title.to_string());
    if table.is_empty() {
        empty_placeholder(area, buf, block);
        return;
    }

    let bars: Vec<Bar> = table
        .entries()
        .iter()
        .map(|entry| {
            Bar::default()
                .value(u64::from(entry.count))
                .label(Line::from(entry.value.clone()))
                .style(Style::default().fg(ACCENT))
                .value_style(Style::default().fg(TEXT_PRIMARY))
        })
        .collect();

    BarChart::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .bar_gap(0)
        .bar_width(1)
        .data(BarGroup::default().bars(&bars))
        .block(block)
        .render(area, buf);
}
