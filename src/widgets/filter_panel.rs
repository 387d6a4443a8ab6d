//! Filter & Sort sidebar: text inputs for the substring and year filters,
//! selectors for sort and visualization, and the Apply/Clear/Export footer.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Widget};

use crate::chart_export::VizKind;
use crate::frequency::VizColumn;
use crate::query::{FilterSpec, SortSpec, YearRange};

use super::{BORDER, BORDER_ACTIVE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelFocus {
    #[default]
    Identifier,
    Genus,
    YearMin,
    YearMax,
    SortColumn,
    SortDirection,
    VizKind,
    VizColumn,
    Apply,
    Clear,
    Export,
}

impl PanelFocus {
    const ORDER: [Self; 11] = [
        Self::Identifier,
        Self::Genus,
        Self::YearMin,
        Self::YearMax,
        Self::SortColumn,
        Self::SortDirection,
        Self::VizKind,
        Self::VizColumn,
        Self::Apply,
        Self::Clear,
        Self::Export,
    ];

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::Genus | Self::YearMin | Self::YearMax
        )
    }
}

/// What the panel asks the app to do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    None,
    /// Re-read the inputs and apply filter + sort.
    Apply,
    /// Reset every input to its default and apply.
    Clear,
    /// Export the active visualization.
    Export,
    /// Sort selector changed; re-sort without touching the filter inputs.
    SortChanged,
    /// Visualization selector changed.
    VizChanged,
}

pub struct FilterPanel {
    pub identifier: String,
    pub genus: String,
    pub year_min: String,
    pub year_max: String,
    pub sort: SortSpec,
    pub viz_kind: VizKind,
    pub viz_column: VizColumn,
    pub focus: PanelFocus,
    full_domain: YearRange,
}

impl FilterPanel {
    pub fn new(full_domain: YearRange) -> Self {
        Self {
            identifier: String::new(),
            genus: String::new(),
            year_min: full_domain.min().to_string(),
            year_max: full_domain.max().to_string(),
            sort: SortSpec::default(),
            viz_kind: VizKind::WordCloud,
            viz_column: VizColumn::default(),
            focus: PanelFocus::default(),
            full_domain,
        }
    }

    pub fn full_domain(&self) -> YearRange {
        self.full_domain
    }

    /// Reset all inputs to the unconstrained defaults.
    pub fn clear(&mut self) {
        let full_domain = self.full_domain;
        *self = Self::new(full_domain);
    }

    /// Build the FilterSpec from the current inputs. Unparsable or inverted
    /// year bounds are an error, surfaced in the notice line.
    pub fn filter_spec(&self) -> color_eyre::Result<FilterSpec> {
        let min: i32 = self
            .year_min
            .trim()
            .parse()
            .map_err(|_| color_eyre::eyre::eyre!("'{}' is not a year", self.year_min))?;
        let max: i32 = self
            .year_max
            .trim()
            .parse()
            .map_err(|_| color_eyre::eyre::eyre!("'{}' is not a year", self.year_max))?;
        Ok(FilterSpec {
            identifier: self.identifier.clone(),
            genus: self.genus.clone(),
            years: YearRange::new(min, max)?,
        })
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PanelAction {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.next();
                PanelAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.prev();
                PanelAction::None
            }
            KeyCode::Enter => match self.focus {
                PanelFocus::Clear => {
                    self.clear();
                    PanelAction::Clear
                }
                PanelFocus::Export => PanelAction::Export,
                _ => PanelAction::Apply,
            },
            KeyCode::Char(c) if self.focus.is_text() => {
                self.text_mut().push(c);
                PanelAction::None
            }
            KeyCode::Backspace if self.focus.is_text() => {
                self.text_mut().pop();
                PanelAction::None
            }
            KeyCode::Left | KeyCode::Right => self.cycle_selector(key.code == KeyCode::Right),
            _ => PanelAction::None,
        }
    }

    fn text_mut(&mut self) -> &mut String {
        match self.focus {
            PanelFocus::Identifier => &mut self.identifier,
            PanelFocus::Genus => &mut self.genus,
            PanelFocus::YearMin => &mut self.year_min,
            _ => &mut self.year_max,
        }
    }

    fn cycle_selector(&mut self, forward: bool) -> PanelAction {
        match self.focus {
            PanelFocus::SortColumn => {
                self.sort.column = if forward {
                    self.sort.column.next()
                } else {
                    self.sort.column.prev()
                };
                PanelAction::SortChanged
            }
            PanelFocus::SortDirection => {
                self.sort.direction = self.sort.direction.toggled();
                PanelAction::SortChanged
            }
            PanelFocus::VizKind => {
                self.viz_kind = match self.viz_kind {
                    VizKind::WordCloud => VizKind::BarChart,
                    VizKind::BarChart => VizKind::WordCloud,
                };
                PanelAction::VizChanged
            }
            PanelFocus::VizColumn => {
                self.viz_column = self.viz_column.next();
                PanelAction::VizChanged
            }
            _ => PanelAction::None,
        }
    }
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(BORDER_ACTIVE)
    } else {
        Style::default().fg(BORDER)
    }
}

fn render_field(area: Rect, buf: &mut Buffer, title: &str, value: &str, focused: bool) {
    let mut text_style = Style::default();
    if focused {
        text_style = text_style.add_modifier(Modifier::BOLD);
    }
    Paragraph::new(value)
        .style(text_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title)
                .border_style(field_style(focused)),
        )
        .render(area, buf);
}

fn render_button(area: Rect, buf: &mut Buffer, label: &str, focused: bool) {
    Paragraph::new(label)
        .style(field_style(focused))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(field_style(focused)),
        )
        .centered()
        .render(area, buf);
}

/// Render the sidebar into the given area.
pub fn render(area: Rect, buf: &mut Buffer, panel: &FilterPanel) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title("Filter & Sort");
    let inner = block.inner(area);
    block.render(area, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // identifier
            Constraint::Length(3), // genus
            Constraint::Length(3), // year range
            Constraint::Length(3), // sort
            Constraint::Length(3), // visualization
            Constraint::Min(0),
            Constraint::Length(3), // footer
        ])
        .split(inner);

    render_field(
        chunks[0],
        buf,
        "Identifier",
        &panel.identifier,
        panel.focus == PanelFocus::Identifier,
    );
    render_field(
        chunks[1],
        buf,
        "Genus",
        &panel.genus,
        panel.focus == PanelFocus::Genus,
    );

    let years = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_field(
        years[0],
        buf,
        "Year from",
        &panel.year_min,
        panel.focus == PanelFocus::YearMin,
    );
    render_field(
        years[1],
        buf,
        "Year to",
        &panel.year_max,
        panel.focus == PanelFocus::YearMax,
    );

    let sort = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[3]);
    render_field(
        sort[0],
        buf,
        "Sort by",
        panel.sort.column.label(),
        panel.focus == PanelFocus::SortColumn,
    );
    render_field(
        sort[1],
        buf,
        "Order",
        panel.sort.direction.label(),
        panel.focus == PanelFocus::SortDirection,
    );

    let viz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[4]);
    render_field(
        viz[0],
        buf,
        "Visualization",
        panel.viz_kind.label(),
        panel.focus == PanelFocus::VizKind,
    );
    render_field(
        viz[1],
        buf,
        "Viz column",
        panel.viz_column.label(),
        panel.focus == PanelFocus::VizColumn,
    );

    let footer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(chunks[6]);
    render_button(footer[0], buf, "Apply", panel.focus == PanelFocus::Apply);
    render_button(footer[1], buf, "Clear", panel.focus == PanelFocus::Clear);
    render_button(footer[2], buf, "Export", panel.focus == PanelFocus::Export);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_edits_the_focused_field() {
        let mut panel = FilterPanel::new(YearRange::FULL_DOMAIN);
        panel.handle_key(&key(KeyCode::Char('m')));
        panel.handle_key(&key(KeyCode::Char('y')));
        assert_eq!(panel.identifier, "my");
        panel.handle_key(&key(KeyCode::Backspace));
        assert_eq!(panel.identifier, "m");

        panel.handle_key(&key(KeyCode::Tab));
        panel.handle_key(&key(KeyCode::Char('b')));
        assert_eq!(panel.genus, "b");
    }

    #[test]
    fn focus_cycles_through_every_element() {
        let mut panel = FilterPanel::new(YearRange::FULL_DOMAIN);
        let start = panel.focus;
        for _ in 0..PanelFocus::ORDER.len() {
            panel.handle_key(&key(KeyCode::Tab));
        }
        assert_eq!(panel.focus, start);
    }

    #[test]
    fn filter_spec_parses_years_and_rejects_garbage() {
        let mut panel = FilterPanel::new(YearRange::FULL_DOMAIN);
        panel.genus = "asco".into();
        panel.year_min = "1900".into();
        panel.year_max = "1950".into();
        let spec = panel.filter_spec().unwrap();
        assert_eq!(spec.years, YearRange::new(1900, 1950).unwrap());
        assert_eq!(spec.genus, "asco");

        panel.year_min = "189x".into();
        assert!(panel.filter_spec().is_err());
        panel.year_min = "1990".into();
        panel.year_max = "1900".into();
        assert!(panel.filter_spec().is_err());
    }

    #[test]
    fn enter_on_clear_resets_inputs() {
        let mut panel = FilterPanel::new(YearRange::FULL_DOMAIN);
        panel.genus = "boletus".into();
        panel.year_min = "1900".into();
        panel.focus = PanelFocus::Clear;
        let action = panel.handle_key(&key(KeyCode::Enter));
        assert_eq!(action, PanelAction::Clear);
        assert!(panel.genus.is_empty());
        assert_eq!(panel.year_min, YearRange::FULL_DOMAIN.min().to_string());
    }

    #[test]
    fn selector_keys_report_the_right_action() {
        let mut panel = FilterPanel::new(YearRange::FULL_DOMAIN);
        panel.focus = PanelFocus::SortDirection;
        assert_eq!(panel.handle_key(&key(KeyCode::Right)), PanelAction::SortChanged);
        panel.focus = PanelFocus::VizKind;
        assert_eq!(panel.handle_key(&key(KeyCode::Right)), PanelAction::VizChanged);
        assert_eq!(panel.viz_kind, VizKind::BarChart);
        panel.focus = PanelFocus::Export;
        assert_eq!(panel.handle_key(&key(KeyCode::Enter)), PanelAction::Export);
    }
}
