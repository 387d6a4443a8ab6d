//! Terminal browser for a fungal specimen occurrence dataset.
//!
//! The app downloads (or reuses a cached copy of) the occurrence CSV, then
//! lets the user filter, sort, and visualize it interactively. Heavy work is
//! deferred through the event channel so the status line can announce it
//! before the blocking call runs.

use chrono::Local;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Widget};
use std::path::PathBuf;

pub mod cache;
pub mod chart_export;
pub mod config;
pub mod error_display;
pub mod frequency;
pub mod occurrence;
pub mod pipeline;
pub mod query;
pub mod widgets;

pub use cache::CacheManager;
pub use config::{AppConfig, ConfigManager};

use chart_export::VizKind;
use pipeline::SessionView;
use widgets::filter_panel::{self, FilterPanel, PanelAction};
use widgets::{occurrence_table, viz, TEXT_DIM, WARNING};

pub const APP_NAME: &str = "mycotui";

const SIDEBAR_WIDTH: u16 = 34;

/// Events driving the app. The `Do*` variants are the second half of a
/// deferred pair: the first half only sets the status text, so a render
/// happens before the blocking work starts.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Load,
    DoLoad,
    Export,
    DoExport,
    Exit,
    Crash(String),
}

pub struct App {
    config: AppConfig,
    cache: CacheManager,
    view: Option<SessionView>,
    pub panel: FilterPanel,
    notice: Option<String>,
    status: Option<String>,
    refresh: bool,
    debug: bool,
}

impl App {
    pub fn new(config: AppConfig, cache: CacheManager) -> Result<Self> {
        let full_domain = config.year_domain()?;
        Ok(Self {
            config,
            cache,
            view: None,
            panel: FilterPanel::new(full_domain),
            notice: None,
            status: None,
            refresh: false,
            debug: false,
        })
    }

    pub fn enable_debug(&mut self) {
        self.debug = true;
    }

    /// Force a re-download on the next load instead of reusing the cache.
    pub fn set_refresh(&mut self, refresh: bool) {
        self.refresh = refresh;
    }

    pub fn view(&self) -> Option<&SessionView> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut SessionView> {
        self.view.as_mut()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Handle one event. A returned event is sent back through the channel
    /// by the caller, which is how the deferred pairs chain.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Resize(_, _) => None,
            AppEvent::Load => {
                self.status = Some("Loading the occurrence dataset...".to_string());
                Some(AppEvent::DoLoad)
            }
            AppEvent::DoLoad => {
                self.do_load();
                None
            }
            AppEvent::Export => {
                self.status = Some("Exporting visualization...".to_string());
                Some(AppEvent::DoExport)
            }
            AppEvent::DoExport => {
                self.do_export();
                None
            }
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn on_key(&mut self, key: &KeyEvent) -> Option<AppEvent> {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return Some(AppEvent::Exit);
        }
        if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.refresh = true;
            return Some(AppEvent::Load);
        }

        match self.panel.handle_key(key) {
            PanelAction::None => None,
            PanelAction::Apply => {
                self.apply_panel();
                None
            }
            PanelAction::Clear => {
                if let Some(view) = self.view.as_mut() {
                    view.reset();
                    view.set_viz_column(self.panel.viz_column);
                }
                self.notice = None;
                None
            }
            PanelAction::Export => Some(AppEvent::Export),
            PanelAction::SortChanged => {
                if let Some(view) = self.view.as_mut() {
                    view.set_sort(self.panel.sort);
                }
                None
            }
            PanelAction::VizChanged => {
                if let Some(view) = self.view.as_mut() {
                    view.set_viz_column(self.panel.viz_column);
                }
                None
            }
        }
    }

    /// Parse the sidebar inputs and push them into the pipeline. Parse
    /// failures land in the notice line and leave the pipeline untouched.
    fn apply_panel(&mut self) {
        let spec = match self.panel.filter_spec() {
            Ok(spec) => spec,
            Err(e) => {
                self.notice = Some(error_display::user_message_from_report(&e));
                return;
            }
        };
        if let Some(view) = self.view.as_mut() {
            view.set_filter(spec);
            view.set_sort(self.panel.sort);
            view.set_viz_column(self.panel.viz_column);
        }
        self.notice = None;
    }

    fn do_load(&mut self) {
        let (dataset, notice) =
            occurrence::load_or_empty(&self.config.dataset_url, &self.cache, self.refresh);
        self.refresh = false;
        let full_domain = self.panel.full_domain();
        self.view = Some(SessionView::new(dataset, full_domain));
        self.notice = notice;
        self.status = None;
    }

    fn export_path(&self, kind: VizKind) -> PathBuf {
        let dir = self
            .config
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(chart_export::export_filename(kind, Local::now().date_naive()))
    }

    fn do_export(&mut self) {
        self.status = None;
        let kind = self.panel.viz_kind;
        let column_label = self.panel.viz_column.label();
        let path = self.export_path(kind);

        let result = match self.view.as_mut() {
            Some(view) => {
                let table = match kind {
                    VizKind::BarChart => view.bar_chart_table(),
                    VizKind::WordCloud => view.frequencies().cloned(),
                };
                table.and_then(|t| chart_export::write_visualization(&path, kind, &t, column_label))
            }
            None => Err(color_eyre::eyre::eyre!("No data to export")),
        };

        self.notice = Some(match result {
            Ok(()) => format!("Exported {}", path.display()),
            Err(e) => format!("Export failed: {}", error_display::user_message_from_report(&e)),
        });
    }

    fn status_line(&mut self) -> Line<'static> {
        if let Some(status) = &self.status {
            return Line::styled(status.clone(), Style::default().fg(WARNING));
        }
        if let Some(notice) = &self.notice {
            return Line::styled(notice.clone(), Style::default().fg(WARNING));
        }
        let mut text =
            "Tab: move focus  Enter: apply  Ctrl+R: refresh  Esc: quit".to_string();
        if self.debug {
            if let Some(view) = &self.view {
                let c = view.counters;
                text = format!(
                    "{}  [filter:{} sort:{} agg:{}]",
                    text, c.filter_passes, c.sort_passes, c.aggregate_passes
                );
            }
        }
        Line::styled(text, Style::default().fg(TEXT_DIM))
    }

    fn render_main(&mut self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let viz_title = format!(
            "{} of {}",
            self.panel.viz_kind.label(),
            self.panel.viz_column.label()
        );

        let outcome: Result<()> = (|| {
            let view = match self.view.as_mut() {
                Some(view) => view,
                None => return Ok(()),
            };
            let matched = view.matched_count()?;
            let display = view.display_rows()?.clone();
            occurrence_table::render(chunks[0], buf, &display, matched);

            match self.panel.viz_kind {
                VizKind::WordCloud => {
                    let table = view.frequencies()?.clone();
                    viz::render_word_cloud(chunks[1], buf, &table, &viz_title);
                }
                VizKind::BarChart => {
                    let table = view.bar_chart_table()?;
                    viz::render_bar_chart(chunks[1], buf, &table, &viz_title);
                }
            }
            Ok(())
        })();

        if let Err(e) = outcome {
            self.notice = Some(error_display::user_message_from_report(&e));
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(rows[0]);

        filter_panel::render(columns[0], buf, &self.panel);
        self.render_main(columns[1], buf);

        let status = self.status_line();
        Paragraph::new(status).render(rows[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortColumn;

    fn test_app(dir: &std::path::Path) -> App {
        let config = AppConfig {
            dataset_url: "http://127.0.0.1:1/occurrences.csv.gz".to_string(),
            export_dir: Some(dir.to_path_buf()),
            ..AppConfig::default()
        };
        let cache = CacheManager::with_dir(dir.join("cache"));
        App::new(config, cache).unwrap()
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    const SAMPLE_CSV: &str = "\
occurrenceID,catalogNumber,genus,specificEpithet,yearCollected,occurrenceRemarks
MYCO-001,A1,Boletus,edulis,1901,
MYCO-002,A2,Amanita,muscaria,1955,on bark
MYCO-003,B1,Boletus,badius,,under oak
";

    fn seed_cache(app: &App, csv: &str) {
        let dest = app.cache.cache_file(occurrence::DATASET_CACHE_FILE);
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(dest, csv).unwrap();
    }

    #[test]
    fn load_defers_then_populates_the_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        seed_cache(&app, SAMPLE_CSV);

        let follow_up = app.event(&AppEvent::Load);
        assert_eq!(follow_up, Some(AppEvent::DoLoad));
        assert!(app.status.is_some());

        assert_eq!(app.event(&AppEvent::DoLoad), None);
        assert!(app.status.is_none());
        let view = app.view.as_mut().unwrap();
        assert_eq!(view.matched_count().unwrap(), 3);
    }

    #[test]
    fn load_failure_degrades_to_empty_view_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        // nothing cached, and the URL is unreachable
        app.event(&AppEvent::Load);
        app.event(&AppEvent::DoLoad);

        assert!(app.notice.as_deref().unwrap().contains("Could not load"));
        let view = app.view.as_mut().unwrap();
        assert_eq!(view.matched_count().unwrap(), 0);
        assert_eq!(view.display_rows().unwrap().height(), 0);
    }

    #[test]
    fn typed_filter_applies_on_enter() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        seed_cache(&app, SAMPLE_CSV);
        app.event(&AppEvent::Load);
        app.event(&AppEvent::DoLoad);

        // genus field is second; type "bole" and apply
        app.event(&key(KeyCode::Tab));
        for c in "bole".chars() {
            app.event(&key(KeyCode::Char(c)));
        }
        app.event(&key(KeyCode::Enter));

        let view = app.view.as_mut().unwrap();
        assert_eq!(view.matched_count().unwrap(), 2);
    }

    #[test]
    fn bad_year_input_sets_notice_and_leaves_pipeline_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        seed_cache(&app, SAMPLE_CSV);
        app.event(&AppEvent::Load);
        app.event(&AppEvent::DoLoad);

        app.panel.year_min = "not-a-year".to_string();
        app.event(&key(KeyCode::Enter));
        assert!(app.notice.is_some());
        let view = app.view.as_mut().unwrap();
        assert_eq!(view.matched_count().unwrap(), 3);
    }

    #[test]
    fn sort_selector_change_flows_into_the_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        seed_cache(&app, SAMPLE_CSV);
        app.event(&AppEvent::Load);
        app.event(&AppEvent::DoLoad);

        app.panel.focus = widgets::filter_panel::PanelFocus::SortColumn;
        app.event(&key(KeyCode::Right));
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.sort_spec().column, SortColumn::CatalogNumber);
    }

    #[test]
    fn escape_requests_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        assert_eq!(app.event(&key(KeyCode::Esc)), Some(AppEvent::Exit));
    }

    #[test]
    fn export_with_no_data_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.event(&AppEvent::Load);
        app.event(&AppEvent::DoLoad); // unreachable URL, empty view

        assert_eq!(app.event(&AppEvent::Export), Some(AppEvent::DoExport));
        app.event(&AppEvent::DoExport);
        assert!(app.notice.as_deref().unwrap().contains("Export failed"));
    }

    #[test]
    fn export_filename_lands_under_the_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let path = app.export_path(VizKind::BarChart);
        assert!(path.starts_with(dir.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("bar-chart-"));
    }
}
