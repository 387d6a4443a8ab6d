use clap::Parser;
use color_eyre::Result;
use mycotui::{App, AppEvent, CacheManager, ConfigManager, APP_NAME};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::channel;

#[derive(Parser, Debug)]
#[command(version, about = "Browse fungal specimen occurrences in the terminal")]
struct Args {
    /// Override the dataset URL from the config file
    #[arg(long = "url")]
    url: Option<String>,

    /// Re-download the dataset instead of reusing the cached copy
    #[arg(long = "refresh", action)]
    refresh: bool,

    /// Directory to write exported images to
    #[arg(long = "export-dir")]
    export_dir: Option<PathBuf>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    debug: bool,

    /// Clear all cache data and exit
    #[arg(long = "clear-cache", action)]
    clear_cache: bool,
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args) -> Result<()> {
    let config_manager = ConfigManager::new(APP_NAME)?;
    let mut config = config_manager.load()?;
    if let Some(url) = &args.url {
        config.dataset_url = url.clone();
    }
    if let Some(dir) = &args.export_dir {
        config.export_dir = Some(dir.clone());
    }
    let cache = CacheManager::new(APP_NAME)?;
    cache.ensure_cache_dir()?;

    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new(config, cache)?;
    if args.debug {
        app.enable_debug();
    }
    app.set_refresh(args.refresh);
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Load)?;

    loop {
        if crossterm::event::poll(std::time::Duration::from_millis(25))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let terminal = ratatui::init();
    let result = run(terminal, &args);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_overrides() {
        let args = Args::parse_from([
            "mycotui",
            "--url",
            "https://example.org/occ.csv.gz",
            "--refresh",
            "--export-dir",
            "/tmp/exports",
        ]);
        assert_eq!(args.url.as_deref(), Some("https://example.org/occ.csv.gz"));
        assert!(args.refresh);
        assert_eq!(args.export_dir, Some(PathBuf::from("/tmp/exports")));
        assert!(!args.clear_cache);
    }
}
