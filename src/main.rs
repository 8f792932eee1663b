mod app;
mod cache;
mod config;
mod diff;
mod print;
mod ui;
mod watch;

use anyhow::{Context, Result};
use app::{App, ReloadOutcome};
use cache::DiffCache;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::RdConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use diff::DiffMode;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use watch::{FileWatcher, WatchEvent};

/// View and group article revision diffs
#[derive(Parser)]
#[command(name = "revdiff", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive viewer
    View(SourceArgs),

    /// Print the grouped diff to stdout
    Print {
        #[command(flatten)]
        source: SourceArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Store a diff response in the cache
    Import {
        path: PathBuf,

        #[arg(long)]
        from: u64,

        #[arg(long)]
        to: u64,

        /// Never purge this entry during housekeeping
        #[arg(long)]
        pin: bool,
    },

    /// Delete stale cached responses
    Housekeep,
}

#[derive(Args)]
struct SourceArgs {
    /// Diff response JSON file (omit to read --from/--to from the cache)
    path: Option<PathBuf>,

    /// Older revision ID (cache lookup)
    #[arg(long)]
    from: Option<u64>,

    /// Newer revision ID (cache lookup, and default for --rev)
    #[arg(long)]
    to: Option<u64>,

    /// Presentation mode (defaults to the configured one)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Revision used to select a section override
    #[arg(long)]
    rev: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Single,
    Compare,
}

impl From<ModeArg> for DiffMode {
    fn from(m: ModeArg) -> DiffMode {
        match m {
            ModeArg::Single => DiffMode::Single,
            ModeArg::Compare => DiffMode::Compare,
        }
    }
}

/// A resolved input: file to read plus the settings that apply to it
struct Source {
    path: PathBuf,
    to_revision: Option<u64>,
    mode: DiffMode,
    config: RdConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::View(args) => {
            let source = resolve_source(&args)?;
            run_viewer(source)
        }
        Command::Print { source, json } => {
            let source = resolve_source(&source)?;
            let (response, _) = diff::load_response(&source.path)?;
            let presentation = diff::build_presentation(
                &response,
                source.to_revision,
                source.mode,
                &source.config.section_overrides,
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&presentation)?);
            } else {
                print!(
                    "{}",
                    print::format_text(&presentation, source.config.display.line_numbers)
                );
            }
            Ok(())
        }
        Command::Import { path, from, to, pin } => {
            let config = config::load_config(&std::env::current_dir()?);
            let mut cache = open_cache(&config)?;
            let dest = cache.import(&path, from, to, pin, chrono::Utc::now())?;
            println!("{}", dest.display());
            Ok(())
        }
        Command::Housekeep => {
            let config = config::load_config(&std::env::current_dir()?);
            let mut cache = open_cache(&config)?;
            for path in cache.housekeep(chrono::Utc::now())? {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

fn open_cache(config: &RdConfig) -> Result<DiffCache> {
    let dir = config
        .cache
        .resolve_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?;
    DiffCache::open(&dir, config.cache.max_age_days)
}

/// Work out which file to read, and load the config next to it
fn resolve_source(args: &SourceArgs) -> Result<Source> {
    let (path, config) = match &args.path {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or(std::env::current_dir()?);
            (path.clone(), config::load_config(&dir))
        }
        None => {
            let (Some(from), Some(to)) = (args.from, args.to) else {
                anyhow::bail!("Pass a response file, or both --from and --to to read from the cache");
            };
            let config = config::load_config(&std::env::current_dir()?);
            let mut cache = open_cache(&config)?;
            let path = cache
                .lookup(from, to)
                .with_context(|| format!("Revisions {}..{} are not cached (see `revdiff import`)", from, to))?;
            cache.mark_viewed(from, to, chrono::Utc::now())?;
            (path, config)
        }
    };

    let mode = args.mode.map(DiffMode::from).unwrap_or(config.diff.mode);
    Ok(Source {
        path,
        to_revision: args.rev.or(args.to),
        mode,
        config,
    })
}

/// Caps the log level at `Error` while alive, so warnings from reloads do
/// not draw over the viewer.
struct QuietLogs(log::LevelFilter);

impl QuietLogs {
    fn new() -> Self {
        let previous = log::max_level();
        log::set_max_level(previous.min(log::LevelFilter::Error));
        QuietLogs(previous)
    }
}

impl Drop for QuietLogs {
    fn drop(&mut self) {
        log::set_max_level(self.0);
    }
}

fn run_viewer(source: Source) -> Result<()> {
    let mut app = App::new(&source.path, source.to_revision, source.mode, source.config)?;

    // Terminal setup
    let quiet = QuietLogs::new();
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let result = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    drop(quiet);

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Channel for file watch events
    let (watch_tx, watch_rx) = mpsc::channel::<WatchEvent>();

    // Debounce state for file watcher reloads
    let mut pending_reload = false;
    let mut reload_deadline = Instant::now();

    // Start watching by default
    let mut watcher: Option<FileWatcher> = match FileWatcher::new(&app.path, 300, watch_tx.clone()) {
        Ok(w) => {
            app.watching = true;
            Some(w)
        }
        Err(e) => {
            log::warn!("Watch unavailable: {:#}", e);
            None
        }
    };

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with a timeout (lets us process watch events too)
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key, &watch_tx, &mut watcher);
                }
            }
        }

        // Debounced file watch events
        match watch_rx.try_recv() {
            Ok(WatchEvent::FileChanged) => {
                pending_reload = true;
                reload_deadline = Instant::now() + Duration::from_millis(200);
            }
            Ok(WatchEvent::Error(msg)) => app.notify(&format!("Watch error: {}", msg)),
            Err(_) => {}
        }

        if pending_reload && Instant::now() >= reload_deadline {
            pending_reload = false;
            reload(app, "File changed");
        }

        // Expire notifications
        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn reload(app: &mut App, reason: &str) {
    match app.reload() {
        Ok(ReloadOutcome::Updated) => app.notify(&format!("{} · regrouped", reason)),
        Ok(ReloadOutcome::Unchanged) => app.notify("No changes"),
        Err(e) => app.notify(&format!("Reload failed: {:#}", e)),
    }
}

fn handle_key(
    app: &mut App,
    key: KeyEvent,
    watch_tx: &mpsc::Sender<WatchEvent>,
    watcher: &mut Option<FileWatcher>,
) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('n') => app.next_change(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.toggle_selected_context();
        }
        KeyCode::Char('m') => {
            app.toggle_mode();
            let label = app.mode().label();
            app.notify(&format!("Mode: {}", label));
        }
        KeyCode::Char('r') => reload(app, "Reloaded"),
        KeyCode::Char('w') => {
            if app.watching {
                *watcher = None;
                app.watching = false;
                app.notify("Watch stopped");
            } else {
                match FileWatcher::new(&app.path, 300, watch_tx.clone()) {
                    Ok(w) => {
                        *watcher = Some(w);
                        app.watching = true;
                        app.notify("Watching for changes");
                    }
                    Err(e) => app.notify(&format!("Watch failed: {:#}", e)),
                }
            }
        }
        _ => {}
    }
}
