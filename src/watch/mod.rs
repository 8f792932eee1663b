use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Events emitted by the file watcher
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// The watched response file was written, replaced or removed
    FileChanged,
    /// The underlying watcher reported an error
    Error(String),
}

/// A debounced watcher for a single diff response file
pub struct FileWatcher {
    _watcher: notify_debouncer_mini::Debouncer<RecommendedWatcher>,
}

impl FileWatcher {
    /// Start watching `file`. Its parent directory is watched so editors that
    /// save by rename are still seen. Events are debounced by `debounce_ms`.
    pub fn new(file: &Path, debounce_ms: u64, tx: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let target = absolute(file)?;
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let watched = target.clone();
        let mut debouncer = new_debouncer(
            Duration::from_millis(debounce_ms),
            move |result: DebounceEventResult| {
                if let Some(event) = watch_event(result, &watched) {
                    // Receiver gone means the viewer is shutting down
                    let _ = tx.send(event);
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        log::debug!("watching {}", target.display());

        Ok(FileWatcher {
            _watcher: debouncer,
        })
    }
}

fn absolute(file: &Path) -> Result<PathBuf> {
    if file.is_absolute() {
        return Ok(file.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(file))
}

/// Errors go to the viewer rather than the log, which would draw over the TUI
fn watch_event(result: DebounceEventResult, target: &Path) -> Option<WatchEvent> {
    match result {
        Ok(events) if is_relevant(&events, target) => Some(WatchEvent::FileChanged),
        Ok(_) => None,
        Err(e) => Some(WatchEvent::Error(e.to_string())),
    }
}

fn is_relevant(events: &[notify_debouncer_mini::DebouncedEvent], target: &Path) -> bool {
    events
        .iter()
        .filter(|e| e.kind == DebouncedEventKind::Any)
        .any(|e| e.path == target)
}
