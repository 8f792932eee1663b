use crate::config::RdConfig;
use crate::diff::{self, DiffMode, DiffPresentation, DiffResponse, PresentationGroup};
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Groups moved by PageDown / PageUp
const PAGE_GROUPS: usize = 10;

/// What a reload found
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReloadOutcome {
    /// File content hash matched the loaded one
    Unchanged,
    Updated,
}

/// Viewer state for one diff file
pub struct App {
    /// Response file being viewed
    pub path: PathBuf,

    /// Revision used to look up section overrides
    pub to_revision: Option<u64>,

    pub response: DiffResponse,

    /// SHA-256 of the raw file content last loaded
    pub response_hash: String,

    pub presentation: DiffPresentation,

    /// Index of the selected group
    pub selected: usize,

    /// Context groups the user toggled away from the configured default
    pub toggled_context: HashSet<usize>,

    /// Whether file watch mode is active
    pub watching: bool,

    /// Notification message (auto-clears)
    pub watch_message: Option<String>,

    /// Ticks since last notification (for auto-clearing)
    pub watch_message_ticks: u8,

    pub should_quit: bool,

    pub config: RdConfig,
}

impl App {
    pub fn new(
        path: &Path,
        to_revision: Option<u64>,
        mode: DiffMode,
        config: RdConfig,
    ) -> Result<Self> {
        let (response, response_hash) = diff::load_response(path)?;
        let presentation =
            diff::build_presentation(&response, to_revision, mode, &config.section_overrides);

        Ok(Self {
            path: path.to_path_buf(),
            to_revision,
            response,
            response_hash,
            presentation,
            selected: 0,
            toggled_context: HashSet::new(),
            watching: false,
            watch_message: None,
            watch_message_ticks: 0,
            should_quit: false,
            config,
        })
    }

    pub fn mode(&self) -> DiffMode {
        self.presentation.mode
    }

    pub fn groups(&self) -> &[PresentationGroup] {
        &self.presentation.groups
    }

    /// Display name for the top bar
    pub fn title(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn regroup(&mut self, mode: DiffMode) {
        self.presentation = diff::build_presentation(
            &self.response,
            self.to_revision,
            mode,
            &self.config.section_overrides,
        );
        self.toggled_context.clear();
        self.clamp_selection();
    }

    pub fn toggle_mode(&mut self) {
        let mode = self.mode().toggle();
        self.regroup(mode);
        self.selected = 0;
    }

    /// Re-read the file. Keeps the current presentation on error.
    pub fn reload(&mut self) -> Result<ReloadOutcome> {
        let (response, hash) = diff::load_response(&self.path)?;
        if hash == self.response_hash {
            return Ok(ReloadOutcome::Unchanged);
        }
        self.response = response;
        self.response_hash = hash;
        self.regroup(self.mode());
        Ok(ReloadOutcome::Updated)
    }

    // ── Navigation ──

    fn clamp_selection(&mut self) {
        let len = self.groups().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.groups().len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn page_down(&mut self) {
        self.selected += PAGE_GROUPS;
        self.clamp_selection();
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(PAGE_GROUPS);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.groups().len().saturating_sub(1);
    }

    /// Jump to the next change group after the selection, wrapping around
    pub fn next_change(&mut self) {
        let len = self.groups().len();
        if len == 0 {
            return;
        }
        for step in 1..=len {
            let idx = (self.selected + step) % len;
            if matches!(self.groups()[idx], PresentationGroup::Change { .. }) {
                self.selected = idx;
                return;
            }
        }
    }

    // ── Context expansion ──

    pub fn is_context_expanded(&self, idx: usize) -> bool {
        self.config.diff.expand_context != self.toggled_context.contains(&idx)
    }

    /// Expand or collapse the selected group if it is a context group.
    /// Returns whether anything changed.
    pub fn toggle_selected_context(&mut self) -> bool {
        if !matches!(
            self.groups().get(self.selected),
            Some(PresentationGroup::Context { .. })
        ) {
            return false;
        }
        if !self.toggled_context.remove(&self.selected) {
            self.toggled_context.insert(self.selected);
        }
        true
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.watch_message = Some(msg.to_string());
        self.watch_message_ticks = 0;
    }

    /// Called once per event loop iteration to expire notifications
    pub fn tick(&mut self) {
        if self.watch_message.is_some() {
            self.watch_message_ticks += 1;
            if self.watch_message_ticks > 20 {
                self.watch_message = None;
                self.watch_message_ticks = 0;
            }
        }
    }
}
