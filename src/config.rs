use crate::diff::{DiffMode, SectionOverride};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest time an unreferenced cached response is kept
pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RdConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Per-revision section tables, for responses with bad section metadata
    #[serde(default)]
    pub section_overrides: Vec<SectionOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub line_numbers: bool,
    #[serde(default)]
    pub wrap_lines: bool,
    #[serde(default = "default_tab_width")]
    pub tab_width: u8,
}

/// [diff] section configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default = "default_mode")]
    pub mode: DiffMode,
    /// Show context groups expanded instead of collapsed
    #[serde(default)]
    pub expand_context: bool,
}

/// [cache] section configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    /// Overrides the platform cache dir
    #[serde(default)]
    pub dir: Option<String>,
}

impl CacheConfig {
    pub fn resolve_dir(&self) -> Option<PathBuf> {
        match &self.dir {
            Some(d) => Some(PathBuf::from(d)),
            None => dirs::cache_dir().map(|d| d.join("revdiff")),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tab_width() -> u8 {
    4
}

fn default_mode() -> DiffMode {
    DiffMode::Compare
}

fn default_max_age_days() -> u32 {
    DEFAULT_MAX_AGE_DAYS
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_numbers: true,
            wrap_lines: false,
            tab_width: default_tab_width(),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            expand_context: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            dir: None,
        }
    }
}

/// Load config by merging global defaults with per-directory overrides.
/// Priority: `<dir>/.revdiff.toml` > global `~/.config/revdiff/config.toml` > built-in defaults.
/// Merging is deep: individual fields within sections (e.g. `[display]`) override independently.
pub fn load_config(dir: &Path) -> RdConfig {
    let global_path = dirs::config_dir().map(|d| d.join("revdiff/config.toml"));
    load_config_from(global_path.as_deref(), &dir.join(".revdiff.toml"))
}

pub fn load_config_from(global_path: Option<&Path>, local_path: &Path) -> RdConfig {
    let global_table = global_path.and_then(read_table);
    let local_table = read_table(local_path);

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            global
        }
        (Some(global), None) => global,
        (None, Some(local)) => local,
        (None, None) => return RdConfig::default(),
    };

    match toml::Value::Table(merged).try_into() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Invalid config, using defaults: {}", e);
            RdConfig::default()
        }
    }
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<toml::Table>(&content) {
        Ok(table) => Some(table),
        Err(e) => {
            log::warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
