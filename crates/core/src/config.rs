//! Settings loading and validation
//!
//! Settings come from one TOML file, layered with `SNAPKEEP_*` environment
//! overrides (`SNAPKEEP_RETENTION__DAYS=10`). The loaded value is immutable
//! and handed to every component explicitly.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable naming the settings file
pub const CONFIG_ENV: &str = "SNAPKEEP_CONFIG";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SNAPKEEP";

/// Complete snapkeep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the snapshot inventory
    pub destination: PathBuf,

    #[serde(default)]
    pub backend: Backend,

    /// Rotation action used by `rotate`
    #[serde(default)]
    pub action: ActionKind,

    /// Target for the relocate and archive actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_root: Option<PathBuf>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub retention: RetentionSettings,

    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

/// Retention quotas per tier, plus the weekday that closes a week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSettings {
    #[serde(default = "default_leafs")]
    pub leafs: u32,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_weeks")]
    pub weeks: u32,
    #[serde(default = "default_months")]
    pub months: u32,
    #[serde(default = "default_years")]
    pub years: u32,
    /// 1 = Monday ... 7 = Sunday
    #[serde(default = "default_weekstart")]
    pub weekstart: u8,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            leafs: default_leafs(),
            days: default_days(),
            weeks: default_weeks(),
            months: default_months(),
            years: default_years(),
            weekstart: default_weekstart(),
        }
    }
}

fn default_leafs() -> u32 {
    10
}

fn default_days() -> u32 {
    7
}

fn default_weeks() -> u32 {
    4
}

fn default_months() -> u32 {
    12
}

fn default_years() -> u32 {
    5
}

fn default_weekstart() -> u8 {
    7
}

/// One synchronization source and its filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Source path, may contain glob metacharacters
    pub path: String,

    #[serde(default)]
    pub filters: Vec<FilterRule>,
}

/// An include (`+ pattern`) or exclude (`- pattern`) rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterRule {
    Include(String),
    Exclude(String),
}

impl FilterRule {
    pub fn pattern(&self) -> &str {
        match self {
            FilterRule::Include(p) | FilterRule::Exclude(p) => p,
        }
    }
}

impl FromStr for FilterRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (sign, pattern) = match s.split_once(char::is_whitespace) {
            Some((sign, pattern)) => (sign, pattern.trim()),
            None => (s, ""),
        };
        if pattern.is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "filter rule '{}' has no pattern",
                s
            )));
        }
        match sign {
            "+" => Ok(FilterRule::Include(pattern.to_string())),
            "-" => Ok(FilterRule::Exclude(pattern.to_string())),
            _ => Err(Error::InvalidConfiguration(format!(
                "filter rule '{}' must start with '+' or '-'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for FilterRule {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FilterRule> for String {
    fn from(rule: FilterRule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRule::Include(p) => write!(f, "+ {}", p),
            FilterRule::Exclude(p) => write!(f, "- {}", p),
        }
    }
}

/// Snapshot storage backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// btrfs subvolumes (`btrfs subvolume snapshot`)
    #[default]
    Btrfs,
    /// Ordinary directories, full copies
    Plain,
}

/// What happens to snapshots marked for rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Print decisions, touch nothing
    #[default]
    Report,
    /// Delete rotated snapshots
    Remove,
    /// Move rotated snapshots under `archive_root`
    Relocate,
    /// Copy rotated snapshots under `archive_root`, then delete them
    Archive,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Report,
        ActionKind::Remove,
        ActionKind::Relocate,
        ActionKind::Archive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Report => "report",
            ActionKind::Remove => "remove",
            ActionKind::Relocate => "relocate",
            ActionKind::Archive => "archive",
        }
    }

    pub fn needs_archive_root(self) -> bool {
        matches!(self, ActionKind::Relocate | ActionKind::Archive)
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = ActionKind::ALL.iter().map(|k| k.name()).collect();
                Error::InvalidArgument(format!(
                    "unknown action '{}' (expected one of: {})",
                    s,
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Settings {
    /// Minimal settings for a destination, everything else defaulted
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            backend: Backend::default(),
            action: ActionKind::default(),
            archive_root: None,
            dry_run: false,
            verbose: false,
            retention: RetentionSettings::default(),
            sources: Vec::new(),
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.destination.as_os_str().is_empty() {
            return Err(Error::InvalidConfiguration(
                "destination must not be empty".to_string(),
            ));
        }

        if !(1..=7).contains(&self.retention.weekstart) {
            return Err(Error::InvalidConfiguration(format!(
                "retention.weekstart must be 1-7, got {}",
                self.retention.weekstart
            )));
        }

        if self.action.needs_archive_root() {
            self.archive_root_for(self.action)?;
        }

        Ok(())
    }

    /// The archive root, required by relocating actions
    pub fn archive_root_for(&self, action: ActionKind) -> Result<&Path> {
        self.archive_root.as_deref().ok_or_else(|| {
            Error::InvalidConfiguration(format!("action '{}' requires archive_root", action))
        })
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfiguration(e.to_string()))
    }
}

/// Locations searched for a settings file, in order
pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    search_order(
        explicit,
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        dirs::config_dir(),
    )
}

fn search_order(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut paths = Vec::new();
    paths.extend(env_path);
    paths.push(PathBuf::from("snapkeep.toml"));
    if let Some(dir) = config_dir {
        paths.push(dir.join("snapkeep").join("config.toml"));
    }
    paths.push(PathBuf::from("/etc/snapkeep.toml"));
    paths
}

/// Find the first existing settings file
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    let searched = candidate_paths(explicit);
    let found = searched.iter().find(|path| path.is_file()).cloned();
    found.ok_or(Error::ConfigurationMissing { searched })
}

/// Locate and load settings
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let path = locate(explicit)?;
    load_from(&path)
}

/// Load settings from `path` with environment overrides applied
pub fn load_from(path: &Path) -> Result<Settings> {
    debug!("Loading settings from {}", path.display());

    let settings: Settings = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}
