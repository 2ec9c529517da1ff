//! Loading rule files and publishing them to the engine.
//!
//! Each table is resolved from an ordered list of sources, first success
//! wins: the user override, the bundled default, whatever was loaded
//! before, and finally an empty table. A rebuilt set of tables is swapped
//! in as a whole, so readers only ever see a complete old or new set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use super::table::{ParseError, RuleTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// The three rule files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Path,
    Modifier,
    Beast,
}

impl RuleKind {
    pub fn all() -> &'static [RuleKind] {
        &[Self::Path, Self::Modifier, Self::Beast]
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Path => "PathAlerts.txt",
            Self::Modifier => "ModAlerts.txt",
            Self::Beast => "BeastAlerts.txt",
        }
    }
}

/// Where bundled defaults and user overrides live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPaths {
    /// Plugin install folder holding the bundled rule files and `sounds/`.
    pub plugin_dir: PathBuf,
    /// User override folder.
    pub config_dir: PathBuf,
}

impl AlertPaths {
    pub fn new(plugin_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            config_dir: config_dir.into(),
        }
    }

    pub fn bundled(&self, kind: RuleKind) -> PathBuf {
        self.plugin_dir.join(kind.file_name())
    }

    pub fn user_override(&self, kind: RuleKind) -> PathBuf {
        self.config_dir.join(kind.file_name())
    }

    pub fn sound_dir(&self) -> PathBuf {
        self.plugin_dir.join("sounds")
    }
}

/// Read and parse one rule file.
pub fn load_rule_file(path: &Path) -> Result<RuleTable, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RuleTable::parse(content.lines()).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

enum Source<'a> {
    UserOverride(&'a Path),
    Bundled(&'a Path),
    Previous(Option<&'a Arc<RuleTable>>),
}

impl Source<'_> {
    fn attempt(&self) -> Option<Arc<RuleTable>> {
        let path = match self {
            Self::Previous(previous) => return previous.cloned(),
            // A missing override is the normal case and not worth a log line.
            Self::UserOverride(path) if !path.exists() => return None,
            Self::UserOverride(path) | Self::Bundled(path) => path,
        };
        match load_rule_file(path) {
            Ok(table) => {
                log::info!("Loaded {} alert rules from {:?}", table.len(), path);
                Some(Arc::new(table))
            }
            Err(e) => {
                log::error!("Unable to load config file: {}", e);
                None
            }
        }
    }
}

/// Resolve one table from its layered sources.
pub fn load_layered(
    user_override: &Path,
    bundled: &Path,
    previous: Option<&Arc<RuleTable>>,
) -> Arc<RuleTable> {
    let sources = [
        Source::UserOverride(user_override),
        Source::Bundled(bundled),
        Source::Previous(previous),
    ];
    sources
        .iter()
        .find_map(Source::attempt)
        .unwrap_or_default()
}

/// One consistent set of rule tables.
#[derive(Debug, Clone, Default)]
pub struct AlertTables {
    pub path: Arc<RuleTable>,
    pub modifiers: Arc<RuleTable>,
    pub beasts: Arc<RuleTable>,
}

impl AlertTables {
    pub fn table(&self, kind: RuleKind) -> &Arc<RuleTable> {
        match kind {
            RuleKind::Path => &self.path,
            RuleKind::Modifier => &self.modifiers,
            RuleKind::Beast => &self.beasts,
        }
    }

    /// Load all three tables, falling back to `previous` per table.
    pub fn load(paths: &AlertPaths, previous: Option<&AlertTables>) -> Self {
        let resolve = |kind: RuleKind| {
            load_layered(
                &paths.user_override(kind),
                &paths.bundled(kind),
                previous.map(|p| p.table(kind)),
            )
        };
        Self {
            path: resolve(RuleKind::Path),
            modifiers: resolve(RuleKind::Modifier),
            beasts: resolve(RuleKind::Beast),
        }
    }
}

/// Shared, atomically replaceable handle to the current rule tables.
#[derive(Debug, Clone, Default)]
pub struct RulesHandle {
    current: Arc<RwLock<Arc<AlertTables>>>,
}

impl RulesHandle {
    pub fn new(tables: AlertTables) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(tables))),
        }
    }

    /// Current tables. The returned snapshot never changes underneath the caller.
    pub fn snapshot(&self) -> Arc<AlertTables> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn publish(&self, tables: AlertTables) {
        let next = Arc::new(tables);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    /// Rebuild every table from disk and swap the result in.
    pub fn reload(&self, paths: &AlertPaths) {
        log::info!("Reloading ModAlerts, PathAlerts, & BeastAlerts.txt...");
        let previous = self.snapshot();
        let next = AlertTables::load(paths, Some(&previous));
        self.publish(next);
    }
}

/// Copy the bundled rule files into the user override folder.
///
/// Existing overrides are left alone. Returns the files that were written.
pub fn copy_default_configs(paths: &AlertPaths) -> io::Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for kind in RuleKind::all() {
        let target = paths.user_override(*kind);
        if target.exists() {
            log::error!("Custom config for {} already exists at {:?}", kind.file_name(), target);
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(paths.bundled(*kind), &target)?;
        copied.push(target);
    }
    Ok(copied)
}
