use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::error::{Result, TuitionError};
use crate::io::excel_read;
use crate::store::ReconciliationStore;

/// Loads the workbook at most once per process and hands out stores built
/// from that snapshot.
///
/// A workbook that cannot be loaded is not fatal: the session falls back to
/// an empty roster with empty ledgers and keeps the error as a notice for the
/// caller to display.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    settings: Settings,
    loaded: OnceLock<LoadOutcome>,
}

#[derive(Debug)]
struct LoadOutcome {
    snapshot: ReconciliationStore,
    notice: Option<TuitionError>,
}

impl Session {
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            settings,
            loaded: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// A store seeded from the cached load. The workbook is read on the first
    /// call only.
    pub fn store(&self) -> ReconciliationStore {
        self.outcome().snapshot.clone()
    }

    /// The error that forced an empty store, if the load failed.
    pub fn load_notice(&self) -> Option<&TuitionError> {
        self.outcome().notice.as_ref()
    }

    /// Resolves where a mutated store may be written: `requested`, or the
    /// session's workbook when none is given.
    ///
    /// After a failed load the store is the empty fallback, so writing it over
    /// the existing workbook is refused. A workbook that did not exist yet may
    /// be created.
    pub fn save_target<'a>(&'a self, requested: Option<&'a Path>) -> Result<&'a Path> {
        let target = requested.unwrap_or(&self.path);
        if let Some(notice) = self.load_notice() {
            if target.exists() && same_file(target, &self.path) {
                warn!(
                    path = %target.display(),
                    "refusing to overwrite a workbook that failed to load"
                );
                return Err(TuitionError::UnsafeOverwrite {
                    path: target.to_path_buf(),
                    reason: notice.to_string(),
                });
            }
        }
        Ok(target)
    }

    fn outcome(&self) -> &LoadOutcome {
        self.loaded.get_or_init(|| self.load())
    }

    #[instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> LoadOutcome {
        match excel_read::load_from_path(&self.path, &self.settings) {
            Ok(loaded) => {
                info!(students = loaded.roster.len(), "session initialised from workbook");
                LoadOutcome {
                    snapshot: ReconciliationStore::new(self.settings.clone(), loaded),
                    notice: None,
                }
            }
            Err(error) => {
                warn!(%error, "workbook could not be loaded; starting with an empty roster");
                LoadOutcome {
                    snapshot: ReconciliationStore::empty(self.settings.clone()),
                    notice: Some(error),
                }
            }
        }
    }
}

fn same_file(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}
