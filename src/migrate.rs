//! The migration run: open the library, plan every folder rewrite, apply
//! the changes and report what happened.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::convert::ConversionConfig;
use crate::error::MigrateError;
use crate::state::library::update_folder;
use crate::state::{FilmRoll, Library};

/// A film roll folder before and after conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderChange {
    pub original: String,
    pub converted: String,
}

/// Result of the scan phase: every film roll whose folder would change,
/// keyed by id, plus how many rows were looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionPlan {
    scanned: usize,
    changes: BTreeMap<i64, FolderChange>,
}

impl ConversionPlan {
    /// Convert every folder and keep the ones that differ afterwards.
    pub fn build(rolls: impl IntoIterator<Item = FilmRoll>, config: &ConversionConfig) -> Self {
        let mut plan = Self::default();

        for roll in rolls {
            plan.scanned += 1;
            let converted = config.convert(&roll.folder);
            if converted != roll.folder {
                plan.changes.insert(
                    roll.id,
                    FolderChange {
                        original: roll.folder,
                        converted,
                    },
                );
            }
        }

        plan
    }

    pub fn scanned(&self) -> usize {
        self.scanned
    }

    pub fn changes(&self) -> &BTreeMap<i64, FolderChange> {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Switches that change how a run writes, not what it converts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Plan and report only
    pub dry_run: bool,
    /// Apply every update in a single transaction
    pub atomic: bool,
    /// Back up the library before the first update
    pub backup: bool,
    /// Where to write a JSON report of the run
    pub report: Option<PathBuf>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub scanned: usize,
    pub migrated: usize,
    pub dry_run: bool,
    pub backup: Option<PathBuf>,
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(
                f,
                "{} of {} entries would be migrated (dry run)",
                self.migrated, self.scanned
            )
        } else {
            write!(f, "{} of {} entries migrated", self.migrated, self.scanned)
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    library: &'a Path,
    #[serde(flatten)]
    summary: &'a MigrationSummary,
    changes: Vec<ReportEntry<'a>>,
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    id: i64,
    #[serde(flatten)]
    change: &'a FolderChange,
}

/// Run one migration against the library at `library_path`.
///
/// The configuration must already be validated; building a
/// [`ConversionConfig`] does that. Without `atomic`, each row is committed
/// on its own, so a failed update leaves earlier rows migrated.
pub fn run(
    library_path: &Path,
    config: &ConversionConfig,
    options: &MigrationOptions,
) -> Result<MigrationSummary, MigrateError> {
    if config.is_noop() {
        warn!("no prefix or direction given, nothing will change");
    }

    let mut library = Library::open(library_path)?;

    let rolls = library.film_rolls().map_err(MigrateError::StorageRead)?;
    let plan = ConversionPlan::build(rolls, config);
    info!(
        "{} film rolls scanned, {} selected for conversion",
        plan.scanned(),
        plan.len()
    );

    if options.dry_run {
        for (&id, change) in plan.changes() {
            log_change(id, change);
        }
        let summary = MigrationSummary {
            scanned: plan.scanned(),
            migrated: plan.len(),
            dry_run: true,
            backup: None,
        };
        write_report(options, library.path(), &summary, plan.changes().iter())?;
        return Ok(summary);
    }

    let backup = if options.backup && !plan.is_empty() {
        Some(backup_library(&library)?)
    } else {
        None
    };

    let migrated = if options.atomic {
        apply_atomically(&mut library, &plan)?
    } else {
        apply(&library, &plan)?
    };

    let summary = MigrationSummary {
        scanned: plan.scanned(),
        migrated,
        dry_run: false,
        backup,
    };
    write_report(
        options,
        library.path(),
        &summary,
        plan.changes().iter().take(migrated),
    )?;

    Ok(summary)
}

/// Update rows one statement at a time, stopping at the first failure.
fn apply(library: &Library, plan: &ConversionPlan) -> Result<usize, MigrateError> {
    let mut applied = 0;
    for (&id, change) in plan.changes() {
        library
            .set_folder(id, &change.converted)
            .map_err(|source| MigrateError::StorageWrite {
                id,
                applied,
                source,
            })?;
        log_change(id, change);
        applied += 1;
    }
    Ok(applied)
}

/// Update every row inside one transaction; any failure leaves the library
/// untouched.
fn apply_atomically(library: &mut Library, plan: &ConversionPlan) -> Result<usize, MigrateError> {
    let tx = library.transaction().map_err(MigrateError::Transaction)?;

    for (&id, change) in plan.changes() {
        update_folder(&tx, id, &change.converted).map_err(|source| {
            MigrateError::StorageWrite {
                id,
                applied: 0,
                source,
            }
        })?;
    }

    tx.commit().map_err(MigrateError::Transaction)?;
    debug!("committed {} updates", plan.len());

    // nothing is migrated until the commit lands
    for (&id, change) in plan.changes() {
        log_change(id, change);
    }

    Ok(plan.len())
}

fn backup_library(library: &Library) -> Result<PathBuf, MigrateError> {
    let path = backup_path(library.path(), &Local::now().format("%Y%m%d-%H%M%S").to_string());
    library
        .backup_to(&path)
        .map_err(|source| MigrateError::Backup {
            path: path.clone(),
            source,
        })?;
    info!("library backed up to {}", path.display());
    Ok(path)
}

/// `<library>.<stamp>.bak`, next to the library
fn backup_path(library: &Path, stamp: &str) -> PathBuf {
    let mut name = library.as_os_str().to_owned();
    name.push(format!(".{stamp}.bak"));
    PathBuf::from(name)
}

fn write_report<'a>(
    options: &MigrationOptions,
    library: &Path,
    summary: &MigrationSummary,
    changes: impl Iterator<Item = (&'a i64, &'a FolderChange)>,
) -> Result<(), MigrateError> {
    let Some(path) = &options.report else {
        return Ok(());
    };

    let report = Report {
        library,
        summary,
        changes: changes
            .map(|(&id, change)| ReportEntry { id, change })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json).map_err(|source| MigrateError::ReportWrite {
        path: path.clone(),
        source,
    })?;

    info!("report written to {}", path.display());
    Ok(())
}

fn log_change(id: i64, change: &FolderChange) {
    info!("film roll {id}: {} -> {}", change.original, change.converted);
}
