//! Data validation utilities.
//!
//! Every `*.ron` file in a data directory is parsed and validated through the
//! rules core. The file name decides what it must contain:
//!
//! - `combat*.ron` / `config*.ron`: one [`CombatConfig`]
//! - `weapons*.ron`: a list of [`Weapon`]s
//! - anything else: a single [`Weapon`]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use skirmish_core::config::CombatConfig;
use skirmish_core::error::CombatError;
use skirmish_core::weapon::Weapon;

use crate::error::{Result, ToolError};

/// What a data file is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Rules tuning.
    CombatConfig,
    /// A list of weapons.
    WeaponList,
    /// One weapon.
    Weapon,
}

impl DataKind {
    /// Classify a file by its name.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if stem.starts_with("combat") || stem.starts_with("config") {
            Self::CombatConfig
        } else if stem.starts_with("weapons") {
            Self::WeaponList
        } else {
            Self::Weapon
        }
    }
}

/// One file that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFile {
    /// File path.
    pub path: PathBuf,
    /// What it held.
    pub kind: DataKind,
    /// Number of definitions inside (1 for single-value files).
    pub items: usize,
}

/// Outcome of validating a directory.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Files that passed.
    pub valid: Vec<ValidFile>,
    /// Files that failed, with the reason.
    pub failures: Vec<(PathBuf, CombatError)>,
    /// Weapon names defined more than once across the directory.
    pub duplicate_weapons: Vec<String>,
}

impl ValidationReport {
    /// Whether every file passed and no weapon name repeats.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty() && self.duplicate_weapons.is_empty()
    }

    /// Total files looked at.
    #[must_use]
    pub fn files_checked(&self) -> usize {
        self.valid.len() + self.failures.len()
    }
}

/// Validate one file's text.
///
/// Returns every weapon name the file defines (none for configs).
///
/// # Errors
///
/// Returns the parse or validation error from the rules core.
pub fn validate_text(
    text: &str,
    kind: DataKind,
    origin: &str,
) -> std::result::Result<Vec<String>, CombatError> {
    match kind {
        DataKind::CombatConfig => {
            CombatConfig::from_ron(text, origin)?;
            Ok(Vec::new())
        }
        DataKind::WeaponList => Ok(Weapon::list_from_ron(text, origin)?
            .into_iter()
            .map(|w| w.name)
            .collect()),
        DataKind::Weapon => Ok(vec![Weapon::from_ron(text, origin)?.name]),
    }
}

/// Validate all RON data files in a directory.
///
/// Files are visited in name order so reports are stable.
///
/// # Errors
///
/// Returns an error if the directory is missing or unreadable. Problems in
/// individual files are collected in the report instead.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport> {
    if !path.is_dir() {
        return Err(ToolError::DirectoryNotFound(path.display().to_string()));
    }

    let io_error = |e: std::io::Error| ToolError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_error)? {
        let file = entry.map_err(io_error)?.path();
        if file.extension().is_some_and(|e| e == "ron") {
            files.push(file);
        }
    }
    files.sort();

    let mut report = ValidationReport::default();
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();

    for file in files {
        let origin = file.display().to_string();
        let text = fs::read_to_string(&file).map_err(|e| ToolError::Io {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        let kind = DataKind::for_path(&file);

        match validate_text(&text, kind, &origin) {
            Ok(names) => {
                let items = if kind == DataKind::CombatConfig { 1 } else { names.len() };
                tracing::debug!(file = %origin, ?kind, items, "Data file valid");
                for name in names {
                    if !seen.insert(name.clone()) {
                        duplicates.insert(name);
                    }
                }
                report.valid.push(ValidFile { path: file, kind, items });
            }
            Err(error) => {
                tracing::warn!(file = %origin, %error, "Data file invalid");
                report.failures.push((file, error));
            }
        }
    }

    report.duplicate_weapons = duplicates.into_iter().collect();
    Ok(report)
}
