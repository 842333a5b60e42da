//! Find report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::spec::SpecFindError;

/// Aggregate counters and diagnostics for one `find_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportFind {
    /// Entries handed to the visitor (root included).
    pub cnt_scanned: u64,
    /// Regular files whose base name matched.
    pub cnt_matched: u64,
    /// Files copied or moved into the storage directory.
    pub cnt_transferred: u64,
    /// Files whose bytes were appended to the archive.
    pub cnt_archived: u64,
    /// Matches skipped (unreadable, directory, or the archive itself).
    pub cnt_skipped: u64,
    /// First matching file in locate / transfer mode.
    pub found_file: Option<PathBuf>,
    /// Archive written in archive mode, if any match opened it.
    pub path_archive: Option<PathBuf>,
    /// Files appended to the archive, in visit order.
    pub paths_archived: Vec<PathBuf>,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecFindError>,
}

impl ReportFind {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_found(&self) -> bool {
        self.found_file.is_some()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_transferred".to_string(), self.cnt_transferred);
        dict_counts.insert("cnt_archived".to_string(), self.cnt_archived);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} scanned={} matched={} transferred={} archived={} skipped={} errors={} warnings={}",
            dict_counts["cnt_scanned"],
            dict_counts["cnt_matched"],
            dict_counts["cnt_transferred"],
            dict_counts["cnt_archived"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportFind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FIND]"))
    }
}

/// Mutable accumulator owned by a visitor during one walk.
#[derive(Debug, Default, Clone)]
pub struct ReportFindBuilder {
    /// See [`ReportFind::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportFind::cnt_matched`].
    pub cnt_matched: u64,
    /// See [`ReportFind::cnt_transferred`].
    pub cnt_transferred: u64,
    /// See [`ReportFind::cnt_archived`].
    pub cnt_archived: u64,
    /// See [`ReportFind::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportFind::found_file`].
    pub found_file: Option<PathBuf>,
    /// See [`ReportFind::path_archive`].
    pub path_archive: Option<PathBuf>,
    /// See [`ReportFind::paths_archived`].
    pub paths_archived: Vec<PathBuf>,
    /// See [`ReportFind::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportFind::errors`].
    pub errors: Vec<SpecFindError>,
}

impl ReportFindBuilder {
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    pub fn add_matched(&mut self) {
        self.cnt_matched += 1;
    }

    pub fn add_transferred(&mut self) {
        self.cnt_transferred += 1;
    }

    /// Record one archived file.
    pub fn add_archived(&mut self, path_file: PathBuf) {
        self.cnt_archived += 1;
        self.paths_archived.push(path_file);
    }

    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Record the found file. Returns `false` when one is already set.
    pub fn set_found_file(&mut self, path_file: &Path) -> bool {
        if self.found_file.is_some() {
            return false;
        }
        self.found_file = Some(path_file.to_path_buf());
        true
    }

    pub fn set_path_archive(&mut self, path_archive: &Path) {
        self.path_archive = Some(path_archive.to_path_buf());
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.errors.push(SpecFindError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportFind {
        ReportFind {
            cnt_scanned: self.cnt_scanned,
            cnt_matched: self.cnt_matched,
            cnt_transferred: self.cnt_transferred,
            cnt_archived: self.cnt_archived,
            cnt_skipped: self.cnt_skipped,
            found_file: self.found_file,
            path_archive: self.path_archive,
            paths_archived: self.paths_archived,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}
