//! Match-and-act visitors plugged into [`crate::walk::walk_tree`].

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::archive::{ArchiveWriter, EnumAppendOutcome};
use crate::conf::{C_MSG_INVALID_STORAGE_DIR, C_MSG_SEARCH_SUCCESSFUL};
use crate::report::ReportFindBuilder;
use crate::spec::{
    ArchiveError, EnumArchiveOpenMode, EnumEntryKind, EnumTransferMode, EnumVisitResult,
    FindTreeError, SpecFindOptions,
};
use crate::transfer::transfer_file;
use crate::util::{TypeNamePattern, is_directory, is_same_file, join_checked};
use crate::walk::{SpecWalkEntry, VisitEntry};

/// Write one status line, demoting sink failures to report warnings.
fn emit_line(out: &mut dyn Write, line: &str, builder_find_report: &mut ReportFindBuilder) {
    if let Err(e) = writeln!(out, "{line}") {
        builder_find_report.add_warning(format!("Failed to write output line ({e})"));
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region MatchVisitor

/// Locate (and optionally transfer) the file whose base name equals the target.
///
/// Locate emits every match. With a transfer configured the first match wins:
/// later matches are counted and logged, never acted on.
pub struct MatchVisitor<'a> {
    name_target: &'a OsStr,
    spec_transfer: Option<(&'a Path, EnumTransferMode)>,
    spec_find_options: &'a SpecFindOptions,
    out: &'a mut dyn Write,
    builder_find_report: ReportFindBuilder,
}

impl<'a> MatchVisitor<'a> {
    pub fn new(
        name_target: &'a OsStr,
        spec_find_options: &'a SpecFindOptions,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            name_target,
            spec_transfer: None,
            spec_find_options,
            out,
            builder_find_report: ReportFindBuilder::default(),
        }
    }

    /// Copy or move the found file into `path_dir_storage`.
    pub fn with_transfer(
        mut self,
        path_dir_storage: &'a Path,
        rule_transfer: EnumTransferMode,
    ) -> Self {
        self.spec_transfer = Some((path_dir_storage, rule_transfer));
        self
    }

    pub fn found_file(&self) -> Option<&Path> {
        self.builder_find_report.found_file.as_deref()
    }

    pub fn into_report_builder(self) -> ReportFindBuilder {
        self.builder_find_report
    }

    fn emit(&mut self, line: &str) {
        emit_line(&mut *self.out, line, &mut self.builder_find_report);
    }

    fn transfer_found(
        &mut self,
        path_file_src: &Path,
        path_dir_storage: &Path,
        rule_transfer: EnumTransferMode,
    ) -> EnumVisitResult {
        if !is_directory(path_dir_storage) {
            self.emit(C_MSG_INVALID_STORAGE_DIR);
            self.builder_find_report.add_error(
                path_dir_storage.to_path_buf(),
                FindTreeError::StorageNotDirectory(path_dir_storage.to_path_buf()).to_string(),
            );
            return EnumVisitResult::Error;
        }

        let path_file_dst = match join_checked(
            path_dir_storage,
            self.name_target,
            self.spec_find_options.n_len_path_max,
        ) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "destination path rejected");
                self.builder_find_report
                    .add_error(e.path.clone(), e.to_string());
                return EnumVisitResult::Error;
            }
        };

        match transfer_file(
            path_file_src,
            &path_file_dst,
            rule_transfer,
            self.spec_find_options.n_buffer_size,
        ) {
            Ok(()) => {
                info!(
                    src = %path_file_src.display(),
                    dst = %path_file_dst.display(),
                    operation = rule_transfer.as_flag(),
                    "transfer finished"
                );
                self.builder_find_report.add_transferred();
                self.emit(C_MSG_SEARCH_SUCCESSFUL);
                self.emit(&format!(
                    "File {} to the storageDir",
                    rule_transfer.as_past_tense()
                ));
                EnumVisitResult::Matched
            }
            Err(e) => {
                error!(error = %e, "transfer failed");
                self.builder_find_report
                    .add_error(path_file_dst, e.to_string());
                EnumVisitResult::Error
            }
        }
    }
}

impl VisitEntry for MatchVisitor<'_> {
    fn visit(&mut self, entry: &SpecWalkEntry) -> EnumVisitResult {
        self.builder_find_report.add_scanned();
        if entry.kind != EnumEntryKind::File || entry.name() != self.name_target {
            return EnumVisitResult::Continue;
        }
        self.builder_find_report.add_matched();
        let if_first = self.builder_find_report.set_found_file(&entry.path);

        let Some((path_dir_storage, rule_transfer)) = self.spec_transfer else {
            // Locate reports every match; `found_file` stays the first one.
            debug!(path = %entry.path.display(), if_first, "target found");
            self.emit(&entry.path.display().to_string());
            return EnumVisitResult::Matched;
        };

        if !if_first {
            let path_first = self.found_file().map(Path::to_path_buf).unwrap_or_default();
            warn!(
                path = %entry.path.display(),
                first = %path_first.display(),
                "additional match ignored"
            );
            self.builder_find_report.add_warning(format!(
                "Additional match ignored: {} (first match: {})",
                entry.path.display(),
                path_first.display()
            ));
            return EnumVisitResult::Continue;
        }
        debug!(path = %entry.path.display(), "target found");
        self.transfer_found(&entry.path, path_dir_storage, rule_transfer)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExtensionVisitor

/// Append every file whose base name matches the pattern to one archive.
pub struct ExtensionVisitor<'a> {
    pattern: TypeNamePattern,
    path_file_archive: PathBuf,
    spec_find_options: &'a SpecFindOptions,
    out: &'a mut dyn Write,
    writer_archive: Option<ArchiveWriter>,
    err_fatal: Option<FindTreeError>,
    builder_find_report: ReportFindBuilder,
}

impl<'a> ExtensionVisitor<'a> {
    /// Compile `pattern` with `spec_find_options.rule_pattern`.
    pub fn new(
        pattern: &OsStr,
        path_file_archive: PathBuf,
        spec_find_options: &'a SpecFindOptions,
        out: &'a mut dyn Write,
    ) -> Result<Self, FindTreeError> {
        Ok(Self {
            pattern: TypeNamePattern::compile(pattern, spec_find_options.rule_pattern)?,
            path_file_archive,
            spec_find_options,
            out,
            writer_archive: None,
            err_fatal: None,
            builder_find_report: ReportFindBuilder::default(),
        })
    }

    /// Close the archive and hand back the report, or the fatal setup error.
    pub fn finish(mut self) -> Result<ReportFindBuilder, FindTreeError> {
        if let Some(err_fatal) = self.err_fatal.take() {
            return Err(err_fatal);
        }
        self.close_archive();
        Ok(self.builder_find_report)
    }

    fn emit(&mut self, line: &str) {
        emit_line(&mut *self.out, line, &mut self.builder_find_report);
    }

    fn close_archive(&mut self) {
        let Some(writer_archive) = self.writer_archive.take() else {
            return;
        };
        let path_file_archive = writer_archive.path().to_path_buf();
        if let Err(e) = writer_archive.close() {
            error!(error = %e, "archive close failed");
            self.builder_find_report
                .add_error(path_file_archive, e.to_string());
        }
    }

    /// Open the archive on first use. Truncates any earlier archive file.
    fn ensure_archive(&mut self) -> Result<&mut ArchiveWriter, FindTreeError> {
        if self.writer_archive.is_none() {
            let writer_archive = ArchiveWriter::open(&self.path_file_archive)
                .map_err(|e| match e {
                    ArchiveError::Open { path, source } => {
                        FindTreeError::ArchiveInit { path, source }
                    }
                    other => FindTreeError::ArchiveInit {
                        path: self.path_file_archive.clone(),
                        source: io::Error::other(other.to_string()),
                    },
                })?
                .with_limits(
                    self.spec_find_options.n_buffer_size,
                    self.spec_find_options.n_len_path_max,
                );
            self.builder_find_report
                .set_path_archive(&self.path_file_archive);
            self.writer_archive = Some(writer_archive);
        }
        self.writer_archive
            .as_mut()
            .ok_or_else(|| FindTreeError::ArchiveInit {
                path: self.path_file_archive.clone(),
                source: io::Error::other("archive writer unavailable"),
            })
    }
}

impl VisitEntry for ExtensionVisitor<'_> {
    fn visit(&mut self, entry: &SpecWalkEntry) -> EnumVisitResult {
        self.builder_find_report.add_scanned();
        if entry.kind != EnumEntryKind::File || !self.pattern.is_match(entry.name()) {
            return EnumVisitResult::Continue;
        }
        if entry.path == self.path_file_archive
            || is_same_file(&entry.path, &self.path_file_archive)
        {
            debug!(path = %entry.path.display(), "skip archive itself");
            self.builder_find_report.add_skipped();
            return EnumVisitResult::Continue;
        }
        self.builder_find_report.add_matched();
        self.emit(&entry.path.display().to_string());

        let res_append = match self.ensure_archive() {
            Ok(writer_archive) => writer_archive.append_file(entry.dir_parent(), entry.name()),
            Err(e) => {
                error!(error = %e, "archive open failed");
                self.err_fatal = Some(e);
                return EnumVisitResult::Error;
            }
        };

        let result = match res_append {
            Ok(EnumAppendOutcome::Appended(n_bytes)) => {
                info!(path = %entry.path.display(), bytes = n_bytes, "archived");
                self.builder_find_report.add_archived(entry.path.clone());
                EnumVisitResult::Matched
            }
            Ok(EnumAppendOutcome::SkippedDirectory | EnumAppendOutcome::SkippedUnreadable) => {
                self.builder_find_report.add_skipped();
                EnumVisitResult::Continue
            }
            Err(e) => {
                error!(error = %e, "archive write failed");
                self.builder_find_report
                    .add_error(entry.path.clone(), e.to_string());
                EnumVisitResult::Error
            }
        };

        if self.spec_find_options.rule_archive_open == EnumArchiveOpenMode::ReopenPerMatch {
            self.close_archive();
        }
        result
    }

    fn should_stop(&self) -> bool {
        self.err_fatal.is_some()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::io::Read;
    use std::path::Path;

    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    use super::{ExtensionVisitor, MatchVisitor};
    use crate::spec::{EnumArchiveOpenMode, EnumTransferMode, SpecFindOptions};
    use crate::walk::walk_tree;

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn read_gzip(path: &Path) -> String {
        let mut txt = String::new();
        GzDecoder::new(std::fs::File::open(path).expect("open archive"))
            .read_to_string(&mut txt)
            .expect("decode archive");
        txt
    }

    #[test]
    fn match_visitor_reports_found_path() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("a/notes.txt"), "n");
        write_text(&root.join("a/other.txt"), "o");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = MatchVisitor::new(OsStr::new("notes.txt"), &spec_find_options, &mut out);
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.into_report_builder().build();

        assert_eq!(report.found_file, Some(root.join("a/notes.txt")));
        assert_eq!(report.cnt_matched, 1);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            format!("{}\n", root.join("a/notes.txt").display())
        );
    }

    #[test]
    fn match_visitor_locate_reports_every_match() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("a/dup.txt"), "a");
        write_text(&root.join("b/dup.txt"), "b");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = MatchVisitor::new(OsStr::new("dup.txt"), &spec_find_options, &mut out);
        let summary = walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.into_report_builder().build();

        assert_eq!(summary.cnt_matched, 2);
        assert_eq!(report.cnt_matched, 2);
        assert_eq!(report.warning_count(), 0);

        let txt_out = String::from_utf8(out).expect("utf8");
        let mut l_lines: Vec<&str> = txt_out.lines().collect();
        l_lines.sort_unstable();
        let txt_a = root.join("a/dup.txt").display().to_string();
        let txt_b = root.join("b/dup.txt").display().to_string();
        assert_eq!(l_lines, vec![txt_a.as_str(), txt_b.as_str()]);

        let path_first = report.found_file.expect("found file");
        assert_eq!(txt_out.lines().next(), Some(path_first.display().to_string().as_str()));
    }

    #[test]
    fn match_visitor_records_failed_copy() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        let storage = tmp.path().join("storage");
        write_text(&root.join("x.txt"), "x");
        // A directory occupying the destination name cannot be opened for writing.
        std::fs::create_dir_all(storage.join("x.txt")).expect("create blocking dir");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = MatchVisitor::new(OsStr::new("x.txt"), &spec_find_options, &mut out)
            .with_transfer(&storage, EnumTransferMode::Copy);
        let summary = walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.into_report_builder().build();

        assert_eq!(summary.cnt_errors, 1);
        assert_eq!(report.cnt_transferred, 0);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].path, storage.join("x.txt"));
        assert!(
            report.errors[0]
                .exception
                .starts_with("Failed to open destination file")
        );
        assert!(out.is_empty());
        assert!(root.join("x.txt").exists());
    }

    #[test]
    fn match_visitor_is_case_sensitive_and_ignores_directories() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("Notes.txt"), "n");
        std::fs::create_dir_all(root.join("notes.txt")).expect("create dir named like target");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = MatchVisitor::new(OsStr::new("notes.txt"), &spec_find_options, &mut out);
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.into_report_builder().build();

        assert!(!report.is_found());
        assert!(out.is_empty());
    }

    #[test]
    fn match_visitor_first_match_wins_for_copy() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        let storage = tmp.path().join("storage");
        write_text(&root.join("a/dup.txt"), "first");
        write_text(&root.join("b/dup.txt"), "second");
        std::fs::create_dir_all(&storage).expect("create storage");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = MatchVisitor::new(OsStr::new("dup.txt"), &spec_find_options, &mut out)
            .with_transfer(&storage, EnumTransferMode::Copy);
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.into_report_builder().build();

        assert_eq!(report.cnt_matched, 2);
        assert_eq!(report.cnt_transferred, 1);
        assert_eq!(report.warning_count(), 1);
        let path_found = report.found_file.expect("found file");
        let txt_copied = std::fs::read_to_string(storage.join("dup.txt")).expect("read copy");
        let txt_found = std::fs::read_to_string(&path_found).expect("read found");
        assert_eq!(txt_copied, txt_found);

        let txt_out = String::from_utf8(out).expect("utf8");
        assert_eq!(txt_out, "Search Successful\nFile copied to the storageDir\n");
    }

    #[test]
    fn match_visitor_invalid_storage_mutates_nothing() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("x.txt"), "x");
        let storage = tmp.path().join("missing_storage");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = MatchVisitor::new(OsStr::new("x.txt"), &spec_find_options, &mut out)
            .with_transfer(&storage, EnumTransferMode::Move);
        let summary = walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.into_report_builder().build();

        assert_eq!(summary.cnt_errors, 1);
        assert_eq!(report.error_count(), 1);
        assert!(root.join("x.txt").exists());
        assert!(!storage.exists());
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Search Successful: Invalid storageDir\n"
        );
    }

    #[test]
    fn match_visitor_rejects_overlong_destination() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        let storage = tmp.path().join("storage");
        write_text(&root.join("x.txt"), "x");
        std::fs::create_dir_all(&storage).expect("create storage");

        let spec_find_options = SpecFindOptions {
            n_len_path_max: storage.as_os_str().len() + 2,
            ..SpecFindOptions::default()
        };
        let mut out = Vec::new();
        let mut visitor = MatchVisitor::new(OsStr::new("x.txt"), &spec_find_options, &mut out)
            .with_transfer(&storage, EnumTransferMode::Copy);
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.into_report_builder().build();

        assert_eq!(report.error_count(), 1);
        assert!(report.errors[0].exception.contains("exceeds"));
        assert!(!storage.join("x.txt").exists());
    }

    #[test]
    fn extension_visitor_appends_all_matches_by_default() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        let storage = tmp.path().join("storage");
        write_text(&root.join("a.log"), "A");
        write_text(&root.join("sub/b.log"), "B");
        write_text(&root.join("c.txt"), "C");
        std::fs::create_dir_all(&storage).expect("create storage");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = ExtensionVisitor::new(
            OsStr::new(".log"),
            storage.join("a1.tar"),
            &spec_find_options,
            &mut out,
        )
        .expect("visitor");
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.finish().expect("finish").build();

        assert_eq!(report.cnt_matched, 2);
        assert_eq!(report.cnt_archived, 2);
        let txt = read_gzip(&storage.join("a1.tar"));
        assert_eq!(txt.len(), 2);
        assert!(txt.contains('A') && txt.contains('B'));
        assert!(!txt.contains('C'));
    }

    #[test]
    fn extension_visitor_reopen_mode_keeps_last_match_only() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        let storage = tmp.path().join("storage");
        write_text(&root.join("a.log"), "A");
        write_text(&root.join("b.log"), "B");
        std::fs::create_dir_all(&storage).expect("create storage");

        let spec_find_options = SpecFindOptions {
            rule_archive_open: EnumArchiveOpenMode::ReopenPerMatch,
            ..SpecFindOptions::default()
        };
        let mut out = Vec::new();
        let mut visitor = ExtensionVisitor::new(
            OsStr::new(".log"),
            storage.join("a1.tar"),
            &spec_find_options,
            &mut out,
        )
        .expect("visitor");
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.finish().expect("finish").build();

        let path_last = report.paths_archived.last().expect("last archived");
        let txt_last = std::fs::read_to_string(path_last).expect("read last");
        assert_eq!(report.cnt_archived, 2);
        assert_eq!(read_gzip(&storage.join("a1.tar")), txt_last);
    }

    #[test]
    fn extension_visitor_never_reads_its_own_archive() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("data.tar.src"), "payload");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = ExtensionVisitor::new(
            OsStr::new(".tar"),
            root.join("a1.tar"),
            &spec_find_options,
            &mut out,
        )
        .expect("visitor");
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.finish().expect("finish").build();

        assert_eq!(report.paths_archived, vec![root.join("data.tar.src")]);
        assert_eq!(read_gzip(&root.join("a1.tar")), "payload");
    }

    #[test]
    fn extension_visitor_without_matches_creates_no_archive() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("root");
        let storage = tmp.path().join("storage");
        write_text(&root.join("c.txt"), "C");
        std::fs::create_dir_all(&storage).expect("create storage");

        let spec_find_options = SpecFindOptions::default();
        let mut out = Vec::new();
        let mut visitor = ExtensionVisitor::new(
            OsStr::new(".log"),
            storage.join("a1.tar"),
            &spec_find_options,
            &mut out,
        )
        .expect("visitor");
        walk_tree(&root, &spec_find_options, &mut visitor).expect("walk");
        let report = visitor.finish().expect("finish").build();

        assert_eq!(report.cnt_matched, 0);
        assert!(report.path_archive.is_none());
        assert!(!storage.join("a1.tar").exists());
    }
}
