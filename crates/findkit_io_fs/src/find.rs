use std::ffi::OsStr;
use std::io::Write;

use tracing::debug;

use crate::conf::C_MSG_SEARCH_UNSUCCESSFUL;
use crate::report::{ReportFind, ReportFindBuilder};
use crate::spec::{EnumFindMode, FindTreeError, SpecFindContext, SpecFindOptions};
use crate::util::{is_directory, join_checked};
use crate::visit::{ExtensionVisitor, MatchVisitor};
use crate::walk::walk_tree;

/// Run one find operation described by `spec_find_context`.
///
/// Status lines (found paths, `Search Successful`, `Search Unsuccessful` and
/// friends) are written to `out` in visit order. Diagnostics go through
/// `tracing`.
///
/// # Errors
/// - [`FindTreeError::RootNotDirectory`] when the root is missing or not a
///   directory.
/// - [`FindTreeError::StorageNotDirectory`] in archive mode when the storage
///   directory is invalid. Transfer mode checks storage per match instead and
///   records the failure in the report.
/// - [`FindTreeError::InvalidPattern`] / [`FindTreeError::PathTooLong`] for
///   archive setup.
/// - [`FindTreeError::Traversal`] when the walk cannot continue.
/// - [`FindTreeError::ArchiveInit`] when the archive file cannot be created.
pub fn find_tree(
    spec_find_context: &SpecFindContext,
    out: &mut dyn Write,
) -> Result<ReportFind, FindTreeError> {
    let path_dir_root = spec_find_context.path_dir_root.as_path();
    let spec_find_options = &spec_find_context.spec_find_options;
    if !is_directory(path_dir_root) {
        return Err(FindTreeError::RootNotDirectory(path_dir_root.to_path_buf()));
    }

    let report = match &spec_find_context.enum_mode {
        EnumFindMode::Locate { name_target } => {
            let mut visitor = MatchVisitor::new(name_target, spec_find_options, &mut *out);
            walk_tree(path_dir_root, spec_find_options, &mut visitor)?;
            _finish_single_match(visitor.into_report_builder(), out)
        }
        EnumFindMode::Transfer {
            name_target,
            path_dir_storage,
            rule_transfer,
        } => {
            let mut visitor = MatchVisitor::new(name_target, spec_find_options, &mut *out)
                .with_transfer(path_dir_storage, *rule_transfer);
            walk_tree(path_dir_root, spec_find_options, &mut visitor)?;
            _finish_single_match(visitor.into_report_builder(), out)
        }
        EnumFindMode::Archive {
            pattern,
            path_dir_storage,
        } => {
            if !is_directory(path_dir_storage) {
                return Err(FindTreeError::StorageNotDirectory(
                    path_dir_storage.clone(),
                ));
            }
            let path_file_archive = join_checked(
                path_dir_storage,
                OsStr::new(&spec_find_options.name_archive),
                spec_find_options.n_len_path_max,
            )?;
            debug!(
                root = %path_dir_root.display(),
                archive = %path_file_archive.display(),
                "archive run"
            );
            // Archive mode always walks the whole tree.
            let spec_walk_options = SpecFindOptions {
                if_stop_at_first_match: false,
                ..spec_find_options.clone()
            };
            let mut visitor =
                ExtensionVisitor::new(pattern, path_file_archive, spec_find_options, &mut *out)?;
            walk_tree(path_dir_root, &spec_walk_options, &mut visitor)?;
            visitor.finish()?.build()
        }
    };

    debug!(summary = %report, "find finished");
    Ok(report)
}

fn _finish_single_match(
    mut builder_find_report: ReportFindBuilder,
    out: &mut dyn Write,
) -> ReportFind {
    if builder_find_report.found_file.is_none()
        && let Err(e) = writeln!(out, "{C_MSG_SEARCH_UNSUCCESSFUL}")
    {
        builder_find_report.add_warning(format!("Failed to write output line ({e})"));
    }
    builder_find_report.build()
}
