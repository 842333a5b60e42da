//! Physical depth-first directory traversal.

use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::spec::{EnumEntryKind, EnumVisitResult, FindTreeError, SpecFindOptions};
use crate::util::derive_base_offset;

/// One entry handed to a visitor.
#[derive(Debug, Clone)]
pub struct SpecWalkEntry {
    /// Full path as reached from the root (`root/sub/name`).
    pub path: PathBuf,
    /// `lstat` metadata; symlinks describe the link itself.
    pub metadata: Metadata,
    pub kind: EnumEntryKind,
    /// Byte offset of the base name within `path`.
    pub n_offset_base: usize,
    /// Depth below the root (root = 0).
    pub n_depth: usize,
    name: OsString,
}

impl SpecWalkEntry {
    /// Base name (final path component).
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Directory containing this entry.
    pub fn dir_parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Counters for one completed walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpecWalkSummary {
    pub cnt_visited: u64,
    pub cnt_matched: u64,
    pub cnt_errors: u64,
    /// The walk ended before the tree was exhausted.
    pub if_stopped_early: bool,
}

/// Per-entry callback driven by [`walk_tree`].
pub trait VisitEntry {
    fn visit(&mut self, entry: &SpecWalkEntry) -> EnumVisitResult;

    /// Checked after every visit; `true` ends the walk.
    fn should_stop(&self) -> bool {
        false
    }
}

impl<F> VisitEntry for F
where
    F: FnMut(&SpecWalkEntry) -> EnumVisitResult,
{
    fn visit(&mut self, entry: &SpecWalkEntry) -> EnumVisitResult {
        self(entry)
    }
}

/// Walk `path_dir_root` depth-first (pre-order), calling `visitor` once per
/// entry, the root included.
///
/// Symbolic links are reported as [`EnumEntryKind::Symlink`] and never
/// followed. At most `n_max_open_dirs` directory handles are held open at a
/// time. A directory or entry that cannot be read aborts the walk with
/// [`FindTreeError::Traversal`]; visitor side effects that already happened
/// stay in place.
pub fn walk_tree<V>(
    path_dir_root: &Path,
    spec_find_options: &SpecFindOptions,
    visitor: &mut V,
) -> Result<SpecWalkSummary, FindTreeError>
where
    V: VisitEntry + ?Sized,
{
    let iter_entries = WalkDir::new(path_dir_root)
        .follow_links(false)
        .max_open(spec_find_options.n_max_open_dirs.max(1))
        .into_iter();

    let mut summary = SpecWalkSummary::default();
    for _entry_res in iter_entries {
        let dir_entry = _entry_res.map_err(|e| FindTreeError::Traversal {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| path_dir_root.to_path_buf()),
            message: e.to_string(),
        })?;
        let metadata = dir_entry
            .metadata()
            .map_err(|e| FindTreeError::Traversal {
                path: dir_entry.path().to_path_buf(),
                message: e.to_string(),
            })?;

        let name = dir_entry.file_name().to_os_string();
        let n_offset_base = derive_base_offset(dir_entry.path(), &name);
        let entry = SpecWalkEntry {
            kind: EnumEntryKind::from_file_type(dir_entry.file_type()),
            n_depth: dir_entry.depth(),
            path: dir_entry.into_path(),
            metadata,
            n_offset_base,
            name,
        };
        trace!(path = %entry.path.display(), kind = ?entry.kind, depth = entry.n_depth, "visit");

        summary.cnt_visited += 1;
        match visitor.visit(&entry) {
            EnumVisitResult::Continue => {}
            EnumVisitResult::Matched => {
                summary.cnt_matched += 1;
                if spec_find_options.if_stop_at_first_match {
                    summary.if_stopped_early = true;
                }
            }
            EnumVisitResult::Error => summary.cnt_errors += 1,
        }
        if visitor.should_stop() {
            summary.if_stopped_early = true;
        }
        if summary.if_stopped_early {
            debug!(path = %entry.path.display(), "walk stopped early");
            break;
        }
    }

    Ok(summary)
}
