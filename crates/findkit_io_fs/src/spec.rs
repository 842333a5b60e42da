//! Find specification models and top-level error types.

use std::ffi::{OsStr, OsString};
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::conf::{
    C_FLAG_COPY, C_FLAG_MOVE, C_NAME_ARCHIVE_DEFAULT, N_BUFFER_SIZE_DEFAULT,
    N_LEN_PATH_MAX_DEFAULT, N_MAX_OPEN_DIRS_DEFAULT,
};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Operation applied to the first matching file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumTransferMode {
    /// Stream the bytes into a new destination file; the source stays.
    Copy,
    /// Rename the source onto the destination path.
    Move,
}

impl EnumTransferMode {
    /// Parse a command-line operation flag (`-cp` or `-mv`).
    pub fn from_flag(flag: &str) -> Result<Self, FindTreeError> {
        match flag {
            C_FLAG_COPY => Ok(Self::Copy),
            C_FLAG_MOVE => Ok(Self::Move),
            _ => Err(FindTreeError::InvalidOperation(flag.to_string())),
        }
    }

    pub fn as_flag(self) -> &'static str {
        match self {
            Self::Copy => C_FLAG_COPY,
            Self::Move => C_FLAG_MOVE,
        }
    }

    /// Verb used in the success line (`File copied to the storageDir`).
    pub fn as_past_tense(self) -> &'static str {
        match self {
            Self::Copy => "copied",
            Self::Move => "moved",
        }
    }
}

/// Pattern matching mode for archive-mode base names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFindPatternMode {
    /// Byte-wise substring search (`readme.logfile` contains `.log`).
    Literal,
    /// Shell-like wildcards matched against the whole base name.
    Glob,
    /// Unanchored regular expression search.
    Regex,
}

/// Archive stream lifetime policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumArchiveOpenMode {
    /// Open on the first match and append every later match.
    OncePerRun,
    /// Truncate and reopen for every match; only the last match survives.
    ReopenPerMatch,
}

/// Filesystem entry classification reported by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumEntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EnumEntryKind {
    /// Classify from an `lstat`-style file type (symlinks are not followed).
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// Per-entry visitor outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumVisitResult {
    Continue,
    Matched,
    Error,
}

/// Operating mode selected by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumFindMode {
    /// Report the path of the file named `name_target`.
    Locate { name_target: OsString },
    /// Copy or move the file named `name_target` into `path_dir_storage`.
    Transfer {
        name_target: OsString,
        path_dir_storage: PathBuf,
        rule_transfer: EnumTransferMode,
    },
    /// Collect every file whose base name matches `pattern` into one archive.
    Archive {
        pattern: OsString,
        path_dir_storage: PathBuf,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Run options shared by every mode.
#[derive(Debug, Clone)]
pub struct SpecFindOptions {
    /// Pattern interpretation for archive mode.
    pub rule_pattern: EnumFindPatternMode,
    /// Archive stream lifetime.
    pub rule_archive_open: EnumArchiveOpenMode,
    /// Archive file name inside the storage directory.
    pub name_archive: String,
    /// End the walk after the first `Matched` visit.
    pub if_stop_at_first_match: bool,
    /// Directory handle budget of the walker.
    pub n_max_open_dirs: usize,
    /// Maximum constructed path length in bytes (terminator included).
    pub n_len_path_max: usize,
    /// Streaming buffer size for copy and archive.
    pub n_buffer_size: usize,
}

impl Default for SpecFindOptions {
    fn default() -> Self {
        Self {
            rule_pattern: EnumFindPatternMode::Literal,
            rule_archive_open: EnumArchiveOpenMode::OncePerRun,
            name_archive: C_NAME_ARCHIVE_DEFAULT.to_string(),
            if_stop_at_first_match: false,
            n_max_open_dirs: N_MAX_OPEN_DIRS_DEFAULT,
            n_len_path_max: N_LEN_PATH_MAX_DEFAULT,
            n_buffer_size: N_BUFFER_SIZE_DEFAULT,
        }
    }
}

/// Immutable per-run traversal context built once by the dispatcher.
#[derive(Debug, Clone)]
pub struct SpecFindContext {
    pub path_dir_root: PathBuf,
    pub enum_mode: EnumFindMode,
    pub spec_find_options: SpecFindOptions,
}

impl SpecFindContext {
    pub fn locate<P, S>(dir_root: P, name_target: S) -> Self
    where
        P: AsRef<Path>,
        S: AsRef<OsStr>,
    {
        Self {
            path_dir_root: dir_root.as_ref().to_path_buf(),
            enum_mode: EnumFindMode::Locate {
                name_target: name_target.as_ref().to_os_string(),
            },
            spec_find_options: SpecFindOptions::default(),
        }
    }

    pub fn transfer<P, Q, S>(
        dir_root: P,
        dir_storage: Q,
        rule_transfer: EnumTransferMode,
        name_target: S,
    ) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        S: AsRef<OsStr>,
    {
        Self {
            path_dir_root: dir_root.as_ref().to_path_buf(),
            enum_mode: EnumFindMode::Transfer {
                name_target: name_target.as_ref().to_os_string(),
                path_dir_storage: dir_storage.as_ref().to_path_buf(),
                rule_transfer,
            },
            spec_find_options: SpecFindOptions::default(),
        }
    }

    pub fn archive<P, Q, S>(dir_root: P, dir_storage: Q, pattern: S) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        S: AsRef<OsStr>,
    {
        Self {
            path_dir_root: dir_root.as_ref().to_path_buf(),
            enum_mode: EnumFindMode::Archive {
                pattern: pattern.as_ref().to_os_string(),
                path_dir_storage: dir_storage.as_ref().to_path_buf(),
            },
            spec_find_options: SpecFindOptions::default(),
        }
    }

    /// Replace the run options.
    pub fn with_options(mut self, spec_find_options: SpecFindOptions) -> Self {
        self.spec_find_options = spec_find_options;
        self
    }
}

/// One per-entry failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFindError {
    /// Failed source, destination or archive path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// A constructed path would exceed the configured length bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Path exceeds {limit} bytes: {}", .path.display())]
pub struct PathJoinError {
    pub path: PathBuf,
    pub limit: usize,
}

/// "Top-level call failed" errors (validation / traversal / archive setup).
#[derive(Debug, Error)]
pub enum FindTreeError {
    #[error("Invalid rootDir: {}", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("Invalid storageDir: {}", .0.display())]
    StorageNotDirectory(PathBuf),
    #[error("Invalid operation: `{0}`. Expected one of: ['-cp', '-mv']")]
    InvalidOperation(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error(transparent)]
    PathTooLong(#[from] PathJoinError),
    /// Root unreadable, or a directory/entry unreadable mid-walk.
    #[error("Failed to traverse {}: {message}", .path.display())]
    Traversal { path: PathBuf, message: String },
    /// The archive file could not be created.
    #[error("Failed to open archive {}: {source}", .path.display())]
    ArchiveInit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Single-file copy / move failures.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to open source file {}: {source}", .path.display())]
    OpenSource { path: PathBuf, source: io::Error },
    #[error("Failed to open destination file {}: {source}", .path.display())]
    OpenDestination { path: PathBuf, source: io::Error },
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to rename {} -> {}: {source}", .path_src.display(), .path_dst.display())]
    Rename {
        path_src: PathBuf,
        path_dst: PathBuf,
        source: io::Error,
    },
    /// Copying a file onto itself would truncate the source.
    #[error("Source and destination are the same file: {}", .path.display())]
    SameFile { path: PathBuf },
}

/// Archive stream failures.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("Error writing {} to archive: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to finish archive {}: {source}", .path.display())]
    Finish { path: PathBuf, source: io::Error },
    #[error(transparent)]
    PathTooLong(#[from] PathJoinError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{EnumTransferMode, FindTreeError, SpecFindOptions};

    #[test]
    fn transfer_mode_parses_only_known_flags() {
        assert_eq!(
            EnumTransferMode::from_flag("-cp").expect("copy flag"),
            EnumTransferMode::Copy
        );
        assert_eq!(
            EnumTransferMode::from_flag("-mv").expect("move flag"),
            EnumTransferMode::Move
        );

        let err = EnumTransferMode::from_flag("-rm").expect_err("unknown flag must fail");
        assert!(matches!(err, FindTreeError::InvalidOperation(ref v) if v == "-rm"));
        assert!(EnumTransferMode::from_flag("cp").is_err());
    }

    #[test]
    fn find_options_defaults() {
        let spec_find_options = SpecFindOptions::default();
        assert_eq!(spec_find_options.n_max_open_dirs, 20);
        assert_eq!(spec_find_options.n_buffer_size, 1024);
        assert_eq!(spec_find_options.name_archive, "a1.tar");
        assert!(!spec_find_options.if_stop_at_first_match);
    }
}
