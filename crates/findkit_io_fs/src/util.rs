use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::bytes::Regex;

use crate::spec::{EnumFindPatternMode, FindTreeError, PathJoinError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// Compiled base-name pattern for archive mode.
#[derive(Debug, Clone)]
pub(crate) enum TypeNamePattern {
    Literal(Vec<u8>),
    Glob(GlobMatcher),
    Regex(Regex),
}

impl TypeNamePattern {
    pub(crate) fn compile(
        pattern: &OsStr,
        rule_pattern: EnumFindPatternMode,
    ) -> Result<Self, FindTreeError> {
        match rule_pattern {
            EnumFindPatternMode::Literal => Ok(Self::Literal(pattern.as_encoded_bytes().to_vec())),
            EnumFindPatternMode::Glob => {
                let matcher = Glob::new(_require_utf8(pattern)?)
                    .map_err(|e| FindTreeError::InvalidPattern(e.to_string()))?
                    .compile_matcher();
                Ok(Self::Glob(matcher))
            }
            EnumFindPatternMode::Regex => {
                let regex = Regex::new(_require_utf8(pattern)?)
                    .map_err(|e| FindTreeError::InvalidPattern(e.to_string()))?;
                Ok(Self::Regex(regex))
            }
        }
    }

    pub(crate) fn is_match(&self, name: &OsStr) -> bool {
        match self {
            Self::Literal(raw_pattern) => contains_bytes(name.as_encoded_bytes(), raw_pattern),
            Self::Glob(matcher) => matcher.is_match(Path::new(name)),
            Self::Regex(regex) => regex.is_match(name.as_encoded_bytes()),
        }
    }
}

fn _require_utf8(pattern: &OsStr) -> Result<&str, FindTreeError> {
    pattern.to_str().ok_or_else(|| {
        FindTreeError::InvalidPattern(format!(
            "Pattern is not valid UTF-8: {}",
            pattern.to_string_lossy()
        ))
    })
}

/// Substring test with `strstr` semantics: an empty needle always matches.
pub(crate) fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// `true` when `path` exists and resolves to a directory.
pub fn is_directory<P: AsRef<Path>>(path: P) -> bool {
    fs::metadata(path.as_ref())
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

/// Join `dir/name`, failing when the result would not fit in `n_len_path_max`
/// bytes including a terminator.
pub fn join_checked(
    path_dir: &Path,
    name: &OsStr,
    n_len_path_max: usize,
) -> Result<PathBuf, PathJoinError> {
    let path_joined = path_dir.join(name);
    if path_joined.as_os_str().len() >= n_len_path_max {
        return Err(PathJoinError {
            path: path_joined,
            limit: n_len_path_max,
        });
    }
    Ok(path_joined)
}

/// Offset of the final component `name` inside `path`.
///
/// A root given with a trailing separator (`root/`) still resolves to the
/// start of `root`.
pub(crate) fn derive_base_offset(path: &Path, name: &OsStr) -> usize {
    let raw_path = path.as_os_str().as_encoded_bytes();
    let raw_name = name.as_encoded_bytes();
    if raw_name.is_empty() || raw_name.len() > raw_path.len() {
        return 0;
    }
    raw_path
        .windows(raw_name.len())
        .rposition(|w| w == raw_name)
        .unwrap_or(0)
}

/// `true` when both paths resolve to the same existing file.
pub(crate) fn is_same_file(path_a: &Path, path_b: &Path) -> bool {
    match (fs::canonicalize(path_a), fs::canonicalize(path_b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
