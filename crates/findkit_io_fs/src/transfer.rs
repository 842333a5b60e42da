//! Single-file copy and move.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::spec::{EnumTransferMode, TransferError};
use crate::util::is_same_file;

/// Copy `path_file_src` to `path_file_dst` through a `n_buffer_size` buffer.
///
/// The destination is created or truncated. On any failure both handles are
/// closed and a partially written destination is left in place. Returns the
/// number of bytes copied.
pub fn copy_file_buffered(
    path_file_src: &Path,
    path_file_dst: &Path,
    n_buffer_size: usize,
) -> Result<u64, TransferError> {
    if is_same_file(path_file_src, path_file_dst) {
        return Err(TransferError::SameFile {
            path: path_file_src.to_path_buf(),
        });
    }

    let mut file_src = File::open(path_file_src).map_err(|source| TransferError::OpenSource {
        path: path_file_src.to_path_buf(),
        source,
    })?;
    let mut file_dst =
        File::create(path_file_dst).map_err(|source| TransferError::OpenDestination {
            path: path_file_dst.to_path_buf(),
            source,
        })?;

    let mut buffer = vec![0_u8; n_buffer_size.max(1)];
    let mut n_bytes_total = 0_u64;
    loop {
        let n_read = match file_src.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(TransferError::Read {
                    path: path_file_src.to_path_buf(),
                    source,
                });
            }
        };
        file_dst
            .write_all(&buffer[..n_read])
            .map_err(|source| TransferError::Write {
                path: path_file_dst.to_path_buf(),
                source,
            })?;
        n_bytes_total += n_read as u64;
    }
    file_dst.flush().map_err(|source| TransferError::Write {
        path: path_file_dst.to_path_buf(),
        source,
    })?;

    debug!(
        src = %path_file_src.display(),
        dst = %path_file_dst.display(),
        bytes = n_bytes_total,
        "copied"
    );
    Ok(n_bytes_total)
}

/// Rename `path_file_src` onto `path_file_dst`.
///
/// Fails (e.g. `EXDEV`) when the filesystem cannot rename; there is no
/// copy-and-delete fallback.
pub fn move_file(path_file_src: &Path, path_file_dst: &Path) -> Result<(), TransferError> {
    fs::rename(path_file_src, path_file_dst).map_err(|source| TransferError::Rename {
        path_src: path_file_src.to_path_buf(),
        path_dst: path_file_dst.to_path_buf(),
        source,
    })?;
    debug!(src = %path_file_src.display(), dst = %path_file_dst.display(), "moved");
    Ok(())
}

/// Apply `rule_transfer` to one file.
pub fn transfer_file(
    path_file_src: &Path,
    path_file_dst: &Path,
    rule_transfer: EnumTransferMode,
    n_buffer_size: usize,
) -> Result<(), TransferError> {
    match rule_transfer {
        EnumTransferMode::Copy => {
            copy_file_buffered(path_file_src, path_file_dst, n_buffer_size).map(|_| ())
        }
        EnumTransferMode::Move => move_file(path_file_src, path_file_dst),
    }
}
