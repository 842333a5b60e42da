//! Gzip stream of raw, unframed file bytes.
//!
//! This is not a tar container: no name, size or mode header is written, so
//! successive files are indistinguishable once concatenated.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::conf::{N_BUFFER_SIZE_DEFAULT, N_LEN_PATH_MAX_DEFAULT};
use crate::spec::ArchiveError;
use crate::util::join_checked;

/// Result of appending one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumAppendOutcome {
    /// Bytes streamed into the archive.
    Appended(u64),
    /// The source turned out to be a directory.
    SkippedDirectory,
    /// The source could not be opened or read.
    SkippedUnreadable,
}

/// Open gzip output handle.
#[derive(Debug)]
pub struct ArchiveWriter {
    path_file_archive: PathBuf,
    encoder: GzEncoder<File>,
    n_buffer_size: usize,
    n_len_path_max: usize,
}

impl ArchiveWriter {
    /// Create (or truncate) the archive at `path_file_archive`.
    pub fn open<P: AsRef<Path>>(path_file_archive: P) -> Result<Self, ArchiveError> {
        let path_file_archive = path_file_archive.as_ref().to_path_buf();
        let file_archive = File::create(&path_file_archive).map_err(|source| {
            ArchiveError::Open {
                path: path_file_archive.clone(),
                source,
            }
        })?;
        debug!(path = %path_file_archive.display(), "archive opened");
        Ok(Self {
            path_file_archive,
            encoder: GzEncoder::new(file_archive, Compression::default()),
            n_buffer_size: N_BUFFER_SIZE_DEFAULT,
            n_len_path_max: N_LEN_PATH_MAX_DEFAULT,
        })
    }

    /// Override the streaming buffer size and path length bound.
    pub fn with_limits(mut self, n_buffer_size: usize, n_len_path_max: usize) -> Self {
        self.n_buffer_size = n_buffer_size.max(1);
        self.n_len_path_max = n_len_path_max;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path_file_archive
    }

    /// Stream `path_dir_src/name_file` into the archive.
    ///
    /// Sources that are directories or cannot be opened/read are skipped and
    /// reported through the outcome, not as errors. A read failure after some
    /// bytes were streamed leaves those bytes in the archive. Only a failed
    /// compressed write is an error.
    pub fn append_file(
        &mut self,
        path_dir_src: &Path,
        name_file: &OsStr,
    ) -> Result<EnumAppendOutcome, ArchiveError> {
        let path_file_src = join_checked(path_dir_src, name_file, self.n_len_path_max)?;

        let mut file_src = match File::open(&path_file_src) {
            Ok(v) => v,
            Err(e) => return Ok(_classify_skip(&path_file_src, &e)),
        };

        let mut buffer = vec![0_u8; self.n_buffer_size];
        let mut n_bytes_total = 0_u64;
        loop {
            let n_read = match file_src.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Ok(_classify_skip(&path_file_src, &e)),
            };
            self.encoder
                .write_all(&buffer[..n_read])
                .map_err(|source| ArchiveError::Write {
                    path: path_file_src.clone(),
                    source,
                })?;
            n_bytes_total += n_read as u64;
        }

        Ok(EnumAppendOutcome::Appended(n_bytes_total))
    }

    /// Write the gzip trailer and close the file.
    pub fn close(self) -> Result<(), ArchiveError> {
        let path_file_archive = self.path_file_archive;
        let mut file_archive = self
            .encoder
            .finish()
            .map_err(|source| ArchiveError::Finish {
                path: path_file_archive.clone(),
                source,
            })?;
        file_archive.flush().map_err(|source| ArchiveError::Finish {
            path: path_file_archive.clone(),
            source,
        })?;
        debug!(path = %path_file_archive.display(), "archive closed");
        Ok(())
    }
}

fn _classify_skip(path_file_src: &Path, e: &io::Error) -> EnumAppendOutcome {
    if e.kind() == io::ErrorKind::IsADirectory {
        debug!(path = %path_file_src.display(), "skip directory");
        return EnumAppendOutcome::SkippedDirectory;
    }
    debug!(path = %path_file_src.display(), error = %e, "skip unreadable");
    EnumAppendOutcome::SkippedUnreadable
}
