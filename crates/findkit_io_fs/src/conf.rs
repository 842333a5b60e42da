//! Find constants and default presets.

/// Maximum number of directory handles the walker keeps open at once.
pub const N_MAX_OPEN_DIRS_DEFAULT: usize = 20;
/// Upper bound (bytes, terminator included) for constructed paths.
pub const N_LEN_PATH_MAX_DEFAULT: usize = 4096;
/// Intermediate buffer size for copy and archive streaming.
pub const N_BUFFER_SIZE_DEFAULT: usize = 1024;
/// Archive file name created inside the storage directory.
pub const C_NAME_ARCHIVE_DEFAULT: &str = "a1.tar";

/// Transfer operation flags accepted on the command line.
pub const C_FLAG_COPY: &str = "-cp";
pub const C_FLAG_MOVE: &str = "-mv";

/// Status lines written to the output sink.
pub const C_MSG_SEARCH_SUCCESSFUL: &str = "Search Successful";
pub const C_MSG_SEARCH_UNSUCCESSFUL: &str = "Search Unsuccessful";
pub const C_MSG_INVALID_STORAGE_DIR: &str = "Search Successful: Invalid storageDir";
