//! Command-line argument model for `findkit`.

use std::ffi::OsString;

use clap::{Parser, ValueEnum};
use findkit_io_fs::conf::C_NAME_ARCHIVE_DEFAULT;
use findkit_io_fs::{EnumArchiveOpenMode, EnumFindPatternMode, SpecFindOptions};

/// Locate a file in a directory tree, copy or move it, or archive files by extension
#[derive(Parser, Debug, Clone)]
#[command(
    name = "findkit",
    version,
    about = "Locate a file in a directory tree, copy or move it, or archive files by extension",
    long_about = "The number of positional arguments selects the mode:\n\n  \
                  2  ROOT NAME                    print the path of NAME\n  \
                  4  ROOT STORAGE -cp|-mv NAME    copy or move NAME into STORAGE\n  \
                  3  ROOT STORAGE PATTERN         gzip every file whose name contains PATTERN\n\n\
                  Options must come before the positional arguments.",
    after_help = "EXAMPLES:\n    \
        findkit ~/projects notes.txt\n    \
        findkit ~/projects ~/backup -cp notes.txt\n    \
        findkit ~/projects ~/backup .log\n    \
        findkit --rule-pattern glob ~/projects ~/backup '*.log'"
)]
pub struct CliArgs {
    /// Positional arguments; their count selects the mode
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<OsString>,

    /// Verbose output (debug-level logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// How the archive pattern is matched against base names
    #[arg(long, value_enum, default_value_t = ArgPatternMode::Literal, value_name = "MODE")]
    pub rule_pattern: ArgPatternMode,

    /// Archive file name inside the storage directory
    #[arg(
        long,
        default_value = C_NAME_ARCHIVE_DEFAULT,
        env = "FINDKIT_ARCHIVE_NAME",
        value_name = "NAME"
    )]
    pub archive_name: String,

    /// Truncate and reopen the archive for every match (keeps only the last file)
    #[arg(long)]
    pub reopen_archive_per_match: bool,

    /// End the walk at the first match in locate and transfer modes
    #[arg(long)]
    pub stop_at_first_match: bool,

    /// Print a one-line run summary to stderr
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArgPatternMode {
    /// Base name contains the pattern
    Literal,
    /// Shell wildcards against the whole base name
    Glob,
    /// Regular expression search in the base name
    Regex,
}

impl From<ArgPatternMode> for EnumFindPatternMode {
    fn from(value: ArgPatternMode) -> Self {
        match value {
            ArgPatternMode::Literal => Self::Literal,
            ArgPatternMode::Glob => Self::Glob,
            ArgPatternMode::Regex => Self::Regex,
        }
    }
}

impl CliArgs {
    /// Map flags onto library run options.
    pub fn to_find_options(&self) -> SpecFindOptions {
        SpecFindOptions {
            rule_pattern: self.rule_pattern.into(),
            rule_archive_open: if self.reopen_archive_per_match {
                EnumArchiveOpenMode::ReopenPerMatch
            } else {
                EnumArchiveOpenMode::OncePerRun
            },
            name_archive: self.archive_name.clone(),
            if_stop_at_first_match: self.stop_at_first_match,
            ..SpecFindOptions::default()
        }
    }
}
