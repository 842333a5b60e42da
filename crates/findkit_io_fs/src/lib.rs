//! `findkit_io_fs` v1:
//! Rust-side file locate / transfer / archive engine.
//!
//! Modules:
//! - `find`     : operation entry point (`find_tree`)
//! - `walk`     : physical depth-first traversal
//! - `visit`    : match-and-act visitors
//! - `transfer` : single-file copy and move
//! - `archive`  : gzip stream writer
//! - `spec`     : enums/options/errors
//! - `report`   : run-time report model
//! - `conf`     : defaults and status lines
//! - `util`     : shared helper functions

pub mod archive;
pub mod conf;
pub mod find;
pub mod report;
pub mod spec;
pub mod transfer;
mod util;
pub mod visit;
pub mod walk;

pub use archive::{ArchiveWriter, EnumAppendOutcome};
pub use find::find_tree;
pub use report::{ReportFind, ReportFindBuilder};
pub use spec::{
    ArchiveError, EnumArchiveOpenMode, EnumEntryKind, EnumFindMode, EnumFindPatternMode,
    EnumTransferMode, EnumVisitResult, FindTreeError, PathJoinError, SpecFindContext,
    SpecFindError, SpecFindOptions, TransferError,
};
pub use transfer::{copy_file_buffered, move_file, transfer_file};
pub use util::{is_directory, join_checked};
pub use visit::{ExtensionVisitor, MatchVisitor};
pub use walk::{SpecWalkEntry, SpecWalkSummary, VisitEntry, walk_tree};
