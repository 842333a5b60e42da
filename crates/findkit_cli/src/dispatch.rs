//! Positional-count dispatch, argument validation and exit-code mapping.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use findkit_io_fs::conf::C_MSG_INVALID_STORAGE_DIR;
use findkit_io_fs::{
    EnumTransferMode, FindTreeError, SpecFindContext, SpecFindOptions, find_tree, is_directory,
};
use tracing::debug;

const C_MSG_INVALID_ROOT_DIR: &str = "Invalid rootDir";
const C_MSG_INVALID_OPERATION: &str = "Invalid operation";
const C_MSG_INVALID_ARG_COUNT: &str = "Invalid number of arguments";

/// Select the mode from `l_args`, run it and map the outcome to an exit code.
///
/// Status lines go to `out`. Argument errors, traversal errors and per-entry
/// failures recorded in the report go to `err`. Returns `Err` only when one of
/// the sinks cannot be written.
pub fn dispatch(
    l_args: &[OsString],
    spec_find_options: SpecFindOptions,
    if_summary: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<ExitCode> {
    let Some(spec_find_context) = _build_context(l_args, out, err)? else {
        out.flush()?;
        return Ok(ExitCode::FAILURE);
    };
    let spec_find_context = spec_find_context.with_options(spec_find_options);
    debug!(
        root = %spec_find_context.path_dir_root.display(),
        mode = ?spec_find_context.enum_mode,
        "dispatch"
    );

    let res_find = find_tree(&spec_find_context, out);
    out.flush()?;
    match res_find {
        Ok(report) => {
            for spec_find_error in &report.errors {
                writeln!(err, "{}", spec_find_error.exception)?;
            }
            if if_summary {
                writeln!(err, "{report}")?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            _write_find_error(&e, out, err)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// `None` when validation failed; the reason has already been written.
fn _build_context(
    l_args: &[OsString],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Option<SpecFindContext>> {
    let spec_find_context = match l_args {
        [dir_root, name_target] => {
            if !is_directory(dir_root) {
                writeln!(err, "{C_MSG_INVALID_ROOT_DIR}")?;
                return Ok(None);
            }
            SpecFindContext::locate(dir_root, name_target)
        }
        [dir_root, dir_storage, flag_operation, name_target] => {
            if !is_directory(dir_root) {
                writeln!(err, "{C_MSG_INVALID_ROOT_DIR}")?;
                return Ok(None);
            }
            let Some(rule_transfer) = flag_operation
                .to_str()
                .and_then(|flag| EnumTransferMode::from_flag(flag).ok())
            else {
                writeln!(err, "{C_MSG_INVALID_OPERATION}")?;
                return Ok(None);
            };
            SpecFindContext::transfer(dir_root, dir_storage, rule_transfer, name_target)
        }
        [dir_root, dir_storage, pattern] => {
            let b_root_ok = is_directory(dir_root);
            let b_storage_ok = is_directory(dir_storage);
            if !b_root_ok {
                writeln!(err, "{C_MSG_INVALID_ROOT_DIR}")?;
            }
            if !b_storage_ok {
                writeln!(out, "{C_MSG_INVALID_STORAGE_DIR}")?;
            }
            if !(b_root_ok && b_storage_ok) {
                return Ok(None);
            }
            SpecFindContext::archive(dir_root, dir_storage, pattern)
        }
        _ => {
            writeln!(err, "{C_MSG_INVALID_ARG_COUNT}")?;
            return Ok(None);
        }
    };
    Ok(Some(spec_find_context))
}

fn _write_find_error(e: &FindTreeError, out: &mut dyn Write, err: &mut dyn Write) -> Result<()> {
    match e {
        FindTreeError::RootNotDirectory(_) => writeln!(err, "{C_MSG_INVALID_ROOT_DIR}")?,
        FindTreeError::StorageNotDirectory(_) => {
            writeln!(out, "{C_MSG_INVALID_STORAGE_DIR}")?;
            out.flush()?;
        }
        FindTreeError::InvalidOperation(_) => writeln!(err, "{C_MSG_INVALID_OPERATION}")?,
        other => writeln!(err, "Error: {other}")?,
    }
    Ok(())
}
