use std::fs;
use std::path::Path;

use log::info;
use snafu::ResultExt;

use crate::roster::{RosterResult, WritingOutputSnafu};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Resolves a path of the configuration file against the directory of that file.
/// `stdout` and absolute paths are returned unchanged.
pub fn resolve_path(root: &Path, path: &str) -> String {
    if path == "stdout" || Path::new(path).is_absolute() {
        return path.to_string();
    }
    root.join(path).to_string_lossy().to_string()
}

/// Writes the content to the given file, or to the standard output for `stdout` or
/// an empty path. The parent directories are created when missing.
pub fn write_output(path: &str, content: &str) -> RosterResult<()> {
    if path.is_empty() || path == "stdout" {
        println!("{}", content);
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingOutputSnafu { path })?;
        }
    }
    fs::write(path, content).context(WritingOutputSnafu { path })?;
    info!("Wrote {}", path);
    Ok(())
}
