use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;

/// A trace file found in a directory, and where its results should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePaths {
    pub trace: PathBuf,
    pub result: PathBuf,
}

/// Finds every `<name>.trace` file in a directory, sorted by file name
///
/// Each is paired with a `<name>.result` path alongside it
pub fn discover_traces(directory: &Path) -> Result<Vec<TracePaths>, String> {
    let trace_pattern = Regex::new(r"^(?P<name>[0-9a-zA-Z_.-]+)\.trace$").map_err(|e| e.to_string())?;
    let entries = fs::read_dir(directory).map_err(|e| format!("Couldn't read the trace directory {}: {e}", directory.display()))?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Couldn't read an entry of {}: {e}", directory.display()))?;
        // Names which aren't valid UTF-8 can't match the pattern anyway
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(tokens) = trace_pattern.captures(&file_name) else {
            continue;
        };
        if !entry.path().is_file() {
            continue;
        }
        let name = &tokens["name"];
        out.push(TracePaths {
            trace: entry.path(),
            result: directory.join(format!("{name}.result")),
        });
    }
    out.sort_by(|a, b| a.trace.file_name().cmp(&b.trace.file_name()));
    Ok(out)
}
