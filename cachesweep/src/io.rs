use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Reads a non-empty trace file from memory
#[cfg(unix)]
pub type TraceReader = std::io::Cursor<memmap2::Mmap>;

/// Reads a non-empty trace file through a buffer
#[cfg(not(unix))]
pub type TraceReader = std::io::BufReader<File>;

/// What was found at a trace path
#[derive(Debug)]
pub enum TraceSource {
    /// Nothing exists at the path
    Missing,
    /// The file exists but has no bytes, so there is nothing to map or read
    Empty,
    Contents(TraceReader),
}

/// Opens a trace file, classifying it before any bytes are read
///
/// # Arguments
///
/// * `path`: The trace file
///
/// returns: Result<TraceSource, String>, failing if an existing file can't be opened or mapped
pub fn open_trace(path: &Path) -> Result<TraceSource, String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TraceSource::Missing),
        Err(e) => return Err(format!("Couldn't open the trace file at path {}: {e}", path.display())),
    };
    let length = file.metadata().map_err(|e| format!("Couldn't read metadata for {}: {e}", path.display()))?.len();
    if length == 0 {
        return Ok(TraceSource::Empty);
    }
    reader_for(file, path).map(TraceSource::Contents)
}

#[cfg(unix)]
fn reader_for(file: File, path: &Path) -> Result<TraceReader, String> {
    use memmap2::{Advice, Mmap};
    // Safety: the mapping is read only, and traces aren't rewritten while a sweep replays them
    let mapped = unsafe { Mmap::map(&file) }.map_err(|e| format!("Couldn't map trace {}: {e}", path.display()))?;
    // Lines are parsed front to back exactly once
    mapped
        .advise(Advice::Sequential)
        .map_err(|e| format!("Couldn't advise sequential reads for {}: {e}", path.display()))?;
    Ok(std::io::Cursor::new(mapped))
}

#[cfg(not(unix))]
fn reader_for(file: File, _path: &Path) -> Result<TraceReader, String> {
    // Records are a couple of dozen bytes, so this holds a few thousand lines
    const TRACE_BUFFER: usize = 64 * 1024;
    Ok(std::io::BufReader::with_capacity(TRACE_BUFFER, file))
}
