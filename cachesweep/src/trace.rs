use std::io::BufRead;
use std::path::Path;
use log::{debug, warn};
use crate::hex::{HEX_LOOKUP, INVALID_DIGIT};
use crate::io::{open_trace, TraceSource};

/// The kind of memory access in a trace record
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    /// Parses an operation name, ignoring case. `load` and `store` are accepted as synonyms
    pub fn parse(op: &str) -> Option<Self> {
        if op.eq_ignore_ascii_case("read") || op.eq_ignore_ascii_case("load") {
            Some(Access::Read)
        } else if op.eq_ignore_ascii_case("write") || op.eq_ignore_ascii_case("store") {
            Some(Access::Write)
        } else {
            None
        }
    }
}

/// A single trace record
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Operation {
    pub access: Access,
    pub address: u64,
}

/// A parsed trace, in file order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Trace {
    pub operations: Vec<Operation>,
    /// Lines which weren't a valid record, blank lines included
    pub skipped_lines: usize,
}

impl Trace {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations, skipped_lines: 0 }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn write_count(&self) -> usize {
        self.operations.iter().filter(|op| op.access == Access::Write).count()
    }
}

/// Parses a trace of `<op> <hex-address>` lines
///
/// Lines which don't split into exactly two fields, or whose operation isn't recognised, are
/// skipped. Lines with an unparsable address are skipped with a warning
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use cachesweep::trace::{parse_trace, Access};
/// let trace = parse_trace(Cursor::new("read 1f\nSTORE 20\nbogus\n"));
/// assert_eq!(trace.operations.len(), 2);
/// assert_eq!(trace.operations[1].access, Access::Write);
/// assert_eq!(trace.skipped_lines, 1);
/// ```
pub fn parse_trace(reader: impl BufRead) -> Trace {
    let mut trace = Trace::default();
    for (line_number, line) in reader.split(b'\n').enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Stopped reading the trace at line {}: {e}", line_number + 1);
                break;
            }
        };
        match parse_line(&line, line_number + 1) {
            Some(op) => trace.operations.push(op),
            None => trace.skipped_lines += 1,
        }
    }
    debug!("Parsed {} operations, skipped {} lines", trace.operations.len(), trace.skipped_lines);
    trace
}

fn parse_line(line: &[u8], line_number: usize) -> Option<Operation> {
    let line = std::str::from_utf8(line).ok()?;
    let mut fields = line.split_whitespace();
    let (op, address) = match (fields.next(), fields.next(), fields.next()) {
        (Some(op), Some(address), None) => (op, address),
        _ => return None,
    };
    let access = Access::parse(op)?;
    match parse_address(address.as_bytes()) {
        Some(address) => Some(Operation { access, address }),
        None => {
            warn!("Skipping line {line_number}: '{address}' is not a 64 bit hexadecimal address");
            None
        }
    }
}

/// Parses a hexadecimal address of any length, with or without a `0x` prefix
///
/// Digits are decoded with a lookup table generated at compile time in build.rs. Returns None if
/// the input is empty, contains a non-hex character, or doesn't fit in 64 bits. Leading zeros
/// don't count towards the limit
///
/// # Examples
///
/// ```
/// use cachesweep::trace::parse_address;
/// assert_eq!(parse_address(b"000000000000000A"), Some(10));
/// assert_eq!(parse_address(b"0x1F"), Some(31));
/// assert_eq!(parse_address(b"12g4"), None);
/// assert_eq!(parse_address(b"10000000000000000"), None);
/// ```
pub fn parse_address(buf: &[u8]) -> Option<u64> {
    let digits = match buf {
        [b'0', b'x' | b'X', rest @ ..] => rest,
        _ => buf,
    };
    if digits.is_empty() {
        return None;
    }
    let mut res: u64 = 0;
    for &byte in digits {
        let digit = HEX_LOOKUP[byte as usize];
        if digit == INVALID_DIGIT || res >> 60 != 0 {
            return None;
        }
        res = res << 4 | digit as u64;
    }
    Some(res)
}

/// Loads and parses a trace file
///
/// A missing file isn't an error: it is reported and treated as an empty trace, so a sweep still
/// produces a record for every configuration
///
/// # Arguments
///
/// * `path`: The trace file
///
/// returns: Result<Trace, String>, failing only if an existing file can't be read
pub fn load_trace(path: &Path) -> Result<Trace, String> {
    match open_trace(path)? {
        TraceSource::Missing => {
            warn!("Trace file '{}' not found, treating it as empty", path.display());
            Ok(Trace::default())
        }
        TraceSource::Empty => Ok(Trace::default()),
        TraceSource::Contents(reader) => Ok(parse_trace(reader)),
    }
}
