//! Diagnostic trace sink
//!
//! Every layer reports what it sends and receives through a single
//! [`DiagnosticSink`]. Tracing is observational: nothing in the decode path
//! looks at what the sink did with a line.

use std::fmt::Write;
use std::sync::{Arc, Mutex};

/// Log target used by [`LogSink`]
pub const TRACE_TARGET: &str = "sleeptracker::trace";

/// Receiver of human-readable trace lines
pub trait DiagnosticSink: Send + Sync {
    fn trace(&self, line: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn trace(&self, line: &str) {
        self(line)
    }
}

/// Forwards trace lines to the `log` facade at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn trace(&self, line: &str) {
        log::debug!(target: TRACE_TARGET, "{}", line);
    }
}

/// Discards every line
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn trace(&self, _line: &str) {}
}

/// Keeps every line in memory so the full trace can be shown afterwards
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines collected so far
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn trace(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// The sink used when the caller does not provide one
pub fn default_sink() -> SharedSink {
    Arc::new(LogSink)
}

/// Render bytes as space separated upper-case hex pairs
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, b) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", b);
    }
    out
}

/// One line per byte: offset, hex, decimal and printable character
pub fn byte_lines(data: &[u8]) -> impl Iterator<Item = String> + '_ {
    data.iter().enumerate().map(|(i, &b)| {
        let shown = if (32..127).contains(&b) {
            format!("'{}'", b as char)
        } else {
            ".".to_string()
        };
        format!("[{:3}] 0x{:02X}  dec={:3}  char={}", i, b, b, shown)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0xC0, 0x02, 0x00, 0xC0]), "C0 02 00 C0");
        assert_eq!(hex_dump(&[]), "");
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.trace("Opening port");
        sink.trace("Sending: C0 02 00 C0");
        assert_eq!(sink.lines().len(), 2);
        assert!(sink.contains("C0 02"));
    }

    #[test]
    fn test_closure_sink() {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let target = collected.clone();
        let sink: SharedSink = Arc::new(move |line: &str| {
            target.lock().unwrap().push(line.to_string());
        });
        sink.trace("hello");
        assert_eq!(collected.lock().unwrap().as_slice(), &["hello".to_string()]);
    }

    #[test]
    fn test_byte_lines() {
        let lines: Vec<String> = byte_lines(&[0x56, 0x00]).collect();
        assert_eq!(lines[0], "[  0] 0x56  dec= 86  char='V'");
        assert_eq!(lines[1], "[  1] 0x00  dec=  0  char=.");
    }
}
