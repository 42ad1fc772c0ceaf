//! Serial console logging.
//!
//! Records are formatted into a fixed buffer and handed to a line sink,
//! normally a function that pushes bytes out of the board's UART.

use core::fmt::{self, Write};

use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Receives one complete console line, terminator included
pub type LineSink = fn(&str);

/// Longest console line; longer records are cut short
pub const LINE_CAPACITY: usize = 160;

const HEXDUMP_ROW: usize = 16;

/// Formatting target backed by a stack buffer. Output that does not fit is
/// dropped at a character boundary.
pub struct FixedBuffer<const N: usize> {
    buf: [u8; N],
    pos: usize,
    truncated: bool,
}

impl<const N: usize> FixedBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            pos: 0,
            truncated: false,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.pos]).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.pos = 0;
        self.truncated = false;
    }

    /// Ends the contents with CRLF, cutting text if needed to fit it
    pub fn terminate(&mut self) {
        if self.pos + 2 > N {
            self.truncated = true;
            self.pos = N.saturating_sub(2);
            while self.pos > 0 && self.buf[self.pos] & 0xC0 == 0x80 {
                self.pos -= 1;
            }
        }
        let _ = self.write_str("\r\n");
    }
}

impl<const N: usize> Default for FixedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Write for FixedBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let available = N - self.pos;
        let mut to_copy = s.len().min(available);
        while !s.is_char_boundary(to_copy) {
            to_copy -= 1;
        }
        if to_copy < s.len() {
            self.truncated = true;
        }

        self.buf[self.pos..self.pos + to_copy].copy_from_slice(&s.as_bytes()[..to_copy]);
        self.pos += to_copy;
        Ok(())
    }
}

/// `log` backend writing `[LEVEL] target: message` lines to a sink.
pub struct SinkLogger {
    sink: Mutex<Option<LineSink>>,
}

impl SinkLogger {
    pub const fn new() -> Self {
        SinkLogger {
            sink: Mutex::new(None),
        }
    }
}

impl Log for SinkLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let sink = match *self.sink.lock() {
            Some(sink) => sink,
            None => return,
        };

        let mut line = FixedBuffer::<LINE_CAPACITY>::new();
        let _ = write!(line, "[{}] {}: {}", record.level(), record.target(), record.args());
        line.terminate();
        sink(line.as_str());
    }

    fn flush(&self) {}
}

static LOGGER: SinkLogger = SinkLogger::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerError {
    /// A logger was already installed for this program
    AlreadyInstalled,
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::AlreadyInstalled => write!(f, "Logger already installed"),
        }
    }
}

/// Installs the console logger. Only the first call succeeds.
pub fn init_logger(sink: LineSink, level: LevelFilter) -> Result<(), LoggerError> {
    log::set_logger(&LOGGER).map_err(|_| LoggerError::AlreadyInstalled)?;
    *LOGGER.sink.lock() = Some(sink);
    log::set_max_level(level);
    Ok(())
}

pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

fn hexdump_row<W: Write>(out: &mut W, offset: usize, chunk: &[u8]) -> fmt::Result {
    write!(out, "{:04x}:", offset)?;
    for i in 0..HEXDUMP_ROW {
        match chunk.get(i) {
            Some(b) => write!(out, " {:02x}", b)?,
            None => out.write_str("   ")?,
        }
    }
    out.write_str("  |")?;
    for &b in chunk {
        out.write_char(if (0x20..0x7F).contains(&b) { b as char } else { '.' })?;
    }
    out.write_str("|")
}

/// Writes `data` as offset, hex and ASCII columns, 16 bytes per line
pub fn hexdump<W: Write>(out: &mut W, data: &[u8]) -> fmt::Result {
    for (row, chunk) in data.chunks(HEXDUMP_ROW).enumerate() {
        hexdump_row(out, row * HEXDUMP_ROW, chunk)?;
        out.write_str("\r\n")?;
    }
    Ok(())
}

/// Logs a hexdump of `data`, one record per row
pub fn log_hexdump(level: Level, data: &[u8]) {
    if level > log::max_level() {
        return;
    }
    for (row, chunk) in data.chunks(HEXDUMP_ROW).enumerate() {
        let mut line = FixedBuffer::<96>::new();
        let _ = hexdump_row(&mut line, row * HEXDUMP_ROW, chunk);
        log::log!(level, "{}", line.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::{String, ToString};
    use std::vec::Vec;

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn capture(line: &str) {
        CAPTURED.lock().push(line.to_string());
    }

    #[test]
    fn test_buffer_formatting() {
        let mut buf = FixedBuffer::<64>::new();
        write!(buf, "Hello, {}!", "world").unwrap();
        assert_eq!(buf.as_str(), "Hello, world!");
        assert_eq!(buf.len(), 13);
        assert!(!buf.is_truncated());

        buf.clear();
        write!(buf, "Hex: 0x{:x}", 255).unwrap();
        assert_eq!(buf.as_str(), "Hex: 0xff");
    }

    #[test]
    fn test_buffer_truncates_on_char_boundary() {
        let mut buf = FixedBuffer::<5>::new();
        write!(buf, "abcé€").unwrap();
        assert_eq!(buf.as_str(), "abcé");
        assert!(buf.is_truncated());

        buf.terminate();
        assert_eq!(buf.as_str(), "abc\r\n");
    }

    #[test]
    fn test_terminate_fits() {
        let mut buf = FixedBuffer::<8>::new();
        write!(buf, "ok").unwrap();
        buf.terminate();
        assert_eq!(buf.as_str(), "ok\r\n");
        assert!(!buf.is_truncated());
    }

    #[test]
    fn test_hexdump_layout() {
        let mut out = String::new();
        let data: Vec<u8> = (0x40..0x52).collect();
        hexdump(&mut out, &data).unwrap();

        let lines: Vec<&str> = out.split("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "0000: 40 41 42 43 44 45 46 47 48 49 4a 4b 4c 4d 4e 4f  |@ABCDEFGHIJKLMNO|"
        );
        assert!(lines[1].starts_with("0010: 50 51      "));
        assert!(lines[1].ends_with("|PQ|"));
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_hexdump_replaces_unprintable() {
        let mut out = String::new();
        hexdump(&mut out, &[0x00, 0x41, 0xFF]).unwrap();
        assert!(out.ends_with("|.A.|\r\n"));
    }

    #[test]
    fn test_logger_install_once() {
        assert_eq!(init_logger(capture, LevelFilter::Debug), Ok(()));
        assert_eq!(
            init_logger(capture, LevelFilter::Trace),
            Err(LoggerError::AlreadyInstalled)
        );

        log::info!(target: "cf", "card {} ready", 1);
        log::trace!(target: "cf", "filtered");

        let captured = CAPTURED.lock();
        assert!(captured.iter().any(|l| l == "[INFO] cf: card 1 ready\r\n"));
        assert!(!captured.iter().any(|l| l.contains("filtered")));
    }
}
