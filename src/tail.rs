//! Bounded tail of the preview log
//!
//! Streams the file line by line and keeps a rolling window, so a large
//! log never has to fit in memory.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::IntErrorKind;
use std::path::Path;

pub const DEFAULT_TAIL_LINES: usize = 200;
pub const MAX_TAIL_LINES: usize = 5000;

/// Clamp a requested line count into `1..=MAX_TAIL_LINES`
pub fn clamp_lines(requested: i64) -> usize {
    requested.clamp(1, MAX_TAIL_LINES as i64) as usize
}

/// Parse a `tail` query value, falling back to the default on garbage
///
/// Integers too large for `i64` still clamp by sign.
pub fn parse_lines(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_TAIL_LINES;
    };
    match raw.trim().parse::<i64>() {
        Ok(n) => clamp_lines(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => MAX_TAIL_LINES,
            IntErrorKind::NegOverflow => 1,
            _ => DEFAULT_TAIL_LINES,
        },
    }
}

/// Last `n` lines of `path`, newline-joined
///
/// A missing or unreadable file yields an empty string. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn tail_file(path: &Path, n: usize) -> String {
    let n = n.clamp(1, MAX_TAIL_LINES);
    let Ok(file) = File::open(path) else {
        return String::new();
    };
    if !file.metadata().map(|m| m.is_file()).unwrap_or(false) {
        return String::new();
    }

    let mut reader = BufReader::new(file);
    let mut window: VecDeque<String> = VecDeque::with_capacity(n);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if window.len() == n {
                    window.pop_front();
                }
                window.push_back(String::from_utf8_lossy(&buf).into_owned());
            }
            Err(_) => break,
        }
    }

    window.into_iter().collect::<Vec<_>>().join("\n")
}

/// [`tail_file`] on the blocking pool, for use inside async handlers
pub async fn tail_file_async(path: &Path, n: usize) -> String {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || tail_file(&path, n))
        .await
        .unwrap_or_default()
}
