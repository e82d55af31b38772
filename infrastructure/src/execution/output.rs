//! Collection and head/tail truncation of captured process output.
//!
//! The runner captures a child's combined output into one file. When the
//! descriptor carries limits, only the first and last chunks are kept and
//! `{{ N bytes skipped }}` markers stand in for what fell out. Limits
//! covering the whole capture mean nothing was skipped, so the output
//! comes back untouched.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use toolgate_domain::OutputLimits;

fn skipped_marker(n: u64) -> String {
    format!("{{{{ {n} bytes skipped }}}}")
}

/// Read the capture file back, applying head/tail limits.
///
/// Negative limits and absent limits disable truncation entirely.
pub(crate) fn collect(file: &mut File, limits: Option<&OutputLimits>) -> io::Result<Vec<u8>> {
    let total = file.metadata()?.len();

    let Some(limits) = limits else {
        return read_all(file);
    };
    if limits.first_n_bytes < 0 || limits.last_n_bytes < 0 {
        return read_all(file);
    }
    let first = limits.first_n_bytes as u64;
    let last = limits.last_n_bytes as u64;
    if first + last >= total {
        return read_all(file);
    }

    let mut out = Vec::with_capacity((first + last) as usize + 64);
    if first > 0 {
        out.extend_from_slice(&read_range(file, 0, first)?);
    } else {
        out.extend_from_slice(skipped_marker(total - last).as_bytes());
        out.push(b'\n');
    }
    if first > 0 && last > 0 {
        out.push(b'\n');
        out.extend_from_slice(skipped_marker(total - first - last).as_bytes());
        out.push(b'\n');
    }
    if last > 0 {
        out.extend_from_slice(&read_range(file, total - last, last)?);
    } else {
        out.push(b'\n');
        out.extend_from_slice(skipped_marker(total - first).as_bytes());
    }
    Ok(out)
}

fn read_all(file: &mut File) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn read_range(file: &mut File, offset: u64, len: u64) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONTENT: &str = "This is a test output.";

    fn capture(content: &str) -> File {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn collected(content: &str, limits: Option<OutputLimits>) -> String {
        let mut file = capture(content);
        String::from_utf8(collect(&mut file, limits.as_ref()).unwrap()).unwrap()
    }

    fn limits(first: i64, last: i64) -> Option<OutputLimits> {
        Some(OutputLimits {
            first_n_bytes: first,
            last_n_bytes: last,
            ..OutputLimits::default()
        })
    }

    #[test]
    fn test_no_limits_returns_everything() {
        assert_eq!(collected(CONTENT, None), CONTENT);
    }

    #[test]
    fn test_head_only() {
        assert_eq!(
            collected(CONTENT, limits(4, 0)),
            "This\n{{ 18 bytes skipped }}"
        );
    }

    #[test]
    fn test_tail_only() {
        assert_eq!(
            collected(CONTENT, limits(0, 7)),
            "{{ 15 bytes skipped }}\noutput."
        );
    }

    #[test]
    fn test_head_and_tail() {
        assert_eq!(
            collected(CONTENT, limits(4, 7)),
            "This\n{{ 11 bytes skipped }}\noutput."
        );
    }

    #[test]
    fn test_limits_beyond_size_return_everything() {
        assert_eq!(collected(CONTENT, limits(1024, 0)), CONTENT);
        assert_eq!(collected(CONTENT, limits(0, 1024)), CONTENT);
    }

    #[test]
    fn test_limits_covering_exactly_return_everything() {
        // 15 + 7 == 22 bytes: nothing is skipped, so no marker appears.
        assert_eq!(collected(CONTENT, limits(15, 7)), CONTENT);
    }

    #[test]
    fn test_negative_limits_disable_truncation() {
        assert_eq!(collected(CONTENT, limits(-1, 0)), CONTENT);
        assert_eq!(collected(CONTENT, limits(0, -1)), CONTENT);
    }

    #[test]
    fn test_zero_limits_skip_everything() {
        assert_eq!(
            collected(CONTENT, limits(0, 0)),
            "{{ 22 bytes skipped }}\n\n{{ 22 bytes skipped }}"
        );
    }

    #[test]
    fn test_single_byte_head() {
        assert_eq!(
            collected("Echo: Hello World\n", limits(1, 0)),
            "E\n{{ 17 bytes skipped }}"
        );
    }

    #[test]
    fn test_empty_capture() {
        assert_eq!(collected("", limits(4, 7)), "");
        assert_eq!(collected("", None), "");
    }
}
