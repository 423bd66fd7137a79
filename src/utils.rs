//! Small string and filesystem helpers used throughout the crate.

use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep at most `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        None => s,
        Some((cut, _)) => &s[..cut],
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Name of the scratch file written by [`ensure_writable_dir`].
const WRITE_CHECK_FILE: &str = ".feed_ingest_write_check";

/// Create `dir` if needed and confirm a file can be written into it.
///
/// The scratch file is removed again; failing to remove it is only logged.
#[instrument(level = "info", skip_all, fields(path = %dir.display()))]
pub async fn ensure_writable_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir).await?;
    let check = dir.join(WRITE_CHECK_FILE);
    fs::write(&check, b"").await?;
    if let Err(e) = fs::remove_file(&check).await {
        warn!(file = %check.display(), error = %e, "Could not remove write-check file");
    }
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let result = truncate_for_log("žltý kôň", 3);
        assert!(result.starts_with("žlt…"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("čšť", 2), "čš");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join(WRITE_CHECK_FILE).exists());
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_rejects_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("report.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(ensure_writable_dir(&file).await.is_err());
        assert!(ensure_writable_dir(&file.join("sub")).await.is_err());
    }
}
