// Sat Oct 17 2026 - Alex

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};

/// Persists raw submission bodies for later review. Write failures are logged and swallowed.
#[derive(Debug, Clone)]
pub struct DiagnosticsWriter {
    dir: PathBuf,
}

impl DiagnosticsWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(registrant_id: &str, label: &str, at: DateTime<Utc>) -> String {
        let safe: String = registrant_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{}_{}_{}.html", safe, label, at.format("%Y%m%d_%H%M%S_%3f"))
    }

    pub fn write(&self, registrant_id: &str, label: &str, at: DateTime<Utc>, body: &str) -> Option<PathBuf> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("Could not create diagnostics dir {}: {}", self.dir.display(), e);
            return None;
        }

        let path = self.dir.join(Self::file_name(registrant_id, label, at));
        match fs::write(&path, body) {
            Ok(()) => {
                info!("Response body saved to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not save response body to {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_has_millisecond_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 18, 11, 0, 0).unwrap() + chrono::Duration::milliseconds(42);
        assert_eq!(
            DiagnosticsWriter::file_name("marie dupont", "ambiguous", at),
            "marie_dupont_ambiguous_20260118_110000_042.html"
        );
    }

    #[test]
    fn test_write_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DiagnosticsWriter::new(tmp.path().join("diagnostics"));
        let path = writer.write("alice", "failed", Utc::now(), "<html>error</html>").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<html>error</html>");
    }

    #[test]
    fn test_write_failure_is_not_propagated() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let writer = DiagnosticsWriter::new(blocker.join("nested"));
        assert!(writer.write("alice", "failed", Utc::now(), "body").is_none());
    }
}
