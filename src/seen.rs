//! Durable set of article URLs that have already been delivered.
//!
//! Backed by a newline-delimited history file that is read once at startup and
//! only ever appended to, one line per newly delivered story.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};

/// Default history file name, placed next to the executable.
pub const HISTORY_FILE: &str = "PastArticles.history";

#[derive(Debug, Default)]
pub struct SeenSet {
    urls: HashSet<String>,
    /// Backing file; `None` keeps the set in memory only.
    path: Option<PathBuf>,
    /// The file's last line lacks a terminator.
    needs_newline: bool,
}

impl SeenSet {
    /// Load the history at `path`, creating an empty file if there is none.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| Error::Io {
            path: path.clone(),
            source,
        };

        // Opening for append creates the file without touching existing lines.
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;
        let content = fs::read_to_string(&path).await.map_err(io_err)?;

        let urls: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        info!(count = urls.len(), "Loaded seen-URL history");

        Ok(Self {
            urls,
            needs_newline: !content.is_empty() && !content.ends_with('\n'),
            path: Some(path),
        })
    }

    /// In-memory set with no backing file.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_new(&self, url: &str) -> bool {
        !self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Record `url` as delivered.
    ///
    /// The line is appended to the backing file before the in-memory set is
    /// updated, so a failed write leaves the URL new. Returns `false` if the
    /// URL was already present.
    pub async fn insert(&mut self, url: &str) -> Result<bool> {
        if !self.is_new(url) {
            return Ok(false);
        }
        if let Some(path) = &self.path {
            let io_err = |source| Error::Io {
                path: path.clone(),
                source,
            };
            let mut line = String::with_capacity(url.len() + 2);
            if self.needs_newline {
                line.push('\n');
            }
            line.push_str(url);
            line.push('\n');

            let mut file = fs::OpenOptions::new()
                .append(true)
                .open(path)
                .await
                .map_err(io_err)?;
            file.write_all(line.as_bytes()).await.map_err(io_err)?;
            file.flush().await.map_err(io_err)?;
            self.needs_newline = false;
            debug!(%url, path = %path.display(), "Recorded URL as seen");
        }
        self.urls.insert(url.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let seen = SeenSet::load(&path).await.unwrap();
        assert!(seen.is_empty());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_insert_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let url = "https://x.com/news/local/z.html";

        let mut seen = SeenSet::load(&path).await.unwrap();
        assert!(seen.is_new(url));
        assert!(seen.insert(url).await.unwrap());
        assert!(!seen.is_new(url));

        let reloaded = SeenSet::load(&path).await.unwrap();
        assert!(!reloaded.is_new(url));
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_appends_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let mut seen = SeenSet::load(&path).await.unwrap();
        assert!(seen.insert("https://x.com/a.html").await.unwrap());
        assert!(!seen.insert("https://x.com/a.html").await.unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "https://x.com/a.html\n");
    }

    #[tokio::test]
    async fn test_append_after_unterminated_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        std::fs::write(&path, "https://x.com/old.html").unwrap();

        let mut seen = SeenSet::load(&path).await.unwrap();
        assert!(!seen.is_new("https://x.com/old.html"));
        seen.insert("https://x.com/new.html").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "https://x.com/old.html\nhttps://x.com/new.html\n");
    }

    #[tokio::test]
    async fn test_load_ignores_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        std::fs::write(&path, "a\n\n  b  \r\n").unwrap();
        let seen = SeenSet::load(&path).await.unwrap();
        assert_eq!(seen.len(), 2);
        assert!(!seen.is_new("b"));
    }

    #[test]
    fn test_in_memory_set() {
        let seen = SeenSet::from_urls(["u1", "u2"]);
        assert!(!seen.is_new("u1"));
        assert!(seen.is_new("u3"));
    }
}
