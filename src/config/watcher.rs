//! Options file watcher for hot reload.
//!
//! The parent directory is watched, not the file. Editors and config tools
//! often save by writing a temporary file and renaming it over the original,
//! which replaces the inode a watch on the file itself is attached to.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::DiagnosticsConfig;

/// Keeps the options file under watch for as long as it is alive.
pub struct OptionsWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl OptionsWatcher {
    /// Start watching `path`. `current` is the configuration already in use;
    /// only validated options that differ from it are sent on the returned
    /// receiver. Events are handled on notify's own thread.
    pub fn start(
        path: &Path,
        current: DiagnosticsConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<DiagnosticsConfig>), notify::Error> {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| notify::Error::generic("options path has no file name"))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut reload = Reload {
            path: path.to_path_buf(),
            file_name,
            last: current,
            tx,
        };
        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| reload.handle(res), Config::default())?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), dir = %dir.display(), "Options watcher started");
        Ok((
            Self {
                path: path.to_path_buf(),
                _watcher: watcher,
            },
            rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct Reload {
    path: PathBuf,
    file_name: OsString,
    last: DiagnosticsConfig,
    tx: mpsc::UnboundedSender<DiagnosticsConfig>,
}

impl Reload {
    fn touches_options(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    fn handle(&mut self, res: notify::Result<Event>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Options watch error");
                return;
            }
        };
        if !self.touches_options(&event) {
            return;
        }

        match load_config(&self.path) {
            Ok(config) if config == self.last => {
                tracing::debug!(path = %self.path.display(), "Options file touched, nothing changed");
            }
            Ok(config) => {
                tracing::info!(path = %self.path.display(), "Options file changed, reloading");
                self.last = config.clone();
                let _ = self.tx.send(config);
            }
            // Mid-replace; the rename that follows produces its own event.
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reload options, keeping current configuration");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::{TriggerSet, TriggerSource};
    use std::fs;
    use std::time::Duration;

    const INITIAL: &str = r#"{ "coredump": "api+signal" }"#;

    async fn next_update(rx: &mut mpsc::UnboundedReceiver<DiagnosticsConfig>) -> Option<DiagnosticsConfig> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_rename_over_options_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud-diagnostics.json");
        fs::write(&path, INITIAL).unwrap();
        let current = load_config(&path).unwrap();

        let (watcher, mut updates) = OptionsWatcher::start(&path, current).unwrap();
        assert_eq!(watcher.path(), path);

        let staged = dir.path().join(".cloud-diagnostics.json.tmp");
        fs::write(&staged, r#"{ "coredump": "api" }"#).unwrap();
        fs::rename(&staged, &path).unwrap();

        let reloaded = next_update(&mut updates).await.expect("no reload after rename");
        assert_eq!(reloaded.coredump, TriggerSet::NONE.with(TriggerSource::Api));
    }

    #[tokio::test]
    async fn test_unrelated_and_unchanged_writes_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud-diagnostics.json");
        fs::write(&path, INITIAL).unwrap();
        let current = load_config(&path).unwrap();

        let (_watcher, mut updates) = OptionsWatcher::start(&path, current).unwrap();
        fs::write(dir.path().join("other.json"), r#"{ "coredump": "none" }"#).unwrap();
        fs::write(&path, INITIAL).unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_edit_keeps_watching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud-diagnostics.json");
        fs::write(&path, INITIAL).unwrap();
        let current = load_config(&path).unwrap();

        let (_watcher, mut updates) = OptionsWatcher::start(&path, current).unwrap();
        fs::write(&path, r#"{ "heapdump": "api+exception" }"#).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(updates.try_recv().is_err());

        fs::write(&path, r#"{ "heapdump": "signal" }"#).unwrap();
        let reloaded = next_update(&mut updates).await.expect("no reload after fix");
        assert_eq!(reloaded.heapdump, TriggerSet::NONE.with(TriggerSource::Signal));
    }
}
