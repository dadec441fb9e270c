//! File hand-off for applications that are started with a prepared input file.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Failure to locate an application installation.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("environment variable `{var}` is not set")]
    Unset { var: String },

    #[error("install root {root} named by `{var}` is not a directory")]
    NotADirectory { var: String, root: PathBuf },

    #[error("launch script {script} does not exist")]
    MissingScript { script: PathBuf },
}

/// Located install root and launch script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Installation {
    pub root: PathBuf,
    pub script: PathBuf,
}

/// Resolves `$env_var/relative_script`, checking both exist.
pub fn discover_install(
    env_var: &str,
    relative_script: impl AsRef<Path>,
) -> Result<Installation, DiscoveryError> {
    let root = env::var_os(env_var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| DiscoveryError::Unset {
            var: env_var.to_string(),
        })?;
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            var: env_var.to_string(),
            root,
        });
    }
    let script = root.join(relative_script);
    if !script.is_file() {
        return Err(DiscoveryError::MissingScript { script });
    }
    debug!(root = %root.display(), script = %script.display(), "installation discovered");
    Ok(Installation { root, script })
}

/// Directory where hand-off files are written for the launched application.
#[derive(Clone, Debug)]
pub struct BatchHandoff {
    dir: PathBuf,
}

impl BatchHandoff {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `contents` to `name` atomically and returns the final path.
    pub fn write(&self, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(name);
        let staging = self.dir.join(format!(".{name}.partial"));
        fs::write(&staging, contents)?;
        fs::rename(&staging, &target)?;
        info!(path = %target.display(), len = contents.len(), "hand-off written");
        Ok(target)
    }

    /// Hand-off files with `extension`, sorted by name. A missing directory lists nothing.
    pub fn list(&self, extension: &str) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_list_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = BatchHandoff::new(dir.path().join("handoff"));
        assert!(handoff.list("json").unwrap().is_empty());

        let b = handoff.write("b.json", b"{}").unwrap();
        let a = handoff.write("a.json", b"[]").unwrap();
        handoff.write("notes.txt", b"ignored").unwrap();

        assert_eq!(handoff.list("json").unwrap(), vec![a.clone(), b]);
        assert_eq!(fs::read(&a).unwrap(), b"[]");

        handoff.write("a.json", b"{\"scenario\":\"a\"}").unwrap();
        assert_eq!(fs::read(&a).unwrap(), br#"{"scenario":"a"}"#);
        assert_eq!(handoff.list("json").unwrap().len(), 2);
    }

    #[test]
    fn discovery_reports_each_missing_piece() {
        let var = "RUNTIME_NATIVE_TEST_INSTALL_ROOT";
        env::remove_var(var);
        assert!(matches!(
            discover_install(var, "bin/launch.sh"),
            Err(DiscoveryError::Unset { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        env::set_var(var, dir.path());
        assert!(matches!(
            discover_install(var, "bin/launch.sh"),
            Err(DiscoveryError::MissingScript { .. })
        ));

        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin/launch.sh"), "#!/bin/sh\n").unwrap();
        let found = discover_install(var, "bin/launch.sh").unwrap();
        assert_eq!(found.root, dir.path());
        assert_eq!(found.script, dir.path().join("bin/launch.sh"));
        env::remove_var(var);
    }
}
