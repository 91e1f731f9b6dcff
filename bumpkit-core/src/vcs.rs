//! Version-control primitives consumed by the release engine.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

/// Version-control operations the release engine needs.
pub trait VersionControl {
    /// Adds a file or directory (including deletions beneath it) to the index.
    fn stage(&self, path: &Path) -> Result<()>;

    /// Commits everything currently staged.
    fn commit(&self, message: &str) -> Result<()>;

    /// Returns the revision that first added `path`, if it has been committed.
    fn find_introducing_revision(&self, path: &Path) -> Result<Option<String>>;
}

/// [`VersionControl`] backed by the system `git` binary.
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    fn git(&self, args: &[&str], path: Option<&Path>) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_dir).args(args);
        if let Some(path) = path {
            cmd.arg("--").arg(path);
        }

        let output = cmd
            .output()
            .map_err(|e| Error::vcs(format!("Failed to run git {}: {}", args.join(" "), e)))?;

        if !output.status.success() {
            return Err(Error::vcs(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitCli {
    fn stage(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "git add");
        self.git(&["add", "--all"], Some(path)).map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<()> {
        debug!("git commit");
        self.git(&["commit", "-m", message], None).map(|_| ())
    }

    fn find_introducing_revision(&self, path: &Path) -> Result<Option<String>> {
        let stdout = self.git(
            &["log", "--diff-filter=A", "--max-count=1", "--format=%H"],
            Some(path),
        )?;
        let revision = stdout.trim();
        Ok((!revision.is_empty()).then(|| revision.to_string()))
    }
}
