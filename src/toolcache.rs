use crate::config::PROJECT_DIRS;
use crate::error::ESResult;
use derive_more::Display;
use error_stack::{Report, ResultExt};
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Display)]
pub enum ToolcacheError {
    #[display("Failed to read the toolcache")]
    Read,
    #[display("Failed to store into the toolcache")]
    Store,
}

impl Error for ToolcacheError {}

/// Versioned storage of installed tools, laid out as `<root>/<tool>/<version>/<arch>`.
pub trait Toolcache {
    /// The install directory of an exact cached version, if it finished installing.
    fn find(&self, tool: &str, version: &str, arch: &str) -> Option<PathBuf>;

    /// Every completely installed version name of `tool` for `arch`.
    fn find_all_versions(&self, tool: &str, arch: &str) -> ESResult<Vec<String>, ToolcacheError>;

    /// Move the contents of `source` into the cache and mark it complete.
    fn cache_dir(
        &self,
        source: &Path,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> ESResult<PathBuf, ToolcacheError>;

    /// Scratch space for downloads, on the same filesystem as the cache.
    fn temp_dir(&self) -> ESResult<TempDir, ToolcacheError>;
}

pub struct DirectoryToolcache {
    root: PathBuf,
}

impl DirectoryToolcache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root from `RUNNER_TOOL_CACHE`, then `configured`, then the user cache directory.
    pub fn locate(configured: Option<&Path>) -> Self {
        let root = std::env::var_os("RUNNER_TOOL_CACHE")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| configured.map(Path::to_path_buf))
            .unwrap_or_else(|| PROJECT_DIRS.cache_dir().join("toolcache"));
        debug!("Using toolcache at {}", root.display());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn install_dir(&self, tool: &str, version: &str, arch: &str) -> PathBuf {
        self.root.join(tool).join(version).join(arch)
    }

    fn marker(&self, tool: &str, version: &str, arch: &str) -> PathBuf {
        self.root
            .join(tool)
            .join(version)
            .join(format!("{}.complete", arch))
    }
}

impl Toolcache for DirectoryToolcache {
    fn find(&self, tool: &str, version: &str, arch: &str) -> Option<PathBuf> {
        let path = self.install_dir(tool, version, arch);
        if path.is_dir() && self.marker(tool, version, arch).is_file() {
            Some(path)
        } else {
            None
        }
    }

    fn find_all_versions(&self, tool: &str, arch: &str) -> ESResult<Vec<String>, ToolcacheError> {
        let tool_dir = self.root.join(tool);
        if !tool_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in tool_dir
            .read_dir()
            .change_context(ToolcacheError::Read)
            .attach_with(|| format!("Could not list {}", tool_dir.display()))?
        {
            let entry = entry.change_context(ToolcacheError::Read)?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non-UTF-8 toolcache entry {:?}", entry.file_name());
                continue;
            };
            if self.find(tool, &name, arch).is_some() {
                versions.push(name);
            }
        }
        versions.sort();
        Ok(versions)
    }

    fn cache_dir(
        &self,
        source: &Path,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> ESResult<PathBuf, ToolcacheError> {
        let destination = self.install_dir(tool, version, arch);
        let marker = self.marker(tool, version, arch);
        debug!("Caching {} as {}", source.display(), destination.display());

        if marker.exists() {
            std::fs::remove_file(&marker)
                .change_context(ToolcacheError::Store)
                .attach_with(|| format!("Could not remove {}", marker.display()))?;
        }
        if destination.exists() {
            std::fs::remove_dir_all(&destination)
                .change_context(ToolcacheError::Store)
                .attach_with(|| format!("Could not clean {}", destination.display()))?;
        }
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .change_context(ToolcacheError::Store)
                .attach_with(|| format!("Could not create {}", parent.display()))?;
        }

        if let Err(err) = std::fs::rename(source, &destination) {
            debug!("Rename into toolcache failed ({}), copying instead", err);
            copy_tree(source, &destination)?;
        }

        File::create(&marker)
            .change_context(ToolcacheError::Store)
            .attach_with(|| format!("Could not create {}", marker.display()))?;
        Ok(destination)
    }

    fn temp_dir(&self) -> ESResult<TempDir, ToolcacheError> {
        std::fs::create_dir_all(&self.root)
            .change_context(ToolcacheError::Store)
            .attach_with(|| format!("Could not create {}", self.root.display()))?;
        tempfile::Builder::new()
            .prefix(".setup-jdk-")
            .tempdir_in(&self.root)
            .change_context(ToolcacheError::Store)
            .attach("Failed to create temporary directory")
    }
}

fn copy_tree(source: &Path, destination: &Path) -> ESResult<(), ToolcacheError> {
    for entry in WalkDir::new(source) {
        let entry = entry.change_context(ToolcacheError::Store)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .change_context(ToolcacheError::Store)?;
        let target = destination.join(relative);
        let file_type = entry.file_type();
        let copied = if file_type.is_dir() {
            std::fs::create_dir_all(&target)
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)
        } else {
            std::fs::copy(entry.path(), &target).map(|_| ())
        };
        copied
            .change_context(ToolcacheError::Store)
            .attach_with(|| format!("Could not copy {}", entry.path().display()))?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(std::fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    std::fs::copy(link, target).map(|_| ())
}
