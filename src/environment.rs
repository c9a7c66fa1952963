use crate::error::ESResult;
use derive_more::Display;
use error_stack::ResultExt;
use std::error::Error;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Display)]
#[display("Failed to register environment changes")]
pub struct EnvironmentError;

impl Error for EnvironmentError {}

/// What an install wants exported to the rest of the job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentChange {
    pub variables: Vec<(String, String)>,
    pub paths: Vec<PathBuf>,
    pub outputs: Vec<(String, String)>,
}

impl EnvironmentChange {
    /// Make the JDK at `java_home` the default: `JAVA_HOME`, `JAVA_HOME_<major>_<ARCH>`,
    /// `bin` on the path, and the `distribution`/`path`/`version` outputs.
    pub fn java_default(distribution: &str, version: &str, java_home: &Path, arch: &str) -> Self {
        let home = java_home.display().to_string();
        let major = version.split(['.', '+', '-']).next().unwrap_or(version);
        Self {
            variables: vec![
                ("JAVA_HOME".to_string(), home.clone()),
                (
                    format!("JAVA_HOME_{}_{}", major, arch.to_uppercase().replace('-', "_")),
                    home.clone(),
                ),
            ],
            paths: vec![java_home.join("bin")],
            outputs: vec![
                ("distribution".to_string(), distribution.to_string()),
                ("path".to_string(), home),
                ("version".to_string(), version.to_string()),
            ],
        }
    }

    /// Render as POSIX `export` lines for `eval`.
    pub fn shell_exports(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.variables {
            let _ = writeln!(out, "export {}={}", name, shell_quote(value));
        }
        for path in &self.paths {
            let _ = writeln!(
                out,
                "export PATH={}:\"$PATH\"",
                shell_quote(&path.display().to_string())
            );
        }
        out
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// The runner's command files (`GITHUB_ENV`, `GITHUB_PATH`, `GITHUB_OUTPUT`).
#[derive(Debug, Clone, Default)]
pub struct RunnerFiles {
    pub env: Option<PathBuf>,
    pub path: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl RunnerFiles {
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            env: var("GITHUB_ENV"),
            path: var("GITHUB_PATH"),
            output: var("GITHUB_OUTPUT"),
        }
    }

    pub fn is_runner(&self) -> bool {
        self.env.is_some() || self.path.is_some() || self.output.is_some()
    }

    /// Append `change` to whichever command files are present.
    pub fn apply(&self, change: &EnvironmentChange) -> ESResult<(), EnvironmentError> {
        if let Some(file) = &self.env {
            append_pairs(file, &change.variables)?;
        }
        if let Some(file) = &self.path {
            let lines = change
                .paths
                .iter()
                .map(|p| format!("{}\n", p.display()))
                .collect::<String>();
            append(file, &lines)?;
        }
        if let Some(file) = &self.output {
            append_pairs(file, &change.outputs)?;
        }
        Ok(())
    }
}

fn append_pairs(file: &Path, pairs: &[(String, String)]) -> ESResult<(), EnvironmentError> {
    let lines = pairs
        .iter()
        .map(|(name, value)| format!("{}={}\n", name, value))
        .collect::<String>();
    append(file, &lines)
}

fn append(file: &Path, contents: &str) -> ESResult<(), EnvironmentError> {
    debug!("Appending to {}", file.display());
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .and_then(|mut f| f.write_all(contents.as_bytes()))
        .change_context(EnvironmentError)
        .attach_with(|| format!("File: {}", file.display()))
}
