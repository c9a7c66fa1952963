use crate::error::{ESResult, UserMessage};
use crate::version::{coerce, is_valid_range};
use derive_more::Display;
use error_stack::{Report, ResultExt};
use regex::Regex;
use std::error::Error;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

#[derive(Debug, Display)]
pub enum VersionFileError {
    #[display("Could not read version file")]
    Read,
    #[display("No supported version in version file")]
    NoVersion,
}

impl Error for VersionFileError {}

static TOOL_VERSIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^java\s+(?:\S*-)?v?(?P<version>\d+(?:\.\d+)?(?:\.\d+)?(?:\+\d+)?(?:-ea(?:\.\d+)?)?)\s*$",
    )
    .expect("valid regex")
});

static SDKMANRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^java\s*=\s*(?P<version>[^-\s]+)(?:-(?P<identifier>\S+))?").expect("valid regex")
});

static JAVA_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s|-)(?P<version>\d+\S*)(?:\s|$)").expect("valid regex"));

/// What a version file asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFileRequest {
    pub version: String,
    /// Only `.sdkmanrc` can name a distribution.
    pub distribution: Option<String>,
}

/// Distribution key for an SDKMAN candidate identifier such as `tem` in `21.0.5-tem`.
fn sdkman_distribution(identifier: &str) -> Option<&'static str> {
    Some(match identifier {
        "tem" => "temurin",
        "zulu" => "zulu",
        "amzn" => "corretto",
        "graal" | "graalce" => "graalvm",
        "librca" => "liberica",
        "ms" => "microsoft",
        "oracle" => "oracle",
        "sapmchn" => "sapmachine",
        "jbr" => "jetbrains",
        "sem" => "semeru",
        "dragonwell" => "dragonwell",
        "kona" => "kona",
        _ => return None,
    })
}

/// Read `path` and extract the requested version. `distribution` is the one requested
/// elsewhere and only matters for how the version is normalized.
pub fn read_version_file(
    path: &Path,
    distribution: &str,
) -> ESResult<VersionFileRequest, VersionFileError> {
    let content = std::fs::read_to_string(path)
        .change_context(VersionFileError::Read)
        .attach_with(|| UserMessage::new(format!("Could not read version file '{}'", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Parsing version file {}", path.display());
    version_from_file_content(&content, distribution, &file_name).ok_or_else(|| {
        Report::new(VersionFileError::NoVersion).attach(UserMessage::new(format!(
            "No supported version was found in file {}",
            path.display()
        )))
    })
}

pub fn version_from_file_content(
    content: &str,
    distribution: &str,
    file_name: &str,
) -> Option<VersionFileRequest> {
    let (captured, file_distribution) = if file_name == ".tool-versions" {
        let captures = TOOL_VERSIONS_RE.captures(content)?;
        (captures.name("version")?.as_str(), None)
    } else if file_name == ".sdkmanrc" {
        let captures = SDKMANRC_RE.captures(content)?;
        let file_distribution = captures.name("identifier").and_then(|identifier| {
            let found = sdkman_distribution(identifier.as_str());
            if found.is_none() {
                warn!(
                    "Unknown SDKMAN distribution identifier '{}', using the requested distribution",
                    identifier.as_str()
                );
            }
            found
        });
        (captures.name("version")?.as_str(), file_distribution)
    } else {
        let captures = JAVA_VERSION_RE.captures(content)?;
        (captures.name("version")?.as_str(), None)
    };
    debug!("Parsed version '{}' from file '{}'", captured, file_name);

    let captured = captured.strip_prefix("1.").unwrap_or(captured);
    let raw = captured.split('-').next().unwrap_or(captured);
    // The `-ea` suffix survives whenever the part before it is a valid range.
    let mut version = if is_valid_range(raw) {
        captured.to_string()
    } else {
        coerce(raw)?.to_string()
    };
    if file_distribution.unwrap_or(distribution) == "corretto" {
        version = version.split('.').next().unwrap_or(&version).to_string();
    }

    Some(VersionFileRequest {
        version,
        distribution: file_distribution.map(str::to_string),
    })
}
