use crate::error::{ESResult, UserMessage};
use crate::http_client::HttpClient;
use crate::installer::{
    download_and_cache, setup_java, InstallContext, InstallOutcome, InstallResult,
    InstallerOptions,
};
use crate::version::{compare_build, VersionRange};
use derive_more::Display;
use enum_dispatch::enum_dispatch;
use error_stack::{Report, ResultExt};
use semver::Version;
use serde::de::DeserializeOwned;
use std::error::Error;
use tracing::debug;

pub mod adoptium;
pub mod corretto;
pub mod dragonwell;
pub mod factory;
pub mod graalvm;
pub mod jetbrains;
pub mod kona;
pub mod liberica;
pub mod local;
pub mod microsoft;
pub mod oracle;
pub mod sapmachine;
pub mod zulu;

use adoptium::{Adopt, Semeru, Temurin};
use corretto::Corretto;
use dragonwell::Dragonwell;
use graalvm::GraalVm;
use jetbrains::JetBrains;
use kona::Kona;
use liberica::Liberica;
use local::LocalDistribution;
use microsoft::Microsoft;
use oracle::Oracle;
use sapmachine::SapMachine;
use zulu::Zulu;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DistributionError {
    /// The requested options cannot be served by this vendor.
    #[display("Unsupported distribution options")]
    Configuration,
    /// Nothing in the catalog matches.
    #[display("No matching release")]
    Resolution,
    #[display("Failed to fetch release information")]
    Transport,
    #[display("Invalid local JDK file")]
    LocalFile,
    #[display("Failed to install JDK")]
    Install,
}

impl Error for DistributionError {}

impl DistributionError {
    /// Whether the failure comes from what the caller asked for rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration | Self::Resolution | Self::LocalFile
        )
    }
}

/// One downloadable build from a vendor catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRelease {
    /// Semantic version; build metadata kept as `+`.
    pub version: String,
    pub url: String,
    /// Hex SHA-256 of the archive when the catalog publishes one.
    pub checksum: Option<String>,
}

impl JavaRelease {
    pub fn new(version: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            url: url.into(),
            checksum: None,
        }
    }

    pub fn with_checksum(mut self, checksum: Option<String>) -> Self {
        self.checksum = checksum.filter(|c| !c.is_empty());
        self
    }
}

/// A vendor that can resolve a version range to a download and install it.
#[enum_dispatch]
pub trait JavaDistribution {
    /// Name used in the toolcache folder and the `distribution` output.
    fn name(&self) -> &str;

    fn options(&self) -> &InstallerOptions;

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError>;

    fn download_tool(
        &self,
        ctx: &InstallContext,
        release: &JavaRelease,
    ) -> ESResult<InstallResult, DistributionError> {
        download_and_cache(self.name(), self.options(), ctx, release)
    }

    fn setup_java(&self, ctx: &InstallContext) -> ESResult<InstallOutcome, DistributionError> {
        setup_java(self, ctx)
    }
}

#[enum_dispatch(JavaDistribution)]
pub enum Distribution {
    Adopt,
    Temurin,
    Semeru,
    Zulu,
    Liberica,
    Microsoft,
    Corretto,
    Oracle,
    GraalVm,
    Dragonwell,
    SapMachine,
    JetBrains,
    Kona,
    LocalDistribution,
}

/// Pick the newest release satisfying `range`. The sort is stable, so catalogs that need a
/// tie-break can pre-order `releases`.
pub fn resolve_best_release(
    range: &VersionRange,
    releases: Vec<JavaRelease>,
) -> ESResult<JavaRelease, DistributionError> {
    let available = releases
        .iter()
        .map(|r| r.version.clone())
        .collect::<Vec<_>>();
    let mut satisfied = releases
        .into_iter()
        .filter_map(|release| match Version::parse(&release.version) {
            Ok(version) => Some((version, release)),
            Err(err) => {
                debug!("Skipping invalid version {}: {}", release.version, err);
                None
            }
        })
        .filter(|(_, release)| range.is_satisfied_by(&release.version))
        .collect::<Vec<_>>();
    satisfied.sort_by(|a, b| compare_build(&b.0, &a.0));
    satisfied
        .into_iter()
        .next()
        .map(|(_, release)| release)
        .ok_or_else(|| version_not_found(range, &available))
}

pub fn version_not_found(range: &VersionRange, available: &[String]) -> Report<DistributionError> {
    let available_message = if available.is_empty() {
        String::new()
    } else {
        format!("\nAvailable versions: {}", available.join(", "))
    };
    user_error(
        DistributionError::Resolution,
        format!(
            "Could not find satisfied version for SemVer '{}'. {}",
            range.range(),
            available_message
        ),
    )
}

pub(crate) fn user_error(
    kind: DistributionError,
    message: impl Into<String>,
) -> Report<DistributionError> {
    Report::new(kind).attach(UserMessage::new(message))
}

/// `+` written into a URL path.
pub fn url_safe_version(version: &str) -> String {
    version.replace('+', "%2B")
}

/// GET `url` and decode a successful JSON body.
pub(crate) fn fetch_json<T: DeserializeOwned>(
    http: &dyn HttpClient,
    url: &str,
    headers: &[(String, String)],
) -> ESResult<T, DistributionError> {
    http.get(url, headers)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .change_context(DistributionError::Transport)
        .attach_with(|| format!("URL: {}", url))
}

/// The base of a `jdk+fx` style package type, and its feature suffix.
pub(crate) fn split_package_type(package_type: &str) -> (&str, Option<&str>) {
    use crate::string::SplittingExt;
    package_type.split_optional('+')
}
