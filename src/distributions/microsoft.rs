use crate::distributions::{
    fetch_json, resolve_best_release, user_error, DistributionError, JavaDistribution,
    JavaRelease,
};
use crate::error::ESResult;
use crate::http_client::github_headers;
use crate::installer::{download_archive_extension, InstallContext, InstallerOptions};
use crate::platform::Os;
use crate::version::VersionRange;
use serde::Deserialize;
use tracing::{debug, warn};

const MANIFEST_API_URL: &str = "https://api.github.com/repos/actions/setup-java/contents/src/distributions/microsoft/microsoft-openjdk-versions.json?ref=main";
const MANIFEST_RAW_URL: &str = "https://raw.githubusercontent.com/actions/setup-java/main/src/distributions/microsoft/microsoft-openjdk-versions.json";
const SUPPORTED_ARCHITECTURES: &[&str] = &["x64", "aarch64"];

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    version: String,
    stable: bool,
    files: Vec<ManifestFile>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    filename: String,
    arch: String,
    platform: String,
    download_url: String,
}

pub struct Microsoft {
    options: InstallerOptions,
}

impl Microsoft {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    /// The version manifest, from the GitHub contents API or its raw mirror.
    fn manifest(&self, ctx: &InstallContext) -> ESResult<Vec<ManifestEntry>, DistributionError> {
        let headers = github_headers(ctx.github_token.as_deref());
        match fetch_json(ctx.http, MANIFEST_API_URL, &headers) {
            Ok(manifest) => Ok(manifest),
            Err(err) => {
                warn!("Could not fetch the Microsoft version manifest from the GitHub API, trying the raw mirror");
                debug!("{:?}", err);
                fetch_json(ctx.http, MANIFEST_RAW_URL, &[])
            }
        }
    }
}

/// Manifest platform key, Node style.
fn manifest_platform(os: Os) -> Option<&'static str> {
    match os {
        Os::Linux => Some("linux"),
        Os::MacOs => Some("darwin"),
        Os::Windows => Some("win32"),
        _ => None,
    }
}

impl JavaDistribution for Microsoft {
    fn name(&self) -> &str {
        "Microsoft"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        let arch = self.options.distribution_architecture();
        if !SUPPORTED_ARCHITECTURES.contains(&arch.as_str()) {
            return Err(user_error(
                DistributionError::Configuration,
                format!("Unsupported architecture: {}", self.options.architecture),
            ));
        }
        if !self.options.stable() {
            return Err(user_error(
                DistributionError::Configuration,
                "Early access versions are not supported",
            ));
        }
        if self.options.package_type != "jdk" {
            return Err(user_error(
                DistributionError::Configuration,
                "Microsoft Build of OpenJDK provides only the `jdk` package type",
            ));
        }
        let Some(platform) = manifest_platform(ctx.platform.os) else {
            return Err(user_error(
                DistributionError::Configuration,
                format!("Unsupported platform: {}", ctx.platform.common_name()),
            ));
        };
        let extension = format!(".{}", download_archive_extension(&ctx.platform));

        let releases = self
            .manifest(ctx)?
            .into_iter()
            .filter(|entry| entry.stable)
            .filter_map(|entry| {
                let file = entry.files.into_iter().find(|f| {
                    f.arch == arch && f.platform == platform && f.filename.ends_with(&extension)
                })?;
                Some(JavaRelease::new(entry.version, file.download_url))
            })
            .collect();
        resolve_best_release(range, releases)
    }
}
