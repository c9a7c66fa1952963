use crate::distributions::{
    fetch_json, user_error, version_not_found, DistributionError, JavaDistribution, JavaRelease,
};
use crate::error::ESResult;
use crate::installer::{download_archive_extension, InstallContext, InstallerOptions};
use crate::platform::Os;
use crate::version::{convert_version_to_semver, VersionRange};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

const INDEX_URL: &str =
    "https://corretto.github.io/corretto-downloads/latest_links/indexmap_with_checksum.json";

static CORRETTO_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+.+)/").expect("valid regex"));

/// `[os][arch][image type][major][file type]`
type Index = BTreeMap<
    String,
    BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, IndexFile>>>>,
>;

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    checksum_sha256: Option<String>,
    resource: String,
}

pub struct Corretto {
    options: InstallerOptions,
}

impl Corretto {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }
}

/// Full version from a resource path such as
/// `/downloads/resources/11.0.12.7.1/amazon-corretto-11.0.12.7.1-linux-x64.tar.gz`.
fn corretto_version(resource: &str) -> Option<String> {
    CORRETTO_VERSION_RE
        .captures(resource)
        .and_then(|c| c.get(1))
        .map(|m| convert_version_to_semver(m.as_str()))
}

fn platform_name(os: Os) -> &'static str {
    match os {
        Os::MacOs => "macos",
        Os::Windows => "windows",
        Os::Linux => "linux",
        Os::Solaris => "solaris",
        Os::Other(name) => name,
    }
}

impl JavaDistribution for Corretto {
    fn name(&self) -> &str {
        "Corretto"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        if !self.options.stable() {
            return Err(user_error(
                DistributionError::Configuration,
                "Early access versions are not supported",
            ));
        }
        if range.range().contains('.') {
            return Err(user_error(
                DistributionError::Configuration,
                "Only major versions are supported",
            ));
        }

        let mut index: Index = fetch_json(ctx.http, INDEX_URL, &[])?;
        let extension = download_archive_extension(&ctx.platform);
        let eligible = index
            .remove(platform_name(ctx.platform.os))
            .and_then(|mut archs| archs.remove(&self.options.distribution_architecture()))
            .and_then(|mut images| images.remove(&self.options.package_type))
            .unwrap_or_default();

        let mut available = Vec::new();
        let mut found = None;
        for (major, mut files) in eligible {
            let Some(file) = files.remove(extension) else {
                continue;
            };
            let Some(version) = corretto_version(&file.resource) else {
                debug!("Could not parse corretto version from {}", file.resource);
                continue;
            };
            debug!("{}: {}", major, version);
            if found.is_none() && major == range.range() {
                found = Some(
                    JavaRelease::new(version, format!("https://corretto.aws{}", file.resource))
                        .with_checksum(file.checksum_sha256),
                );
            }
            available.push(major);
        }
        found.ok_or_else(|| version_not_found(range, &available))
    }
}
