use crate::distributions::{
    fetch_json, user_error, DistributionError, JavaDistribution, JavaRelease,
};
use crate::error::{ESResult, UserMessage};
use crate::http_client::github_headers;
use crate::installer::{InstallContext, InstallerOptions};
use crate::platform::{Libc, Os, Platform};
use crate::version::{compare_build, convert_version_to_semver, VersionRange};
use error_stack::ResultExt;
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const RELEASES_URL: &str = "https://sap.github.io/SapMachine/assets/data/sapmachine-releases-all.json";
const RELEASES_BACKUP_URL: &str = "https://api.github.com/repos/SAP/SapMachine/contents/assets/data/sapmachine-releases-all.json?ref=gh-pages";

#[derive(Debug, Deserialize)]
struct MajorReleases {
    /// `[full version][build tag]`
    updates: BTreeMap<String, BTreeMap<String, BuildReleases>>,
}

#[derive(Debug, Deserialize)]
struct BuildReleases {
    #[serde(default)]
    ea: String,
    /// `[package type][platform-arch][content type]`
    assets: BTreeMap<String, BTreeMap<String, BTreeMap<String, SapMachineAsset>>>,
}

#[derive(Debug, Deserialize)]
struct SapMachineAsset {
    #[serde(default)]
    checksum: Option<String>,
    url: String,
}

pub struct SapMachine {
    options: InstallerOptions,
}

impl SapMachine {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    fn releases(
        &self,
        ctx: &InstallContext,
    ) -> ESResult<BTreeMap<String, MajorReleases>, DistributionError> {
        debug!("Trying to fetch available SapMachine versions info from {}", RELEASES_URL);
        match fetch_json(ctx.http, RELEASES_URL, &[]) {
            Ok(releases) => Ok(releases),
            Err(err) => {
                debug!("Fetching SapMachine versions from the primary url failed: {:?}", err);
                let headers = github_headers(ctx.github_token.as_deref());
                fetch_json(ctx.http, RELEASES_BACKUP_URL, &headers).attach_with(|| {
                    UserMessage::new(
                        "Couldn't fetch SapMachine versions information from both primary and backup urls",
                    )
                })
            }
        }
    }

    /// `platform-arch` key of the asset map.
    fn asset_key(&self, platform: &Platform) -> String {
        let arch = self.options.distribution_architecture();
        if platform.os == Os::Linux && platform.libc == Libc::Musl {
            format!("linux-{}-musl", arch)
        } else {
            format!("{}-{}", platform.common_name(), arch)
        }
    }
}

/// Semantic version from a build tag such as `sapmachine-17.0.7+7` or `sapmachine-11.0.16.1+1`.
fn build_version(tag: &str) -> Option<String> {
    let mut version = tag.replacen("sapmachine-", "", 1);
    if !version.contains('.') {
        let (major, build) = match version.split_once('+') {
            Some((major, build)) => (major.to_string(), format!("+{}", build)),
            None => (version.clone(), String::new()),
        };
        version = format!("{}.0.0{}", major, build);
    }
    if version.split('.').count() > 3 {
        version = version.replacen('+', ".", 1);
    }
    let version = convert_version_to_semver(&version);
    Version::parse(&version).is_ok().then_some(version)
}

impl JavaDistribution for SapMachine {
    fn name(&self) -> &str {
        "SapMachine"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        debug!("Only stable versions: {}", self.options.stable());
        if !["jdk", "jre"].contains(&self.options.package_type.as_str()) {
            return Err(user_error(
                DistributionError::Configuration,
                "SapMachine provides only the `jdk` and `jre` package type",
            ));
        }

        let releases = self.releases(ctx)?;
        let asset_key = self.asset_key(&ctx.platform);
        let mut eligible = Vec::new();
        for major in releases.into_values() {
            for builds in major.updates.into_values() {
                for (tag, mut build) in builds {
                    let Some(version) = build_version(&tag) else {
                        debug!("Invalid version: {}", tag);
                        continue;
                    };
                    if self.options.stable() && build.ea == "true" {
                        continue;
                    }
                    let Some(mut content_types) = build
                        .assets
                        .remove(&self.options.package_type)
                        .and_then(|mut assets| assets.remove(&asset_key))
                    else {
                        continue;
                    };
                    for content_type in ["tar.gz", "zip"] {
                        if let Some(asset) = content_types.remove(content_type) {
                            eligible.push(
                                JavaRelease::new(version.clone(), asset.url)
                                    .with_checksum(asset.checksum),
                            );
                        }
                    }
                }
            }
        }

        let mut satisfied = eligible
            .into_iter()
            .filter(|release| range.is_satisfied_by(&release.version))
            .filter_map(|release| Some((Version::parse(&release.version).ok()?, release)))
            .collect::<Vec<_>>();
        satisfied.sort_by(|a, b| compare_build(&b.0, &a.0));
        let mut release = satisfied
            .into_iter()
            .next()
            .map(|(_, release)| release)
            .ok_or_else(|| {
                user_error(
                    DistributionError::Resolution,
                    format!(
                        "Couldn't find any satisfied version for the specified java-version: \"{}\" and architecture: \"{}\".",
                        range.range(),
                        self.options.architecture
                    ),
                )
            })?;
        release.checksum = release_digest(ctx, release.checksum.take());
        Ok(release)
    }
}

/// The catalog links to a `.sha256.txt` file instead of embedding the digest. A digest that
/// cannot be fetched or is not hex is dropped and the download goes unverified.
fn release_digest(ctx: &InstallContext, checksum: Option<String>) -> Option<String> {
    let checksum = checksum?;
    let digest = if checksum.starts_with("https://") || checksum.starts_with("http://") {
        debug!("Fetching SapMachine checksum from {}", checksum);
        match ctx
            .http
            .get(&checksum, &[])
            .and_then(|response| response.error_for_status())
        {
            Ok(response) => String::from_utf8_lossy(&response.body)
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
            Err(err) => {
                warn!("Could not fetch SapMachine checksum from {}: {:?}", checksum, err);
                return None;
            }
        }
    } else {
        checksum
    };
    if digest.is_empty() || hex::decode(&digest).is_err() {
        warn!("Ignoring invalid SapMachine checksum '{}'", digest);
        return None;
    }
    Some(digest)
}
