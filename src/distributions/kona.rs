use crate::distributions::{fetch_json, user_error, DistributionError, JavaDistribution, JavaRelease};
use crate::error::ESResult;
use crate::installer::{InstallContext, InstallerOptions};
use crate::version::{compare_build, VersionRange};
use error_stack::ResultExt;
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

const RELEASES_URL: &str = "https://tencent.github.io/konajdk/releases/kona-v1.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KonaRelease {
    version: String,
    latest: bool,
    base_url: String,
    files: Vec<KonaFile>,
}

#[derive(Debug, Deserialize)]
struct KonaFile {
    os: String,
    arch: String,
    filename: String,
    #[serde(default)]
    checksum: Option<String>,
}

pub struct Kona {
    options: InstallerOptions,
}

impl Kona {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    fn arch(&self) -> String {
        match self.options.distribution_architecture().as_str() {
            "x64" => "x86_64".to_string(),
            other => other.to_string(),
        }
    }
}

impl JavaDistribution for Kona {
    fn name(&self) -> &str {
        "Kona"
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
                "Kona provides stable releases only",
            ));
        }
        if self.options.package_type != "jdk" {
            return Err(user_error(
                DistributionError::Configuration,
                "Kona provides jdk only",
            ));
        }

        debug!("Fetching Kona release info from URL: {}", RELEASES_URL);
        let catalog: BTreeMap<String, Vec<KonaRelease>> = fetch_json(ctx.http, RELEASES_URL, &[])
            .attach("Couldn't fetch Kona release information")?;
        let os = ctx.platform.common_name();
        let arch = self.arch();

        let mut satisfied = catalog
            .into_values()
            .flatten()
            .filter(|release| release.latest)
            .filter_map(|release| {
                let file = release
                    .files
                    .into_iter()
                    .find(|f| f.os == os && f.arch == arch)?;
                let parsed = Version::parse(&release.version).ok()?;
                range.is_satisfied_by(&release.version).then(|| {
                    let url = format!("{}{}", release.base_url, file.filename);
                    (
                        parsed,
                        JavaRelease::new(release.version, url).with_checksum(file.checksum),
                    )
                })
            })
            .collect::<Vec<_>>();
        debug!(
            "Available Kona releases: {:?}",
            satisfied.iter().map(|(_, r)| &r.version).collect::<Vec<_>>()
        );
        satisfied.sort_by(|a, b| compare_build(&b.0, &a.0));
        satisfied
            .into_iter()
            .next()
            .map(|(_, release)| release)
            .ok_or_else(|| {
                user_error(
                    DistributionError::Resolution,
                    format!(
                        "No Kona release for the specified version \"{}\" on OS \"{}\" and arch \"{}\".",
                        range.range(),
                        os,
                        arch
                    ),
                )
            })
    }
}
