use crate::distributions::oracle::{checked_major, download_architecture, download_platform};
use crate::distributions::{user_error, DistributionError, JavaDistribution, JavaRelease};
use crate::error::ESResult;
use crate::http_client::github_headers;
use crate::installer::{download_archive_extension, InstallContext, InstallerOptions};
use crate::platform::{Os, Platform};
use crate::version::VersionRange;
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use tracing::debug;

const GRAALVM_DL_BASE: &str = "https://download.oracle.com/graalvm";

#[derive(Debug, Deserialize)]
struct EaVersion {
    version: String,
    latest: bool,
    download_base_url: String,
    files: Vec<EaFile>,
}

#[derive(Debug, Deserialize)]
struct EaFile {
    filename: String,
    arch: String,
    platform: String,
}

/// Platform naming in the EA build metadata.
fn ea_platform(platform: &Platform) -> &'static str {
    match platform.os {
        Os::MacOs => "darwin",
        _ => platform.common_name(),
    }
}

pub struct GraalVm {
    options: InstallerOptions,
}

impl GraalVm {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    fn find_ea_build(
        &self,
        ctx: &InstallContext,
        arch: &str,
        ea_version: &str,
    ) -> ESResult<JavaRelease, DistributionError> {
        let url = format!(
            "https://api.github.com/repos/graalvm/oracle-graalvm-ea-builds/contents/versions/{}.json?ref=main",
            ea_version
        );
        debug!("Trying to fetch available version info for GraalVM EA builds from '{}'", url);
        let response = ctx
            .http
            .get(&url, &github_headers(ctx.github_token.as_deref()))
            .change_context(DistributionError::Transport)
            .attach_with(|| {
                format!("Fetching version info for GraalVM EA builds from '{}' failed", url)
            })?;
        if response.status == 404 {
            return Err(user_error(
                DistributionError::Resolution,
                format!(
                    "No GraalVM EA build found. Are you sure java-version: '{}' is correct?",
                    ea_version
                ),
            ));
        }
        let versions: Vec<EaVersion> = response
            .error_for_status()
            .and_then(|r| r.json())
            .change_context(DistributionError::Transport)
            .attach_with(|| {
                format!("Fetching version info for GraalVM EA builds from '{}' failed", url)
            })?;

        let Some(latest) = versions.into_iter().find(|v| v.latest) else {
            return Err(user_error(
                DistributionError::Resolution,
                format!("Unable to find latest version for '{}'", ea_version),
            ));
        };
        let platform = ea_platform(&ctx.platform);
        let file = latest
            .files
            .iter()
            .find(|f| f.arch == arch && f.platform == platform)
            .filter(|f| f.filename.starts_with("graalvm-jdk-"))
            .ok_or_else(|| {
                user_error(
                    DistributionError::Resolution,
                    format!("Unable to find file metadata for '{}'", ea_version),
                )
            })?;
        Ok(JavaRelease::new(
            latest.version.clone(),
            format!("{}{}", latest.download_base_url, file.filename),
        ))
    }
}

impl JavaDistribution for GraalVm {
    fn name(&self) -> &str {
        "GraalVM"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        let arch = download_architecture(&self.options)?;
        if !self.options.stable() {
            return self.find_ea_build(ctx, &arch, &format!("{}-ea", range.range()));
        }
        if self.options.package_type != "jdk" {
            return Err(user_error(
                DistributionError::Configuration,
                "GraalVM provides only the `jdk` package type",
            ));
        }
        let os = download_platform(&ctx.platform)?;
        let extension = download_archive_extension(&ctx.platform);
        let major = checked_major(range, "GraalVM")?;
        let url = if range.is_major_only() {
            format!(
                "{}/{}/latest/graalvm-jdk-{}_{}-{}_bin.{}",
                GRAALVM_DL_BASE, major, major, os, arch, extension
            )
        } else {
            format!(
                "{}/{}/archive/graalvm-jdk-{}_{}-{}_bin.{}",
                GRAALVM_DL_BASE,
                major,
                range.range(),
                os,
                arch,
                extension
            )
        };

        let status = ctx
            .http
            .head(&url)
            .change_context(DistributionError::Transport)?;
        match status {
            200 => Ok(JavaRelease::new(range.range(), url)),
            404 => Err(user_error(
                DistributionError::Resolution,
                format!("Could not find GraalVM for SemVer {}", range.range()),
            )),
            other => Err(Report::new(DistributionError::Transport).attach(format!(
                "Http request for GraalVM failed with status code: {}",
                other
            ))),
        }
    }
}
