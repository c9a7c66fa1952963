use crate::distributions::{user_error, DistributionError, JavaDistribution, JavaRelease};
use crate::error::ESResult;
use crate::installer::{download_archive_extension, InstallContext, InstallerOptions};
use crate::platform::{Os, Platform};
use crate::version::VersionRange;
use error_stack::{Report, ResultExt};

const ORACLE_DL_BASE: &str = "https://download.oracle.com/java";

/// `linux`/`macos`/`windows` as used in Oracle download file names.
pub(super) fn download_platform(platform: &Platform) -> Result<&'static str, Report<DistributionError>> {
    match platform.os {
        Os::MacOs => Ok("macos"),
        Os::Windows => Ok("windows"),
        Os::Linux => Ok("linux"),
        _ => Err(user_error(
            DistributionError::Configuration,
            format!(
                "Platform '{}' is not supported. Supported platforms: 'linux', 'macos', 'windows'",
                platform.common_name()
            ),
        )),
    }
}

/// Architecture check shared by the Oracle-hosted downloads.
pub(super) fn download_architecture(
    options: &InstallerOptions,
) -> Result<String, Report<DistributionError>> {
    let arch = options.distribution_architecture();
    if arch != "x64" && arch != "aarch64" {
        return Err(user_error(
            DistributionError::Configuration,
            format!("Unsupported architecture: {}", options.architecture),
        ));
    }
    Ok(arch)
}

/// Leading component of a range, which must be a JDK of at least 17.
pub(super) fn checked_major<'r>(
    range: &'r VersionRange,
    product: &str,
) -> Result<&'r str, Report<DistributionError>> {
    let major = range.major();
    if major.parse::<u64>().map_or(true, |m| m < 17) {
        return Err(user_error(
            DistributionError::Configuration,
            format!("{} is only supported for JDK 17 and later", product),
        ));
    }
    Ok(major)
}

pub struct Oracle {
    options: InstallerOptions,
}

impl Oracle {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    /// Probe order: `latest` (bare majors only), then `archive`.
    fn candidate_urls(&self, platform: &Platform, arch: &str, range: &VersionRange) -> ESResult<Vec<String>, DistributionError> {
        let os = download_platform(platform)?;
        let extension = download_archive_extension(platform);
        let major = checked_major(range, "Oracle JDK")?;
        let mut urls = Vec::new();
        if range.is_major_only() {
            urls.push(format!(
                "{}/{}/latest/jdk-{}_{}-{}_bin.{}",
                ORACLE_DL_BASE, major, major, os, arch, extension
            ));
        }
        urls.push(format!(
            "{}/{}/archive/jdk-{}_{}-{}_bin.{}",
            ORACLE_DL_BASE,
            major,
            range.range(),
            os,
            arch,
            extension
        ));
        Ok(urls)
    }
}

impl JavaDistribution for Oracle {
    fn name(&self) -> &str {
        "Oracle"
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
            return Err(user_error(
                DistributionError::Configuration,
                "Early access versions are not supported",
            ));
        }
        if self.options.package_type != "jdk" {
            return Err(user_error(
                DistributionError::Configuration,
                "Oracle JDK provides only the `jdk` package type",
            ));
        }

        for url in self.candidate_urls(&ctx.platform, &arch, range)? {
            let status = ctx
                .http
                .head(&url)
                .change_context(DistributionError::Transport)?;
            match status {
                200 => return Ok(JavaRelease::new(range.range(), url)),
                404 => continue,
                other => {
                    return Err(Report::new(DistributionError::Transport).attach(format!(
                        "Http request for Oracle JDK failed with status code: {}",
                        other
                    )))
                }
            }
        }
        Err(user_error(
            DistributionError::Resolution,
            format!("Could not find Oracle JDK for SemVer {}", range.range()),
        ))
    }
}
