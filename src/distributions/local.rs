use crate::archive::{extract, ArchiveKind};
use crate::distributions::{user_error, DistributionError, JavaDistribution, JavaRelease};
use crate::error::ESResult;
use crate::installer::{
    finish_install, find_in_toolcache, toolcache_folder_name, toolcache_version_name,
    InstallContext, InstallOutcome, InstallResult, InstallerOptions,
};
use crate::tui::jdk_color;
use crate::version::VersionRange;
use error_stack::{Report, ResultExt};
use owo_colors::{OwoColorize, Stream};
use std::path::PathBuf;

const NOT_REMOTE: &str = "This method should not be implemented in local file provider";

/// Installs a JDK archive that is already on disk instead of downloading one.
pub struct LocalDistribution {
    options: InstallerOptions,
    jdk_file: Option<PathBuf>,
}

impl LocalDistribution {
    pub fn new(options: InstallerOptions, jdk_file: Option<PathBuf>) -> Self {
        Self { options, jdk_file }
    }

    fn unpack(&self, ctx: &InstallContext) -> ESResult<InstallResult, DistributionError> {
        let Some(jdk_file) = &self.jdk_file else {
            return Err(user_error(
                DistributionError::LocalFile,
                "'jdkFile' is not specified",
            ));
        };
        let jdk_file = std::path::absolute(jdk_file)
            .change_context(DistributionError::LocalFile)
            .attach_with(|| format!("Could not resolve {}", jdk_file.display()))?;
        if !jdk_file.is_file() {
            return Err(user_error(
                DistributionError::LocalFile,
                format!("JDK file was not found in path '{}'", jdk_file.display()),
            ));
        }
        let kind = ArchiveKind::from_path(&jdk_file.to_string_lossy()).ok_or_else(|| {
            user_error(
                DistributionError::LocalFile,
                format!("Unknown archive type for '{}'", jdk_file.display()),
            )
        })?;

        eprintln!("Extracting Java from '{}'", jdk_file.display());
        let scratch = ctx
            .toolcache
            .temp_dir()
            .change_context(DistributionError::Install)?;
        let extracted = extract(&jdk_file, kind, scratch.path())
            .change_context(DistributionError::Install)?;

        let version = self.options.version.range().to_string();
        let path = ctx
            .toolcache
            .cache_dir(
                &extracted,
                &toolcache_folder_name(self.name(), &self.options.package_type),
                &toolcache_version_name(&version, self.options.stable()),
                &self.options.architecture,
            )
            .change_context(DistributionError::Install)?;
        Ok(InstallResult { version, path })
    }
}

impl JavaDistribution for LocalDistribution {
    fn name(&self) -> &str {
        "jdkfile"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        _ctx: &InstallContext,
        _range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        Err(Report::new(DistributionError::Install).attach(NOT_REMOTE))
    }

    fn download_tool(
        &self,
        _ctx: &InstallContext,
        _release: &JavaRelease,
    ) -> ESResult<InstallResult, DistributionError> {
        Err(Report::new(DistributionError::Install).attach(NOT_REMOTE))
    }

    /// A cached install wins regardless of `check_latest`; there is nothing newer to check.
    fn setup_java(&self, ctx: &InstallContext) -> ESResult<InstallOutcome, DistributionError> {
        let cached = find_in_toolcache(ctx.toolcache, self.name(), &self.options)
            .change_context(DistributionError::Install)?;
        let found = match cached {
            Some(found) => {
                eprintln!(
                    "Resolved Java {} from tool-cache",
                    found
                        .version
                        .if_supports_color(Stream::Stderr, |s| s.color(jdk_color()))
                );
                found
            }
            None => {
                eprintln!(
                    "Java {} was not found in tool-cache. Trying to unpack JDK file...",
                    self.options.version
                );
                self.unpack(ctx)?
            }
        };
        Ok(finish_install(
            self.name(),
            &self.options,
            &ctx.platform,
            found,
        ))
    }
}
