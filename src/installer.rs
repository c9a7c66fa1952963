use crate::archive::{extract, ArchiveKind};
use crate::checksum_verifier::ChecksumVerifier;
use crate::distributions::{DistributionError, JavaDistribution, JavaRelease};
use crate::environment::EnvironmentChange;
use crate::error::ESResult;
use crate::http_client::HttpClient;
use crate::platform::{host_architecture, Platform};
use crate::toolcache::{Toolcache, ToolcacheError};
use crate::tui::jdk_color;
use crate::version::{compare_build, VersionRange};
use error_stack::ResultExt;
use owo_colors::{OwoColorize, Stream};
use semver::Version;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const MACOS_JAVA_CONTENT_POSTFIX: &str = "Contents/Home";

/// What to install. Fixed once a distribution is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerOptions {
    pub version: VersionRange,
    /// Architecture as given by the caller; also the toolcache key.
    pub architecture: String,
    /// `jdk`, `jre`, optionally with a `+feature` suffix such as `jdk+fx`.
    pub package_type: String,
    pub check_latest: bool,
}

impl InstallerOptions {
    pub fn new(
        version: VersionRange,
        architecture: Option<&str>,
        package_type: &str,
        check_latest: bool,
    ) -> Self {
        Self {
            version,
            architecture: architecture
                .filter(|a| !a.is_empty())
                .unwrap_or(host_architecture())
                .to_string(),
            package_type: package_type.to_string(),
            check_latest,
        }
    }

    pub fn stable(&self) -> bool {
        self.version.is_stable()
    }

    /// Architecture in the vocabulary most vendor catalogs use.
    pub fn distribution_architecture(&self) -> String {
        distribution_architecture(&self.architecture)
    }
}

/// Collaborators shared by every distribution during one install.
pub struct InstallContext<'a> {
    pub http: &'a dyn HttpClient,
    pub toolcache: &'a dyn Toolcache,
    pub platform: Platform,
    pub github_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub version: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub result: InstallResult,
    pub environment: EnvironmentChange,
}

pub fn toolcache_folder_name(distribution: &str, package_type: &str) -> String {
    format!("Java_{}_{}", distribution, package_type)
}

/// Directory name a resolved version is cached under. `+` is not used on disk.
pub fn toolcache_version_name(version: &str, stable: bool) -> String {
    if stable {
        version.replacen('+', "-", 1)
    } else if version.contains('+') {
        version.replacen('+', "-ea.", 1)
    } else {
        format!("{}-ea", version)
    }
}

/// Inverse of [`toolcache_version_name`], returning the version and its stability.
fn parse_toolcache_version_name(name: &str) -> (String, bool) {
    let stable = !name.contains("-ea");
    let version = name.replacen("-ea.", "+", 1);
    let version = version.strip_suffix("-ea").unwrap_or(&version);
    (version.replacen('-', "+", 1), stable)
}

/// The newest cached install that satisfies the requested range and stability.
pub fn find_in_toolcache(
    toolcache: &dyn Toolcache,
    distribution: &str,
    options: &InstallerOptions,
) -> ESResult<Option<InstallResult>, ToolcacheError> {
    let folder = toolcache_folder_name(distribution, &options.package_type);
    let mut candidates = Vec::new();
    for item in toolcache.find_all_versions(&folder, &options.architecture)? {
        let (version, stable) = parse_toolcache_version_name(&item);
        if stable != options.stable() || !options.version.is_satisfied_by(&version) {
            continue;
        }
        let Some(path) = toolcache.find(&folder, &item, &options.architecture) else {
            continue;
        };
        let Ok(parsed) = Version::parse(&version) else {
            continue;
        };
        candidates.push((parsed, InstallResult { version, path }));
    }
    debug!(
        "Cached versions satisfying {}: {:?}",
        options.version,
        candidates.iter().map(|(_, r)| &r.version).collect::<Vec<_>>()
    );
    candidates.sort_by(|a, b| compare_build(&b.0, &a.0));
    Ok(candidates.into_iter().next().map(|(_, result)| result))
}

/// Map Node-style architecture names onto the ones vendor catalogs use.
pub fn distribution_architecture(arch: &str) -> String {
    match arch {
        "amd64" => "x64",
        "ia32" => "x86",
        "arm64" => "aarch64",
        other => other,
    }
    .to_string()
}

pub fn download_archive_extension(platform: &Platform) -> &'static str {
    if platform.is_windows() {
        "zip"
    } else {
        "tar.gz"
    }
}

/// Resolve, download, and register a JDK for `distribution`, reusing the toolcache when it
/// can.
pub fn setup_java<D: JavaDistribution + ?Sized>(
    distribution: &D,
    ctx: &InstallContext,
) -> ESResult<InstallOutcome, DistributionError> {
    let options = distribution.options();
    let cached = find_in_toolcache(ctx.toolcache, distribution.name(), options)
        .change_context(DistributionError::Install)?;

    let found = match cached {
        Some(found) if !options.check_latest => {
            eprintln!(
                "Resolved Java {} from tool-cache",
                found
                    .version
                    .if_supports_color(Stream::Stderr, |s| s.color(jdk_color()))
            );
            found
        }
        cached => {
            eprintln!("Trying to resolve the latest version from remote");
            let release = distribution.find_package_for_download(ctx, &options.version)?;
            eprintln!(
                "Resolved latest version as {}",
                release
                    .version
                    .if_supports_color(Stream::Stderr, |s| s.color(jdk_color()))
            );
            match cached {
                Some(found) if found.version == release.version => {
                    eprintln!("Resolved Java {} from tool-cache", found.version);
                    found
                }
                _ => {
                    eprintln!("Trying to download...");
                    let downloaded = distribution.download_tool(ctx, &release)?;
                    eprintln!("Java {} was downloaded", downloaded.version);
                    downloaded
                }
            }
        }
    };

    Ok(finish_install(
        distribution.name(),
        options,
        &ctx.platform,
        found,
    ))
}

/// Apply the macOS bundle layout and describe the environment for a finished install.
pub(crate) fn finish_install(
    distribution: &str,
    options: &InstallerOptions,
    platform: &Platform,
    mut found: InstallResult,
) -> InstallOutcome {
    if platform.is_macos() {
        let bundle_home = found.path.join(MACOS_JAVA_CONTENT_POSTFIX);
        if bundle_home.exists() {
            found.path = bundle_home;
        }
    }
    eprintln!(
        "Setting Java {} as the default",
        found
            .version
            .if_supports_color(Stream::Stderr, |s| s.color(jdk_color()))
    );
    let environment = EnvironmentChange::java_default(
        distribution,
        &found.version,
        &found.path,
        &options.architecture,
    );
    InstallOutcome {
        result: found,
        environment,
    }
}

/// Download `release`, verify it if a digest is known, unpack it and store it in the toolcache.
pub fn download_and_cache(
    distribution: &str,
    options: &InstallerOptions,
    ctx: &InstallContext,
    release: &JavaRelease,
) -> ESResult<InstallResult, DistributionError> {
    eprintln!(
        "Downloading Java {} ({}) from {} ...",
        release
            .version
            .if_supports_color(Stream::Stderr, |s| s.color(jdk_color())),
        distribution,
        release.url
    );
    let scratch = ctx
        .toolcache
        .temp_dir()
        .change_context(DistributionError::Install)?;
    let file_name = archive_file_name(&release.url);
    let kind = ArchiveKind::from_path(&file_name).unwrap_or_else(|| {
        if ctx.platform.is_windows() {
            ArchiveKind::Zip
        } else {
            ArchiveKind::TarGz
        }
    });
    let archive_path = scratch
        .path()
        .join(format!("jdk.{}", kind.extension()));
    download_to(ctx.http, release, &archive_path)?;

    eprintln!("Extracting Java archive...");
    let extracted = extract(&archive_path, kind, &scratch.path().join("extracted"))
        .change_context(DistributionError::Install)?;

    let path = ctx
        .toolcache
        .cache_dir(
            &extracted,
            &toolcache_folder_name(distribution, &options.package_type),
            &toolcache_version_name(&release.version, options.stable()),
            &options.architecture,
        )
        .change_context(DistributionError::Install)?;

    Ok(InstallResult {
        version: release.version.clone(),
        path,
    })
}

fn download_to(
    http: &dyn HttpClient,
    release: &JavaRelease,
    destination: &Path,
) -> ESResult<(), DistributionError> {
    let mut file = File::create(destination)
        .change_context(DistributionError::Install)
        .attach_with(|| format!("Could not create {}", destination.display()))?;
    match &release.checksum {
        Some(checksum) => {
            let mut verifier = ChecksumVerifier::new(checksum, Box::new(Sha256::new()), &mut file)
                .change_context(DistributionError::Install)?;
            http.download(&release.url, &mut verifier)
                .change_context(DistributionError::Transport)?;
            verifier
                .verify()
                .change_context(DistributionError::Install)
                .attach_with(|| format!("URL: {}", release.url))?;
        }
        None => {
            http.download(&release.url, &mut file)
                .change_context(DistributionError::Transport)?;
        }
    }
    file.flush().change_context(DistributionError::Install)?;
    Ok(())
}

/// Last path segment of a URL, without any query string.
fn archive_file_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}
