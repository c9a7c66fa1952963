//! The Adoptium v3 asset API family: Temurin, the legacy AdoptOpenJDK builds, and IBM Semeru.

use crate::distributions::{
    resolve_best_release, user_error, DistributionError, JavaDistribution, JavaRelease,
};
use crate::error::ESResult;
use crate::installer::{InstallContext, InstallerOptions};
use crate::platform::{Os, Platform};
use crate::version::VersionRange;
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use tracing::debug;

/// `[1.0,100.0]`, every version the API knows.
const ALL_VERSIONS: &str = "%5B1.0,100.0%5D";
const PAGE_SIZE: u32 = 20;

const SEMERU_ARCHITECTURES: &[&str] = &["x64", "x86", "ppc64le", "ppc64", "s390x", "aarch64"];

#[derive(Debug, Deserialize)]
struct AssetVersion {
    binaries: Vec<Binary>,
    version_data: VersionData,
}

#[derive(Debug, Deserialize)]
struct Binary {
    package: Package,
}

#[derive(Debug, Deserialize)]
struct Package {
    link: String,
    #[serde(default)]
    checksum: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionData {
    semver: String,
}

struct AssetApi {
    base_url: &'static str,
    vendor: &'static str,
    jvm_impl: &'static str,
}

impl AssetApi {
    fn page_url(&self, options: &InstallerOptions, platform: &Platform, page: u32) -> String {
        format!(
            "{}/v3/assets/version/{}?project=jdk&vendor={}&heap_size=normal&sort_method=DEFAULT\
             &sort_order=DESC&os={}&architecture={}&image_type={}&release_type={}&jvm_impl={}\
             &page_size={}&page={}",
            self.base_url,
            ALL_VERSIONS,
            self.vendor,
            platform_name(platform),
            options.distribution_architecture(),
            options.package_type,
            if options.stable() { "ga" } else { "ea" },
            self.jvm_impl,
            PAGE_SIZE,
            page
        )
    }

    /// Walk the pages until the API answers with an empty list.
    fn releases(
        &self,
        ctx: &InstallContext,
        options: &InstallerOptions,
    ) -> ESResult<Vec<JavaRelease>, DistributionError> {
        let mut releases = Vec::new();
        let mut page = 0;
        loop {
            let url = self.page_url(options, &ctx.platform, page);
            if page == 0 {
                debug!("Gathering available versions from '{}'", url);
            }
            let response = ctx
                .http
                .get(&url, &[])
                .change_context(DistributionError::Transport)?;
            if response.status == 404 {
                break;
            }
            let assets: Vec<AssetVersion> = response
                .error_for_status()
                .and_then(|r| r.json())
                .change_context(DistributionError::Transport)
                .attach_with(|| format!("URL: {}", url))?;
            if assets.is_empty() {
                break;
            }
            releases.extend(assets.into_iter().filter_map(|asset| {
                let binary = asset.binaries.into_iter().next()?;
                let version = if options.stable() {
                    asset.version_data.semver
                } else {
                    // 17.0.0-beta+33.0.202107301459 -> 17.0.0+33.0.202107301459
                    asset.version_data.semver.replace("-beta+", "+")
                };
                Some(JavaRelease::new(version, binary.package.link).with_checksum(binary.package.checksum))
            }));
            page += 1;
        }
        debug!("Available versions: [{}]", releases.len());
        Ok(releases)
    }
}

fn platform_name(platform: &Platform) -> &'static str {
    match platform.os {
        Os::MacOs => "mac",
        _ => platform.common_name(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdoptImplementation {
    Hotspot,
    OpenJ9,
}

/// The retired AdoptOpenJDK builds.
pub struct Adopt {
    options: InstallerOptions,
    implementation: AdoptImplementation,
}

impl Adopt {
    pub fn new(options: InstallerOptions, implementation: AdoptImplementation) -> Self {
        Self {
            options,
            implementation,
        }
    }

    fn api(&self) -> AssetApi {
        AssetApi {
            base_url: "https://api.adoptopenjdk.net",
            vendor: "adoptopenjdk",
            jvm_impl: match self.implementation {
                AdoptImplementation::Hotspot => "hotspot",
                AdoptImplementation::OpenJ9 => "openj9",
            },
        }
    }
}

impl JavaDistribution for Adopt {
    fn name(&self) -> &str {
        match self.implementation {
            AdoptImplementation::Hotspot => "Adopt-Hotspot",
            AdoptImplementation::OpenJ9 => "Adopt-OpenJ9",
        }
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        resolve_best_release(range, self.api().releases(ctx, &self.options)?)
    }
}

pub struct Temurin {
    options: InstallerOptions,
}

impl Temurin {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }
}

impl JavaDistribution for Temurin {
    fn name(&self) -> &str {
        "Temurin-Hotspot"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        let api = AssetApi {
            base_url: "https://api.adoptium.net",
            vendor: "adoptium",
            jvm_impl: "hotspot",
        };
        resolve_best_release(range, api.releases(ctx, &self.options)?)
    }
}

/// IBM Semeru Runtime (OpenJ9).
pub struct Semeru {
    options: InstallerOptions,
}

impl Semeru {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    fn check_options(&self) -> Result<(), Report<DistributionError>> {
        let arch = self.options.distribution_architecture();
        if !SEMERU_ARCHITECTURES.contains(&arch.as_str()) {
            return Err(user_error(
                DistributionError::Configuration,
                format!(
                    "Unsupported architecture for IBM Semeru: {}, the following are supported: {}",
                    self.options.architecture,
                    SEMERU_ARCHITECTURES.join(", ")
                ),
            ));
        }
        if !self.options.stable() {
            return Err(user_error(
                DistributionError::Configuration,
                "IBM Semeru does not provide builds for early access versions",
            ));
        }
        if self.options.package_type != "jdk" && self.options.package_type != "jre" {
            return Err(user_error(
                DistributionError::Configuration,
                "IBM Semeru only provide `jdk` and `jre` package types",
            ));
        }
        Ok(())
    }
}

impl JavaDistribution for Semeru {
    fn name(&self) -> &str {
        "IBM_Semeru"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        self.check_options()?;
        let api = AssetApi {
            base_url: "https://api.adoptopenjdk.net",
            vendor: "ibm",
            jvm_impl: "openj9",
        };
        resolve_best_release(range, api.releases(ctx, &self.options)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{user_messages, UserMessage};
    use crate::http_client::fake::FakeHttpClient;
    use crate::installer::test::context;
    use crate::toolcache::test::FakeToolcache;

    fn options(version: &str, arch: &str, package_type: &str) -> InstallerOptions {
        InstallerOptions::new(version.parse().unwrap(), Some(arch), package_type, false)
    }

    fn page(versions: &[(&str, &str)]) -> String {
        let items = versions
            .iter()
            .map(|(semver, link)| {
                format!(
                    r#"{{"binaries":[{{"package":{{"link":"{}","checksum":"abc"}}}}],"version_data":{{"semver":"{}"}}}}"#,
                    link, semver
                )
            })
            .collect::<Vec<_>>();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn test_temurin_page_url() {
        let api = AssetApi {
            base_url: "https://api.adoptium.net",
            vendor: "adoptium",
            jvm_impl: "hotspot",
        };
        assert_eq!(
            "https://api.adoptium.net/v3/assets/version/%5B1.0,100.0%5D?project=jdk&vendor=adoptium\
             &heap_size=normal&sort_method=DEFAULT&sort_order=DESC&os=mac&architecture=x64\
             &image_type=jdk&release_type=ga&jvm_impl=hotspot&page_size=20&page=0",
            api.page_url(&options("11", "x64", "jdk"), &Platform::new(Os::MacOs), 0)
        );
        assert_eq!(
            "https://api.adoptium.net/v3/assets/version/%5B1.0,100.0%5D?project=jdk&vendor=adoptium\
             &heap_size=normal&sort_method=DEFAULT&sort_order=DESC&os=windows&architecture=aarch64\
             &image_type=jre&release_type=ea&jvm_impl=hotspot&page_size=20&page=3",
            api.page_url(&options("21-ea", "arm64", "jre"), &Platform::new(Os::Windows), 3)
        );
    }

    #[test]
    fn test_temurin_pages_until_empty() {
        let temurin = Temurin::new(options("17", "x64", "jdk"));
        let api = AssetApi {
            base_url: "https://api.adoptium.net",
            vendor: "adoptium",
            jvm_impl: "hotspot",
        };
        let platform = Platform::new(Os::Linux);
        let http = FakeHttpClient::new()
            .with_json(
                &api.page_url(&temurin.options, &platform, 0),
                &page(&[("21.0.1+12", "https://x/21"), ("17.0.8+7", "https://x/17.8")]),
            )
            .with_json(
                &api.page_url(&temurin.options, &platform, 1),
                &page(&[("17.0.10+7", "https://x/17.10"), ("11.0.20+8", "https://x/11")]),
            )
            .with_json(&api.page_url(&temurin.options, &platform, 2), "[]");
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);

        let release = temurin
            .find_package_for_download(&ctx, &"17".parse().unwrap())
            .unwrap();
        assert_eq!("17.0.10+7", release.version);
        assert_eq!("https://x/17.10", release.url);
        assert_eq!(Some("abc".to_string()), release.checksum);
        assert_eq!(3, http.requested_urls().len());

        let again = temurin
            .find_package_for_download(&ctx, &"17".parse().unwrap())
            .unwrap();
        assert_eq!(release, again);
    }

    #[test]
    fn test_temurin_early_access_versions() {
        let temurin = Temurin::new(options("17-ea", "x64", "jdk"));
        let api = AssetApi {
            base_url: "https://api.adoptium.net",
            vendor: "adoptium",
            jvm_impl: "hotspot",
        };
        let platform = Platform::new(Os::Linux);
        let http = FakeHttpClient::new().with_json(
            &api.page_url(&temurin.options, &platform, 0),
            &page(&[("17.0.0-beta+33.0.202107301459", "https://x/ea")]),
        );
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);
        let release = temurin
            .find_package_for_download(&ctx, &temurin.options.version)
            .unwrap();
        assert_eq!("17.0.0+33.0.202107301459", release.version);
    }

    #[test]
    fn test_adopt_names() {
        assert_eq!(
            "Adopt-Hotspot",
            Adopt::new(options("11", "x64", "jdk"), AdoptImplementation::Hotspot).name()
        );
        let openj9 = Adopt::new(options("11", "x64", "jdk"), AdoptImplementation::OpenJ9);
        assert_eq!("Adopt-OpenJ9", openj9.name());
        assert!(openj9
            .api()
            .page_url(&openj9.options, &Platform::new(Os::Linux), 0)
            .starts_with("https://api.adoptopenjdk.net/v3/assets/version/%5B1.0,100.0%5D?project=jdk&vendor=adoptopenjdk"));
    }

    #[test]
    fn test_adopt_not_found_lists_available() {
        let adopt = Adopt::new(options("13", "x64", "jdk"), AdoptImplementation::Hotspot);
        let http = FakeHttpClient::new().with_json(
            &adopt.api().page_url(&adopt.options, &Platform::new(Os::Linux), 0),
            &page(&[("11.0.2+9", "https://x/11")]),
        );
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);
        let err = adopt
            .find_package_for_download(&ctx, &adopt.options.version)
            .unwrap_err();
        assert_eq!(
            vec![&UserMessage::new(
                "Could not find satisfied version for SemVer '13'. \nAvailable versions: 11.0.2+9"
            )],
            user_messages(&err)
        );
    }

    #[test]
    fn test_semeru_rejections() {
        let http = FakeHttpClient::new();
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);
        let cases = [
            (
                options("17", "armv7", "jdk"),
                "Unsupported architecture for IBM Semeru: armv7, the following are supported: \
                 x64, x86, ppc64le, ppc64, s390x, aarch64",
            ),
            (
                options("17-ea", "x64", "jdk"),
                "IBM Semeru does not provide builds for early access versions",
            ),
            (
                options("17", "x64", "jdk+fx"),
                "IBM Semeru only provide `jdk` and `jre` package types",
            ),
        ];
        for (options, message) in cases {
            let semeru = Semeru::new(options);
            let err = semeru
                .find_package_for_download(&ctx, &semeru.options.version)
                .unwrap_err();
            assert_eq!(&DistributionError::Configuration, err.current_context());
            assert_eq!(vec![&UserMessage::new(message)], user_messages(&err));
        }
        assert!(http.requested_urls().is_empty());
    }
}
