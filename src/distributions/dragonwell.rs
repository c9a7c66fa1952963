use crate::distributions::{
    fetch_json, resolve_best_release, user_error, DistributionError, JavaDistribution,
    JavaRelease,
};
use crate::error::ESResult;
use crate::installer::{InstallContext, InstallerOptions};
use crate::platform::{Os, Platform};
use crate::version::VersionRange;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

const VERSIONS_URL: &str = "https://dragonwell-jdk.io/map_with_checksum.json";
const SUPPORTED_MAJORS: &[&str] = &["8", "11", "17", "21"];

/// `[major][jdk version][os][arch][edition]`
type VersionMap = BTreeMap<
    String,
    BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, DragonwellFile>>>>,
>;

#[derive(Debug, Deserialize)]
struct DragonwellFile {
    #[serde(default)]
    sha256: Option<String>,
    download_url: String,
}

pub struct Dragonwell {
    options: InstallerOptions,
}

impl Dragonwell {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }
}

fn platform_key(platform: &Platform) -> &'static str {
    match platform.os {
        Os::MacOs => "darwin",
        _ => platform.common_name(),
    }
}

/// Dragonwell versions carry extra components; only the first three are semantic.
fn trim_version(version: &str) -> String {
    version.split('.').take(3).collect::<Vec<_>>().join(".")
}

/// Standard is the reference build for 17, Extended for every other major.
fn preferred_edition(major: &str) -> &'static str {
    if major == "17" {
        "Standard"
    } else {
        "Extended"
    }
}

impl JavaDistribution for Dragonwell {
    fn name(&self) -> &str {
        "Dragonwell"
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
        let major = range.major();
        if !SUPPORTED_MAJORS.contains(&major) {
            return Err(user_error(
                DistributionError::Configuration,
                format!(
                    "Support dragonwell versions: {}",
                    SUPPORTED_MAJORS.join(", ")
                ),
            ));
        }

        let versions: VersionMap = fetch_json(ctx.http, VERSIONS_URL, &[])?;
        let platform = platform_key(&ctx.platform);
        let arch = self.options.distribution_architecture();
        let preferred = preferred_edition(major);

        let mut releases = Vec::new();
        for (catalog_major, jdk_versions) in versions {
            for (jdk_version, mut platforms) in jdk_versions {
                if jdk_version == "latest" {
                    continue;
                }
                let Some(editions) = platforms
                    .remove(platform)
                    .and_then(|mut archs| archs.remove(&arch))
                else {
                    continue;
                };
                let version = trim_version(&jdk_version);
                debug!("{}: {} {:?}", catalog_major, version, editions.keys());
                let (first, rest): (Vec<_>, Vec<_>) =
                    editions.into_iter().partition(|(edition, _)| edition == preferred);
                for (_, file) in first.into_iter().chain(rest) {
                    releases.push(
                        JavaRelease::new(version.clone(), file.download_url)
                            .with_checksum(file.sha256),
                    );
                }
            }
        }
        resolve_best_release(range, releases)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{user_messages, UserMessage};
    use crate::http_client::fake::FakeHttpClient;
    use crate::installer::test::context;
    use crate::toolcache::test::FakeToolcache;

    const VERSIONS: &str = r#"{
        "17": {
            "latest": {"linux": {"x64": {"Standard": {"sha256": "l", "download_url": "https://x/latest-17.tar.gz"}}}},
            "17.0.7.0.7": {"linux": {"x64": {
                "Extended": {"sha256": "e17", "download_url": "https://x/ext-17.0.7.tar.gz"},
                "Standard": {"sha256": "s17", "download_url": "https://x/std-17.0.7.tar.gz"}
            }}},
            "17.0.4.0.4": {"linux": {"x64": {"Standard": {"sha256": "old", "download_url": "https://x/std-17.0.4.tar.gz"}}}}
        },
        "11": {
            "11.0.19.15": {
                "linux": {"x64": {
                    "Extended": {"sha256": "e11", "download_url": "https://x/ext-11.0.19.tar.gz"},
                    "Standard": {"sha256": "s11", "download_url": "https://x/std-11.0.19.tar.gz"}
                }},
                "windows": {"x64": {"Standard": {"download_url": "https://x/std-11.0.19.zip"}}}
            }
        }
    }"#;

    fn dragonwell(version: &str) -> Dragonwell {
        Dragonwell::new(InstallerOptions::new(
            version.parse().unwrap(),
            Some("x64"),
            "jdk",
            false,
        ))
    }

    #[test]
    fn test_trim_version() {
        assert_eq!("11.0.19", trim_version("11.0.19.15"));
        assert_eq!("8.15.16", trim_version("8.15.16"));
    }

    #[test]
    fn test_find_package_prefers_edition() {
        let http = FakeHttpClient::new().with_json(VERSIONS_URL, VERSIONS);
        let toolcache = FakeToolcache::new();
        let linux = context(&http, &toolcache, Os::Linux);

        let release = dragonwell("17")
            .find_package_for_download(&linux, &"17".parse().unwrap())
            .unwrap();
        assert_eq!(
            JavaRelease::new("17.0.7", "https://x/std-17.0.7.tar.gz")
                .with_checksum(Some("s17".to_string())),
            release
        );

        let release = dragonwell("11")
            .find_package_for_download(&linux, &"11".parse().unwrap())
            .unwrap();
        assert_eq!("https://x/ext-11.0.19.tar.gz", release.url);

        let windows = context(&http, &toolcache, Os::Windows);
        let release = dragonwell("11.0.19")
            .find_package_for_download(&windows, &"11.0.19".parse().unwrap())
            .unwrap();
        assert_eq!(
            JavaRelease::new("11.0.19", "https://x/std-11.0.19.zip"),
            release
        );
    }

    #[test]
    fn test_rejections() {
        let http = FakeHttpClient::new();
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);
        let err = dragonwell("16")
            .find_package_for_download(&ctx, &"16".parse().unwrap())
            .unwrap_err();
        assert_eq!(
            vec![&UserMessage::new("Support dragonwell versions: 8, 11, 17, 21")],
            user_messages(&err)
        );
        let err = dragonwell("17-ea")
            .find_package_for_download(&ctx, &"17".parse().unwrap())
            .unwrap_err();
        assert_eq!(
            vec![&UserMessage::new("Early access versions are not supported")],
            user_messages(&err)
        );
        assert!(http.requested_urls().is_empty());
    }
}
