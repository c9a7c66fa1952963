use crate::distributions::{
    resolve_best_release, split_package_type, DistributionError, JavaDistribution, JavaRelease,
};
use crate::error::ESResult;
use crate::installer::{download_archive_extension, InstallContext, InstallerOptions};
use crate::version::{compare_build, VersionRange};
use semver::Version;
use serde::Deserialize;
use std::cmp::Ordering;
use tracing::debug;

const BUNDLES_URL: &str = "https://api.azul.com/zulu/download/community/v1.0/bundles/";

#[derive(Debug, Deserialize)]
struct Bundle {
    url: String,
    jdk_version: Vec<u64>,
    zulu_version: Vec<u64>,
}

/// Azul publishes versions as number arrays. Anything past the fourth number is dropped.
fn array_to_semver(parts: &[u64]) -> String {
    let main = parts
        .iter()
        .take(3)
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    match parts.get(3) {
        Some(build) => format!("{}+{}", main, build),
        None => main,
    }
}

/// `(arch, hw_bitness)` as the bundle API spells them.
fn architecture_options(arch: &str) -> (String, &'static str) {
    match arch {
        "x64" => ("x86".to_string(), "64"),
        "x86" => ("x86".to_string(), "32"),
        "aarch64" | "arm64" => ("arm".to_string(), "64"),
        other => (other.to_string(), ""),
    }
}

pub struct Zulu {
    options: InstallerOptions,
}

impl Zulu {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    fn bundles_url(&self, ctx: &InstallContext) -> String {
        let (arch, bitness) = architecture_options(&self.options.distribution_architecture());
        let (bundle_type, features) = split_package_type(&self.options.package_type);
        let javafx = features.is_some_and(|f| f.contains("fx"));
        let mut url = format!(
            "{}?os={}&ext={}&bundle_type={}&javafx={}&arch={}&hw_bitness={}&release_status={}",
            BUNDLES_URL,
            ctx.platform.common_name(),
            download_archive_extension(&ctx.platform),
            bundle_type,
            javafx,
            arch,
            bitness,
            if self.options.stable() { "ga" } else { "ea" }
        );
        if let Some(features) = features.filter(|f| !f.is_empty()) {
            url.push_str("&features=");
            url.push_str(features);
        }
        url
    }
}

impl JavaDistribution for Zulu {
    fn name(&self) -> &str {
        "Zulu"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        let url = self.bundles_url(ctx);
        debug!("Gathering available versions from '{}'", url);
        let bundles: Vec<Bundle> = super::fetch_json(ctx.http, &url, &[])?;

        let mut candidates = bundles
            .into_iter()
            .map(|bundle| {
                (
                    Version::parse(&array_to_semver(&bundle.zulu_version)).ok(),
                    JavaRelease::new(array_to_semver(&bundle.jdk_version), bundle.url),
                )
            })
            .collect::<Vec<_>>();
        // Several bundles can carry the same JDK version; the newest Zulu build wins.
        // Bundles without a parseable Zulu version go last.
        candidates.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => compare_build(b, a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        resolve_best_release(
            range,
            candidates.into_iter().map(|(_, release)| release).collect(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::http_client::fake::FakeHttpClient;
    use crate::installer::test::context;
    use crate::platform::Os;
    use crate::toolcache::test::FakeToolcache;

    fn zulu(version: &str, arch: &str, package_type: &str) -> Zulu {
        Zulu::new(InstallerOptions::new(
            version.parse().unwrap(),
            Some(arch),
            package_type,
            false,
        ))
    }

    #[test]
    fn test_array_to_semver() {
        assert_eq!("12", array_to_semver(&[12]));
        assert_eq!("12.0.2", array_to_semver(&[12, 0, 2]));
        assert_eq!("12.0.2+1", array_to_semver(&[12, 0, 2, 1]));
        assert_eq!("12.0.2+1", array_to_semver(&[12, 0, 2, 1, 3]));
    }

    #[test]
    fn test_bundles_url() {
        let http = FakeHttpClient::new();
        let toolcache = FakeToolcache::new();
        let cases = [
            (
                zulu("11", "x64", "jdk"),
                Os::MacOs,
                "?os=macos&ext=tar.gz&bundle_type=jdk&javafx=false&arch=x86&hw_bitness=64&release_status=ga",
            ),
            (
                zulu("11-ea", "x86", "jdk"),
                Os::Windows,
                "?os=windows&ext=zip&bundle_type=jdk&javafx=false&arch=x86&hw_bitness=32&release_status=ea",
            ),
            (
                zulu("8", "arm64", "jre+fx"),
                Os::Linux,
                "?os=linux&ext=tar.gz&bundle_type=jre&javafx=true&arch=arm&hw_bitness=64&release_status=ga&features=fx",
            ),
            (
                zulu("8", "arm", "jdk"),
                Os::Linux,
                "?os=linux&ext=tar.gz&bundle_type=jdk&javafx=false&arch=arm&hw_bitness=&release_status=ga",
            ),
        ];
        for (zulu, os, query) in cases {
            assert_eq!(
                format!("{}{}", BUNDLES_URL, query),
                zulu.bundles_url(&context(&http, &toolcache, os))
            );
        }
    }

    #[test]
    fn test_find_package_breaks_ties_on_zulu_version() {
        let zulu = zulu("11", "x64", "jdk");
        let http = FakeHttpClient::new();
        let toolcache = FakeToolcache::new();
        let url = zulu.bundles_url(&context(&http, &toolcache, Os::Linux));
        let http = http.with_json(
            &url,
            r#"[
                {"id":0,"name":"z","url":"https://x/unknown.tar.gz","jdk_version":[11,0,2,7],"zulu_version":[]},
                {"id":1,"name":"a","url":"https://x/old.tar.gz","jdk_version":[11,0,2,7],"zulu_version":[11,29,3]},
                {"id":2,"name":"b","url":"https://x/new.tar.gz","jdk_version":[11,0,2,7],"zulu_version":[11,29,11]},
                {"id":3,"name":"c","url":"https://x/8.tar.gz","jdk_version":[8,0,202,8],"zulu_version":[8,33,0]}
            ]"#,
        );
        let ctx = context(&http, &toolcache, Os::Linux);
        let release = zulu
            .find_package_for_download(&ctx, &zulu.options.version)
            .unwrap();
        assert_eq!("11.0.2+7", release.version);
        assert_eq!("https://x/new.tar.gz", release.url);
    }
}
