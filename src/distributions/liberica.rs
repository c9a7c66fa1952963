use crate::distributions::{
    fetch_json, resolve_best_release, split_package_type, user_error, DistributionError,
    JavaDistribution, JavaRelease,
};
use crate::error::ESResult;
use crate::installer::{InstallContext, InstallerOptions};
use crate::platform::{Os, Platform};
use crate::version::VersionRange;
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use tracing::debug;
use url::Url;

const RELEASES_URL: &str = "https://api.bell-sw.com/v1/liberica/releases";
const SUPPORTED_PLATFORMS: &str = "'linux', 'linux-musl', 'macos', 'solaris', 'windows'";
const SUPPORTED_ARCHITECTURES: &str = "'x86', 'x64', 'armv7', 'aarch64', 'ppc64le'";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibericaRelease {
    download_url: String,
    feature_version: u64,
    interim_version: u64,
    update_version: u64,
    build_version: u64,
}

impl LibericaRelease {
    fn semver(&self) -> String {
        let main = format!(
            "{}.{}.{}",
            self.feature_version, self.interim_version, self.update_version
        );
        if self.build_version != 0 {
            format!("{}+{}", main, self.build_version)
        } else {
            main
        }
    }
}

pub struct Liberica {
    options: InstallerOptions,
}

impl Liberica {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    fn bundle_type(&self) -> String {
        let (bundle_type, feature) = split_package_type(&self.options.package_type);
        if feature.is_some_and(|f| f.contains("fx")) {
            format!("{}-full", bundle_type)
        } else {
            bundle_type.to_string()
        }
    }

    /// `(bitness, arch)` for the releases query.
    fn architecture_options(&self) -> Result<(&'static str, &'static str), Report<DistributionError>> {
        let arch = match self.options.distribution_architecture().as_str() {
            "arm" => "armv7".to_string(),
            other => other.to_string(),
        };
        match arch.as_str() {
            "x86" => Ok(("32", "x86")),
            "x64" => Ok(("64", "x86")),
            "armv7" => Ok(("32", "arm")),
            "aarch64" => Ok(("64", "arm")),
            "ppc64le" => Ok(("64", "ppc")),
            _ => Err(user_error(
                DistributionError::Configuration,
                format!(
                    "Architecture '{}' is not supported. Supported architectures: {}",
                    self.options.architecture, SUPPORTED_ARCHITECTURES
                ),
            )),
        }
    }

    fn releases_url(&self, platform: &Platform) -> ESResult<Url, DistributionError> {
        let os = match platform.os {
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::Linux => "linux",
            Os::Solaris => "solaris",
            Os::Other(name) => {
                return Err(user_error(
                    DistributionError::Configuration,
                    format!(
                        "Platform '{}' is not supported. Supported platforms: {}",
                        name, SUPPORTED_PLATFORMS
                    ),
                ))
            }
        };
        let (bitness, arch) = self.architecture_options()?;
        let bundle_type = self.bundle_type();
        Url::parse_with_params(
            RELEASES_URL,
            &[
                ("os", os),
                ("bundle-type", bundle_type.as_str()),
                ("bitness", bitness),
                ("arch", arch),
                ("build-type", if self.options.stable() { "all" } else { "ea" }),
                ("installation-type", "archive"),
                (
                    "fields",
                    "downloadUrl,version,featureVersion,interimVersion,updateVersion,buildVersion",
                ),
            ],
        )
        .change_context(DistributionError::Transport)
    }
}

impl JavaDistribution for Liberica {
    fn name(&self) -> &str {
        "Liberica"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        let url = self.releases_url(&ctx.platform)?;
        debug!("Gathering available versions from '{}'", url);
        let releases: Vec<LibericaRelease> = fetch_json(ctx.http, url.as_str(), &[])?;
        resolve_best_release(
            range,
            releases
                .into_iter()
                .map(|r| JavaRelease::new(r.semver(), r.download_url.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{user_messages, UserMessage};
    use crate::http_client::fake::FakeHttpClient;
    use crate::installer::test::context;
    use crate::toolcache::test::FakeToolcache;

    fn liberica(version: &str, arch: &str, package_type: &str) -> Liberica {
        Liberica::new(InstallerOptions::new(
            version.parse().unwrap(),
            Some(arch),
            package_type,
            false,
        ))
    }

    #[test]
    fn test_releases_url() {
        let url = liberica("11", "x64", "jdk+fx")
            .releases_url(&Platform::new(Os::MacOs))
            .unwrap();
        assert_eq!(
            "https://api.bell-sw.com/v1/liberica/releases?os=macos&bundle-type=jdk-full&bitness=64\
             &arch=x86&build-type=all&installation-type=archive\
             &fields=downloadUrl%2Cversion%2CfeatureVersion%2CinterimVersion%2CupdateVersion%2CbuildVersion",
            url.as_str()
        );
        let ea = liberica("17-ea", "arm", "jre")
            .releases_url(&Platform::new(Os::Linux))
            .unwrap();
        assert!(ea
            .as_str()
            .contains("os=linux&bundle-type=jre&bitness=32&arch=arm&build-type=ea"));
    }

    #[test]
    fn test_architecture_options() {
        let cases = [
            ("x86", ("32", "x86")),
            ("x64", ("64", "x86")),
            ("amd64", ("64", "x86")),
            ("armv7", ("32", "arm")),
            ("arm", ("32", "arm")),
            ("aarch64", ("64", "arm")),
            ("ppc64le", ("64", "ppc")),
        ];
        for (arch, expected) in cases {
            assert_eq!(
                expected,
                liberica("11", arch, "jdk").architecture_options().unwrap(),
                "arch {}",
                arch
            );
        }
        let err = liberica("11", "s390x", "jdk")
            .architecture_options()
            .unwrap_err();
        assert_eq!(
            vec![&UserMessage::new(
                "Architecture 's390x' is not supported. Supported architectures: \
                 'x86', 'x64', 'armv7', 'aarch64', 'ppc64le'"
            )],
            user_messages(&err)
        );
    }

    #[test]
    fn test_unsupported_platform() {
        let err = liberica("11", "x64", "jdk")
            .releases_url(&Platform::new(Os::Other("aix")))
            .unwrap_err();
        assert_eq!(
            vec![&UserMessage::new(
                "Platform 'aix' is not supported. Supported platforms: \
                 'linux', 'linux-musl', 'macos', 'solaris', 'windows'"
            )],
            user_messages(&err)
        );
    }

    #[test]
    fn test_find_package_for_download() {
        let liberica = liberica("11.0", "x64", "jdk");
        let url = liberica.releases_url(&Platform::new(Os::Linux)).unwrap();
        let http = FakeHttpClient::new().with_json(
            url.as_str(),
            r#"[
                {"downloadUrl":"https://x/11.0.9.tar.gz","version":"11.0.9+12","featureVersion":11,"interimVersion":0,"updateVersion":9,"buildVersion":12},
                {"downloadUrl":"https://x/11.0.10.tar.gz","version":"11.0.10+9","featureVersion":11,"interimVersion":0,"updateVersion":10,"buildVersion":9},
                {"downloadUrl":"https://x/16.tar.gz","version":"16","featureVersion":16,"interimVersion":0,"updateVersion":0,"buildVersion":0}
            ]"#,
        );
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);
        let release = liberica
            .find_package_for_download(&ctx, &liberica.options.version)
            .unwrap();
        assert_eq!("11.0.10+9", release.version);
        assert_eq!("https://x/11.0.10.tar.gz", release.url);

        let sixteen: VersionRange = "16".parse().unwrap();
        assert_eq!(
            "16.0.0",
            liberica.find_package_for_download(&ctx, &sixteen).unwrap().version
        );
    }
}
