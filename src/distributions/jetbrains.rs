use crate::distributions::{
    user_error, version_not_found, DistributionError, JavaDistribution, JavaRelease,
};
use crate::error::ESResult;
use crate::http_client::github_headers;
use crate::installer::{InstallContext, InstallerOptions};
use crate::platform::{Os, Platform};
use crate::string::SplittingExt;
use crate::version::{compare_build, VersionRange};
use error_stack::{Report, ResultExt};
use semver::Version;
use serde::Deserialize;
use tracing::debug;

const RELEASES_URL: &str =
    "https://api.github.com/repos/JetBrains/JetBrainsRuntime/releases?per_page=100&page=1";
const DOWNLOAD_BASE: &str = "https://cache-redirector.jetbrains.com/intellij-jbr";

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
}

/// A release tag split into its JDK version and JBR build.
#[derive(Debug, PartialEq, Eq)]
struct JbrTag {
    semver: String,
    build: String,
}

impl JbrTag {
    /// Tags come in three shapes: `jbr-release-21.0.3b465.3`, `jb11_0_11-b87.7` and
    /// `jbr11_0_15b2043.56`.
    fn parse(tag: &str) -> Option<Self> {
        let version = match tag.matches('-').count() {
            2 => tag.rsplit_optional('-').1?.to_string(),
            1 => tag.get(2..)?.replace('-', "").replace('_', "."),
            0 => tag.get(3..)?.to_string(),
            _ => return None,
        };
        let (semver, build) = version.split_optional('b');
        let build = build.filter(|b| !b.is_empty())?;
        Some(Self {
            semver: semver.replace('_', "."),
            build: build.to_string(),
        })
    }

    fn version(&self) -> String {
        format!("{}+{}", self.semver, self.build)
    }
}

pub struct JetBrains {
    options: InstallerOptions,
}

impl JetBrains {
    pub fn new(options: InstallerOptions) -> Self {
        Self { options }
    }

    /// Binary prefix for the requested package type.
    fn binary_type(&self) -> Result<&'static str, Report<DistributionError>> {
        match self.options.package_type.as_str() {
            "jdk" => Ok("jbrsdk"),
            "jre" => Ok("jbr"),
            "jdk+jcef" => Ok("jbrsdk_jcef"),
            "jre+jcef" => Ok("jbr_jcef"),
            "jdk+ft" => Ok("jbrsdk_ft"),
            "jre+ft" => Ok("jbr_ft"),
            other => Err(user_error(
                DistributionError::Configuration,
                format!("Package type {} not supported", other),
            )),
        }
    }

    /// Every release tag, following the `Link` header across pages.
    fn release_tags(&self, ctx: &InstallContext) -> ESResult<Vec<String>, DistributionError> {
        let headers = github_headers(ctx.github_token.as_deref());
        let mut tags = Vec::new();
        let mut next = Some(RELEASES_URL.to_string());
        debug!("Gathering available versions from '{}'", RELEASES_URL);
        while let Some(url) = next {
            let response = ctx
                .http
                .get(&url, &headers)
                .and_then(|r| r.error_for_status())
                .change_context(DistributionError::Transport)
                .attach_with(|| format!("URL: {}", url))?;
            let page: Vec<GitHubRelease> = response
                .json()
                .change_context(DistributionError::Transport)
                .attach_with(|| format!("URL: {}", url))?;
            if page.is_empty() {
                break;
            }
            tags.extend(page.into_iter().map(|r| r.tag_name));
            next = response.next_link();
        }
        debug!("Available versions: [{}]", tags.len());
        Ok(tags)
    }
}

fn platform_name(platform: &Platform) -> &'static str {
    match platform.os {
        Os::MacOs => "osx",
        _ => platform.common_name(),
    }
}

impl JavaDistribution for JetBrains {
    fn name(&self) -> &str {
        "JetBrains"
    }

    fn options(&self) -> &InstallerOptions {
        &self.options
    }

    fn find_package_for_download(
        &self,
        ctx: &InstallContext,
        range: &VersionRange,
    ) -> ESResult<JavaRelease, DistributionError> {
        let binary = self.binary_type()?;
        let tags = self.release_tags(ctx)?;
        let platform = platform_name(&ctx.platform);
        let arch = self.options.distribution_architecture();

        let mut satisfied = tags
            .iter()
            .filter_map(|tag| {
                let parsed = JbrTag::parse(tag);
                if parsed.is_none() {
                    debug!("Unrecognized tag_name: {}", tag);
                }
                parsed
            })
            .filter_map(|tag| {
                let version = tag.version();
                let parsed = Version::parse(&version).ok()?;
                range.is_satisfied_by(&version).then(|| {
                    let url = format!(
                        "{}/{}-{}-{}-{}-b{}.tar.gz",
                        DOWNLOAD_BASE, binary, tag.semver, platform, arch, tag.build
                    );
                    (parsed, JavaRelease::new(version, url))
                })
            })
            .collect::<Vec<_>>();
        satisfied.sort_by(|a, b| compare_build(&b.0, &a.0));
        satisfied
            .into_iter()
            .next()
            .map(|(_, release)| release)
            .ok_or_else(|| version_not_found(range, &tags))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{user_messages, UserMessage};
    use crate::http_client::fake::FakeHttpClient;
    use crate::installer::test::context;
    use crate::toolcache::test::FakeToolcache;

    const PAGE_2: &str =
        "https://api.github.com/repositories/1/releases?per_page=100&page=2";

    fn jetbrains(version: &str, arch: &str, package_type: &str) -> JetBrains {
        JetBrains::new(InstallerOptions::new(
            version.parse().unwrap(),
            Some(arch),
            package_type,
            false,
        ))
    }

    fn http() -> FakeHttpClient {
        FakeHttpClient::new()
            .with_link(
                RELEASES_URL,
                r#"[{"tag_name":"jbr-release-21.0.3b465.3"},{"tag_name":"jbr-release-17.0.11b1207.24"}]"#,
                &format!("<{}>; rel=\"next\"", PAGE_2),
            )
            .with_json(
                PAGE_2,
                r#"[{"tag_name":"jb11_0_11-b87.7"},{"tag_name":"jbr11_0_15b2043.56"},{"tag_name":"some-odd-release-tag"}]"#,
            )
    }

    #[test]
    fn test_parse_tag() {
        let cases = [
            ("jbr-release-21.0.3b465.3", Some(("21.0.3", "465.3"))),
            ("jb11_0_11-b87.7", Some(("11.0.11", "87.7"))),
            ("jbr11_0_15b2043.56", Some(("11.0.15", "2043.56"))),
            ("a-b-c-d", None),
            ("jbr-release-21.0.3", None),
        ];
        for (tag, expected) in cases {
            assert_eq!(
                expected.map(|(semver, build)| JbrTag {
                    semver: semver.to_string(),
                    build: build.to_string()
                }),
                JbrTag::parse(tag),
                "tag {:?}",
                tag
            );
        }
    }

    #[test]
    fn test_find_package_for_download() {
        let http = http();
        let toolcache = FakeToolcache::new();

        let linux = context(&http, &toolcache, Os::Linux);
        let release = jetbrains("11", "x64", "jdk")
            .find_package_for_download(&linux, &"11".parse().unwrap())
            .unwrap();
        assert_eq!(
            JavaRelease::new(
                "11.0.15+2043.56",
                "https://cache-redirector.jetbrains.com/intellij-jbr/jbrsdk-11.0.15-linux-x64-b2043.56.tar.gz"
            ),
            release
        );
        assert_eq!(
            vec![RELEASES_URL.to_string(), PAGE_2.to_string()],
            http.requested_urls()
        );

        let mac = context(&http, &toolcache, Os::MacOs);
        let release = jetbrains("21", "arm64", "jre+jcef")
            .find_package_for_download(&mac, &"21".parse().unwrap())
            .unwrap();
        assert_eq!(
            "https://cache-redirector.jetbrains.com/intellij-jbr/jbr_jcef-21.0.3-osx-aarch64-b465.3.tar.gz",
            release.url
        );
    }

    #[test]
    fn test_not_found_lists_tags() {
        let http = http();
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);
        let err = jetbrains("8", "x64", "jdk")
            .find_package_for_download(&ctx, &"8".parse().unwrap())
            .unwrap_err();
        assert_eq!(
            vec![&UserMessage::new(
                "Could not find satisfied version for SemVer '8'. \nAvailable versions: \
                 jbr-release-21.0.3b465.3, jbr-release-17.0.11b1207.24, jb11_0_11-b87.7, \
                 jbr11_0_15b2043.56, some-odd-release-tag"
            )],
            user_messages(&err)
        );
    }

    #[test]
    fn test_unsupported_package_type() {
        let http = FakeHttpClient::new();
        let toolcache = FakeToolcache::new();
        let ctx = context(&http, &toolcache, Os::Linux);
        let err = jetbrains("17", "x64", "jdk+fx")
            .find_package_for_download(&ctx, &"17".parse().unwrap())
            .unwrap_err();
        assert_eq!(
            vec![&UserMessage::new("Package type jdk+fx not supported")],
            user_messages(&err)
        );
    }
}
