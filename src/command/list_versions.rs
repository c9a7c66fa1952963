use crate::command::{distribution_failure, Context, SetupCommand};
use crate::distributions::{Distribution, JavaDistribution, JavaRelease};
use crate::error::{ESResult, SetupError, UserMessage};
use crate::http_client::UreqHttpClient;
use crate::installer::{find_in_toolcache, InstallContext, InstallResult, InstallerOptions};
use crate::platform::Platform;
use crate::toolcache::DirectoryToolcache;
use crate::tui::jdk_color;
use crate::version::VersionRange;
use clap::Args;
use error_stack::{Report, ResultExt};
use owo_colors::{OwoColorize, Stream};

/// Show which release a version range resolves to, without installing it.
#[derive(Debug, Args)]
pub struct ListVersions {
    /// The distribution to query. Defaults to the configured distribution.
    #[clap()]
    distribution: Option<String>,
    /// The version range to resolve, e.g. `17`, `11.0.x`, `21-ea`.
    #[clap(long = "java-version", default_value = "x")]
    java_version: String,
    /// The architecture of the package. Defaults to the host architecture.
    #[clap(long)]
    architecture: Option<String>,
    /// `jdk`, `jre`, `jdk+fx` or `jre+fx`.
    #[clap(long, default_value = "jdk")]
    java_package: String,
}

impl ListVersions {
    /// The newest cached install and the newest remote release matching the request.
    fn resolve(
        &self,
        context: &Context,
        ctx: &InstallContext,
    ) -> ESResult<(Option<InstallResult>, JavaRelease), SetupError> {
        let Some(name) = self
            .distribution
            .as_deref()
            .or(context.config.default_distribution.as_deref())
        else {
            return Err(Report::new(SetupError::UserError).attach(UserMessage::new(
                "No distribution given and no default distribution configured",
            )));
        };
        let range = self
            .java_version
            .parse::<VersionRange>()
            .change_context(SetupError::UserError)?;
        let options = InstallerOptions::new(
            range,
            self.architecture.as_deref(),
            &self.java_package,
            false,
        );
        let distribution =
            Distribution::from_name(name, options, None).map_err(distribution_failure)?;
        let cached = find_in_toolcache(ctx.toolcache, distribution.name(), distribution.options())
            .change_context(SetupError::Unexpected)?;
        let release = distribution
            .find_package_for_download(ctx, &distribution.options().version)
            .map_err(distribution_failure)?;
        Ok((cached, release))
    }
}

impl SetupCommand for ListVersions {
    fn run(self, context: Context) -> ESResult<(), SetupError> {
        let http = UreqHttpClient::new();
        let toolcache = DirectoryToolcache::locate(context.config.toolcache_dir.as_deref());
        let ctx = InstallContext {
            http: &http,
            toolcache: &toolcache,
            platform: Platform::detect(),
            github_token: std::env::var("GITHUB_TOKEN")
                .ok()
                .or_else(|| context.config.github_token.clone())
                .filter(|t| !t.is_empty()),
        };
        let (cached, release) = self.resolve(&context, &ctx)?;

        match cached {
            Some(cached) => println!(
                "Cached: {} ({})",
                cached
                    .version
                    .if_supports_color(Stream::Stdout, |s| s.color(jdk_color())),
                cached.path.display()
            ),
            None => println!("Cached: <none>"),
        }
        println!(
            "Latest: {} ({})",
            release
                .version
                .if_supports_color(Stream::Stdout, |s| s.color(jdk_color())),
            release.url
        );
        Ok(())
    }
}
