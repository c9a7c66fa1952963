use crate::command::{distribution_failure, Context, SetupCommand};
use crate::distributions::{Distribution, JavaDistribution};
use crate::environment::RunnerFiles;
use crate::error::{ESResult, SetupError, UserMessage};
use crate::http_client::UreqHttpClient;
use crate::installer::{InstallContext, InstallerOptions};
use crate::platform::Platform;
use crate::toolcache::DirectoryToolcache;
use crate::tui::jdk_color;
use crate::version::VersionRange;
use crate::version_file::read_version_file;
use clap::{ArgAction, Args};
use error_stack::{Report, ResultExt};
use owo_colors::{OwoColorize, Stream};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Install one or more JDKs and make the last one the default.
///
/// Every option can also come from the matching `INPUT_*` variable a runner sets for an action
/// input.
#[derive(Debug, Args)]
pub struct Install {
    /// The Java version(s) to install, e.g. `17`, `11.0.2`, `21-ea`. Repeat or separate with
    /// newlines to install several.
    #[clap(long = "java-version", env = "INPUT_JAVA-VERSION", value_delimiter = '\n')]
    java_version: Vec<String>,
    /// Read the version from a `.java-version`, `.tool-versions` or `.sdkmanrc` file.
    #[clap(long, env = "INPUT_JAVA-VERSION-FILE")]
    java_version_file: Option<PathBuf>,
    /// The distribution to install. Defaults to the configured distribution.
    #[clap(short, long, env = "INPUT_DISTRIBUTION")]
    distribution: Option<String>,
    /// The architecture of the package. Defaults to the host architecture.
    #[clap(long, env = "INPUT_ARCHITECTURE")]
    architecture: Option<String>,
    /// `jdk`, `jre`, `jdk+fx` or `jre+fx`.
    #[clap(long, env = "INPUT_JAVA-PACKAGE", default_value = "jdk")]
    java_package: String,
    /// Ask the distribution for the newest match even if the toolcache has one.
    #[clap(long, env = "INPUT_CHECK-LATEST", action = ArgAction::Set, default_value = "false", default_missing_value = "true", num_args = 0..=1)]
    check_latest: bool,
    /// Archive to install with the `jdkfile` distribution.
    #[clap(long, env = "INPUT_JDKFILE")]
    jdk_file: Option<PathBuf>,
    /// Token for GitHub API requests.
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Install {
    /// The versions to install and the distribution to take them from.
    fn requests(&self, context: &Context) -> ESResult<(Vec<String>, String), SetupError> {
        let mut distribution = self
            .distribution
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| context.config.default_distribution.clone());
        let versions = self
            .java_version
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        if !versions.is_empty() {
            if self.java_version_file.is_some() {
                warn!("Both java-version and java-version-file are given, only java-version will be used");
            }
        } else if let Some(file) = &self.java_version_file {
            let request = read_version_file(file, distribution.as_deref().unwrap_or_default())
                .change_context(SetupError::UserError)?;
            eprintln!("Resolved Java version {} from {}", request.version, file.display());
            if let Some(from_file) = request.distribution {
                distribution = Some(from_file);
            }
            return match distribution {
                Some(distribution) => Ok((vec![request.version], distribution)),
                None => Err(missing_distribution()),
            };
        } else {
            return Err(Report::new(SetupError::UserError).attach(UserMessage::new(
                "java-version or java-version-file input expected",
            )));
        }

        match distribution {
            Some(distribution) => Ok((versions, distribution)),
            None => Err(missing_distribution()),
        }
    }
}

fn missing_distribution() -> Report<SetupError> {
    Report::new(SetupError::UserError).attach(UserMessage::new(
        "Input required and not supplied: distribution",
    ))
}

impl SetupCommand for Install {
    fn run(self, context: Context) -> ESResult<(), SetupError> {
        let (versions, distribution_name) = self.requests(&context)?;

        let http = UreqHttpClient::new();
        let toolcache = DirectoryToolcache::locate(context.config.toolcache_dir.as_deref());
        let ctx = InstallContext {
            http: &http,
            toolcache: &toolcache,
            platform: Platform::detect(),
            github_token: self
                .token
                .clone()
                .or_else(|| context.config.github_token.clone())
                .filter(|t| !t.is_empty()),
        };
        let runner = RunnerFiles::from_env();
        debug!("Runner command files: {:?}", runner);

        for version in versions {
            let range = version
                .parse::<VersionRange>()
                .change_context(SetupError::UserError)?;
            let options = InstallerOptions::new(
                range,
                self.architecture.as_deref(),
                &self.java_package,
                self.check_latest,
            );
            eprintln!(
                "Installing Java {} ({})",
                version.if_supports_color(Stream::Stderr, |s| s.color(jdk_color())),
                distribution_name
            );
            let distribution =
                Distribution::from_name(&distribution_name, options, self.jdk_file.clone())
                    .map_err(distribution_failure)?;
            let outcome = distribution.setup_java(&ctx).map_err(distribution_failure)?;

            if runner.is_runner() {
                runner
                    .apply(&outcome.environment)
                    .change_context(SetupError::Unexpected)?;
            } else {
                print!("{}", outcome.environment.shell_exports());
            }
            eprintln!(
                "Java {} installed at {}",
                outcome
                    .result
                    .version
                    .if_supports_color(Stream::Stderr, |s| s.color(jdk_color())),
                outcome.result.path.display()
            );
        }
        Ok(())
    }
}
