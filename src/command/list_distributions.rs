use crate::command::{Context, SetupCommand};
use crate::distributions::Distribution;
use crate::error::{ESResult, SetupError};
use crate::tui::jdk_color;
use clap::Args;
use owo_colors::{OwoColorize, Stream};

/// List all supported distributions.
#[derive(Debug, Args)]
pub struct ListDistributions {
    /// Show a description of each distribution.
    #[clap(long, action = clap::ArgAction::Set, default_value = "false", default_missing_value = "true", num_args = 0..=1)]
    describe: bool,
}

impl SetupCommand for ListDistributions {
    fn run(self, context: Context) -> ESResult<(), SetupError> {
        for (key, description) in Distribution::available() {
            let marker = if context.config.default_distribution.as_deref() == Some(*key) {
                " (default)"
            } else {
                ""
            };
            if self.describe {
                println!(
                    "- {}{}: {}",
                    key.if_supports_color(Stream::Stdout, |s| s.color(jdk_color())),
                    marker,
                    description
                );
            } else {
                println!(
                    "- {}{}",
                    key.if_supports_color(Stream::Stdout, |s| s.color(jdk_color())),
                    marker
                );
            }
        }
        if !self.describe {
            println!();
            println!("(Use --describe to show descriptions)");
        }
        Ok(())
    }
}
