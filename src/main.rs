use crate::command::install::Install;
use crate::command::list_cached::ListCached;
use crate::command::list_distributions::ListDistributions;
use crate::command::list_versions::ListVersions;
use crate::command::set_distribution::SetDistribution;
use crate::command::{Context, SetupCommand};
use crate::config::SetupConfig;
use crate::error::{user_messages, ESResult, SetupError};
use clap::{ArgAction, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use error_stack::Report;
use owo_colors::{OwoColorize, Stream};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod archive;
mod checksum_verifier;
mod command;
mod config;
mod distributions;
mod environment;
mod error;
mod http_client;
mod installer;
mod platform;
mod progress;
mod string;
mod toolcache;
mod tui;
mod version;
mod version_file;

/// Install JDK distributions into a CI toolcache.
#[derive(Debug, Parser)]
#[clap(name = "setup-jdk", version)]
struct SetupJdk {
    /// Increase log verbosity. Repeat for more.
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
#[enum_dispatch(SetupCommand)]
enum Command {
    Install(Install),
    ListVersions(ListVersions),
    ListDistributions(ListDistributions),
    ListCached(ListCached),
    SetDistribution(SetDistribution),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("setup_jdk={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let args = SetupJdk::parse();
    init_logging(args.verbose);

    let result = SetupConfig::load()
        .map_err(|err| err.change_context(SetupError::Unexpected))
        .and_then(|config| args.command.run(Context { config }));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &Report<SetupError>) {
    match err.current_context() {
        SetupError::UserError => {
            let messages = user_messages(err);
            if messages.is_empty() {
                eprintln!("{:?}", err);
            }
            for message in messages {
                eprintln!(
                    "{}",
                    message
                        .if_supports_color(Stream::Stderr, |s| s.red())
                );
            }
        }
        SetupError::Unexpected => {
            eprintln!("{:?}", err);
        }
    }
}
