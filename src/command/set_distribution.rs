use crate::command::{Context, SetupCommand};
use crate::distributions::Distribution;
use crate::error::{ESResult, SetupError, UserMessage};
use clap::Args;
use error_stack::{Report, ResultExt};
use itertools::Itertools;

/// Set the distribution used when `install` is not given one.
#[derive(Debug, Args)]
pub struct SetDistribution {
    /// The distribution to use.
    #[clap(name = "distribution")]
    distribution: String,
}

/// Check `distribution` against the known keys.
fn validate(distribution: &str) -> ESResult<(), SetupError> {
    let available = Distribution::available();
    if available.iter().any(|(key, _)| *key == distribution) {
        return Ok(());
    }
    Err(Report::new(SetupError::UserError)
        .attach(UserMessage::new(format!(
            "Distribution '{}' not found",
            distribution
        )))
        .attach(UserMessage::new(format!(
            "Available distributions: {}",
            available.iter().map(|(key, _)| key).join(", ")
        ))))
}

impl SetupCommand for SetDistribution {
    fn run(self, mut context: Context) -> ESResult<(), SetupError> {
        if context.config.default_distribution.as_deref() == Some(self.distribution.as_str()) {
            eprintln!("Distribution already set to '{}'", self.distribution);
            return Ok(());
        }
        validate(&self.distribution)?;
        let distribution = self.distribution.clone();
        context
            .config
            .edit_config(|doc| {
                doc["default_distribution"] = toml_edit::value(distribution);
            })
            .change_context(SetupError::Unexpected)
            .attach("Failed to save config")?;
        eprintln!("Distribution set to '{}'", self.distribution);
        Ok(())
    }
}
