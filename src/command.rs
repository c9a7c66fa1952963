use crate::config::SetupConfig;
use crate::distributions::DistributionError;
use crate::error::{ESResult, SetupError};
use enum_dispatch::enum_dispatch;
use error_stack::Report;

pub(super) mod install;
pub(super) mod list_cached;
pub(super) mod list_distributions;
pub(super) mod list_versions;
pub(super) mod set_distribution;

#[enum_dispatch]
pub trait SetupCommand {
    fn run(self, context: Context) -> ESResult<(), SetupError>;
}

pub struct Context {
    pub config: SetupConfig,
}

/// Report a distribution failure as the caller's fault or ours, keeping the attached messages.
pub(crate) fn distribution_failure(err: Report<DistributionError>) -> Report<SetupError> {
    if err.current_context().is_user_error() {
        err.change_context(SetupError::UserError)
    } else {
        err.change_context(SetupError::Unexpected)
    }
}
