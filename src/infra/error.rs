use thiserror::Error;

use crate::app_error::AppError;

/// Infrastructure errors that can occur during startup.
///
/// Display messages never include secret values.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Configuration error: environment variable {var} not set")]
    ConfigMissing { var: &'static str },

    #[error("Configuration error: environment variable {var} is invalid ({reason})")]
    ConfigInvalid { var: &'static str, reason: String },

    #[error("Billing provider initialization failed")]
    ProviderInit(#[source] AppError),
}

impl From<AppError> for InfraError {
    fn from(e: AppError) -> Self {
        InfraError::ProviderInit(e)
    }
}
