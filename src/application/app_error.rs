use thiserror::Error;

use crate::application::ports::billing_provider::ProviderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("A card token is required to start a subscription")]
    MissingCardToken,

    #[error("{0}")]
    CardDeclined(String),

    #[error("Billing provider rejected the request: {0}")]
    ProviderRequest(String),

    #[error("Billing provider error: {0}")]
    ProviderService(String),

    #[error("Subscription has no remote billing account")]
    MissingRemoteAccount,

    #[error("Billing provider is not configured")]
    ProviderNotConfigured,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingCardToken => ErrorCode::MissingCardToken,
            AppError::CardDeclined(_) => ErrorCode::CardDeclined,
            AppError::ProviderRequest(_) => ErrorCode::ProviderRequestError,
            AppError::ProviderService(_) => ErrorCode::ProviderServiceError,
            AppError::MissingRemoteAccount => ErrorCode::MissingRemoteAccount,
            AppError::ProviderNotConfigured => ErrorCode::ProviderNotConfigured,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Payment failures the end user can fix (e.g. by entering another card).
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, AppError::CardDeclined(_))
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Declined(msg) => AppError::CardDeclined(msg),
            ProviderError::InvalidRequest(msg) => AppError::ProviderRequest(msg),
            ProviderError::Service(msg) => AppError::ProviderService(msg),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    MissingCardToken,
    CardDeclined,
    ProviderRequestError,
    ProviderServiceError,
    MissingRemoteAccount,
    ProviderNotConfigured,
    InvalidInput,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingCardToken => "MISSING_CARD_TOKEN",
            ErrorCode::CardDeclined => "CARD_DECLINED",
            ErrorCode::ProviderRequestError => "PROVIDER_REQUEST_ERROR",
            ErrorCode::ProviderServiceError => "PROVIDER_SERVICE_ERROR",
            ErrorCode::MissingRemoteAccount => "MISSING_REMOTE_ACCOUNT",
            ErrorCode::ProviderNotConfigured => "PROVIDER_NOT_CONFIGURED",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
