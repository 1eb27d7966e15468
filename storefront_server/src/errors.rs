use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use storefront_engine::{AccountApiError, CatalogError, StorefrontError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    OutOfStock(String),
    #[error("{0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::OutOfStock(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingInitData => StatusCode::UNAUTHORIZED,
                AuthError::InvalidInitData(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedInitData(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidWebhookSecret => StatusCode::FORBIDDEN,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No authorization data")]
    MissingInitData,
    #[error("Invalid authorization data. {0}")]
    InvalidInitData(String),
    #[error("Authorization data is not in the correct format. {0}")]
    PoorlyFormattedInitData(String),
    #[error("Webhook secret token is missing or incorrect")]
    InvalidWebhookSecret,
}

impl From<StorefrontError> for ServerError {
    fn from(e: StorefrontError) -> Self {
        match e {
            StorefrontError::Validation(_) => Self::ValidationError(e.to_string()),
            StorefrontError::OutOfStock { .. } => Self::OutOfStock(e.to_string()),
            StorefrontError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            StorefrontError::Unauthorized(_) => Self::InsufficientPermissions(e.to_string()),
            StorefrontError::TransitionNotAllowed { .. } => Self::Conflict(e.to_string()),
            StorefrontError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            AccountApiError::Unauthorized(_) => Self::InsufficientPermissions(e.to_string()),
            AccountApiError::QueryError(_) => Self::InvalidRequestBody(e.to_string()),
            AccountApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::Validation(_) => Self::ValidationError(e.to_string()),
            CatalogError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
