use aws_sdk_dynamodb::error::{BuildError, SdkError};
use lambda_http::{http::StatusCode, Error as LambdaError};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

/// Failures raised by the review store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dynamodb error: {0}")]
    Dynamo(String),
    #[error("malformed review record: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn category(&self) -> &'static str {
        match self {
            StoreError::Dynamo(_) => "dynamodb",
            StoreError::Malformed(_) => "record",
        }
    }
}

/// Request-terminal errors. Each one maps to a fixed status and body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingIdentifier(String),
    #[error("{message}")]
    InvalidQueryShape { message: String, schema: Value },
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl AppError {
    /// Short classification string used for logging.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::MissingIdentifier(_) => "missing_identifier",
            AppError::InvalidQueryShape { .. } => "invalid_query_shape",
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::InvalidPayload(_) => "invalid_payload",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingIdentifier(_) => StatusCode::NOT_FOUND,
            AppError::InvalidQueryShape { .. } | AppError::StoreUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// JSON body returned to the caller for this error.
    pub fn body(&self) -> Value {
        match self {
            AppError::MissingIdentifier(message) => json!({ "Message": message }),
            AppError::InvalidQueryShape { message, schema } => {
                json!({ "message": message, "schema": schema })
            }
            AppError::StoreUnavailable(err) => json!({
                "error": {
                    "category": err.category(),
                    "message": err.to_string(),
                }
            }),
            AppError::InvalidPayload(message) => json!({ "message": message }),
        }
    }
}

/// Convert an internal application error into the Lambda runtime error type.
pub fn lambda_error(err: impl std::error::Error) -> LambdaError {
    let message = err.to_string();
    error!(error = ?err, message = %message, "unhandled error forwarded to Lambda runtime");
    LambdaError::from(message)
}

/// Errors raised while creating or seeding tables at cold start.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Dynamo(#[from] aws_sdk_dynamodb::Error),
    #[error("invalid table definition: {0}")]
    Definition(#[from] BuildError),
    #[error("table `{0}` did not become active")]
    NotActive(String),
}

impl<E, R> From<SdkError<E, R>> for BootstrapError
where
    aws_sdk_dynamodb::Error: From<SdkError<E, R>>,
{
    fn from(err: SdkError<E, R>) -> Self {
        BootstrapError::Dynamo(err.into())
    }
}
