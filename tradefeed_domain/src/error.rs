use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::borrow::Cow;

pub type FeedResult<T, E = FeedError> = std::result::Result<T, E>;

/// Coarse classification of every failure, telling the caller whether
/// retrying can help.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing input. Must be fixed by the caller.
    Validation,
    /// A referenced account, profile, post or comment does not exist.
    NotFound,
    /// The backing store timed out or is unreachable. Safe to retry.
    Transient,
    /// The backing store returned data that does not fit the schema.
    DataIntegrity,
    Unauthorized,
    Forbidden,
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(Cow<'static, str>),

    #[error("handle is taken")]
    HandleTaken,

    #[error("email is taken")]
    EmailTaken,

    #[error("an account cannot follow itself")]
    CannotFollowSelf,

    #[error("account not found")]
    AccountNotFound,

    #[error("profile not found")]
    ProfileNotFound,

    #[error("post not found")]
    PostNotFound,

    #[error("backend temporarily unavailable")]
    Unavailable(#[source] anyhow::Error),

    #[error("backend returned malformed data: {0}")]
    DataIntegrity(String),

    #[error("an internal server error occurred")]
    Anyhow(#[from] anyhow::Error),
}

impl FeedError {
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::Validation(_)
            | Self::HandleTaken
            | Self::EmailTaken
            | Self::CannotFollowSelf => ErrorKind::Validation,
            Self::AccountNotFound | Self::ProfileNotFound | Self::PostNotFound => {
                ErrorKind::NotFound
            }
            Self::Unavailable(_) => ErrorKind::Transient,
            Self::DataIntegrity(_) => ErrorKind::DataIntegrity,
            Self::Anyhow(_) => ErrorKind::Internal,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::HandleTaken | Self::EmailTaken => StatusCode::UNPROCESSABLE_ENTITY,
            _ => match self.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::DataIntegrity | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            },
        }
    }
}

/// Wire format of every error response.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match kind {
            ErrorKind::DataIntegrity | ErrorKind::Internal => {
                tracing::error!(error = ?self, "request failed");
            }
            ErrorKind::Transient => tracing::warn!(error = ?self, "backend unavailable"),
            _ => {}
        }

        let status = self.status_code();
        let body = Json(ErrorBody {
            error: self.to_string(),
            kind,
        });

        match self {
            Self::Unauthorized => (
                status,
                [(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}

impl From<JsonRejection> for FeedError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(format!("malformed request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for FeedError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(format!("malformed path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for FeedError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(format!("malformed query: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_has_a_kind_and_status() {
        let cases = [
            (FeedError::validation("x"), StatusCode::BAD_REQUEST),
            (FeedError::HandleTaken, StatusCode::UNPROCESSABLE_ENTITY),
            (FeedError::CannotFollowSelf, StatusCode::BAD_REQUEST),
            (FeedError::PostNotFound, StatusCode::NOT_FOUND),
            (
                FeedError::Unavailable(anyhow::anyhow!("pool timed out")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                FeedError::DataIntegrity("bad role".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (FeedError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];

        for (error, status) in cases {
            assert_eq!(status, error.into_response().status());
        }
    }

    #[test]
    fn unauthorized_should_ask_for_bearer_token() {
        let response = FeedError::Unauthorized.into_response();
        assert_eq!(
            Some("Bearer"),
            response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok())
        );
    }

    #[test]
    fn transient_is_the_only_retriable_kind() {
        assert_eq!(
            ErrorKind::Transient,
            FeedError::Unavailable(anyhow::anyhow!("io")).kind()
        );
        assert_eq!(
            ErrorKind::DataIntegrity,
            FeedError::DataIntegrity("x".into()).kind()
        );
        assert_eq!(ErrorKind::Internal, FeedError::from(anyhow::anyhow!("x")).kind());
    }
}
