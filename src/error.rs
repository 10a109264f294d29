use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::{
    state::AppState,
    users::{directory::DirectoryError, validation::ValidationError},
};

/// Uniform response envelope for every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            count: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// `public` is what the caller sees; `source` is logged and only shown
    /// in development mode.
    #[error("{public}")]
    Internal {
        public: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// For `map_err`: wraps any error as `Internal` with a fixed public text.
    pub fn internal<E>(public: &'static str) -> impl FnOnce(E) -> ApiError
    where
        E: Into<anyhow::Error>,
    {
        move |e| ApiError::Internal {
            public,
            source: e.into(),
        }
    }

    /// For `map_err` on directory calls: duplicate emails become `Conflict`,
    /// anything else `Internal` with the given public text.
    pub fn storage(public: &'static str) -> impl FnOnce(DirectoryError) -> ApiError {
        move |e| match e {
            DirectoryError::DuplicateEmail => {
                ApiError::Conflict(DirectoryError::DuplicateEmail.to_string())
            }
            other => ApiError::Internal {
                public,
                source: other.into(),
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.0)
    }
}

/// Attached to 500 responses so the development layer can reveal it.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail {
    pub public: &'static str,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal { public, source } => {
                error!(error = %format!("{source:#}"), public, "internal error");
                let mut res = (status, Json(ApiResponse::failure(public))).into_response();
                res.extensions_mut().insert(InternalErrorDetail {
                    public,
                    detail: format!("{source:#}"),
                });
                res
            }
            other => (status, Json(ApiResponse::failure(other.to_string()))).into_response(),
        }
    }
}

/// Puts the internal error detail into `message` when running in development.
pub async fn reveal_internal_errors(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let res = next.run(req).await;
    if !state.config.environment.is_development() {
        return res;
    }
    match res.extensions().get::<InternalErrorDetail>().cloned() {
        Some(InternalErrorDetail { public, detail }) => (
            res.status(),
            Json(ApiResponse::failure(public).with_message(detail)),
        )
            .into_response(),
        None => res,
    }
}

/// Wraps axum's bodiless 405 in the envelope, keeping its `Allow` header.
pub async fn method_not_allowed(req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    if res.status() != StatusCode::METHOD_NOT_ALLOWED {
        return res;
    }
    let mut out = (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiResponse::failure("Method not allowed")),
    )
        .into_response();
    if let Some(allow) = res.headers().get(header::ALLOW) {
        out.headers_mut().insert(header::ALLOW, allow.clone());
    }
    out
}

/// `Json` extractor whose rejections use the envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "rejected request body");
                Err(ApiError::Validation(rejection.body_text()))
            }
        }
    }
}
