use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required: missing or invalid token")]
    Unauthenticated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        use agora_errors::Problem;
        use http::StatusCode;

        let problem = match self {
            AuthError::Unauthenticated | AuthError::InvalidToken => {
                Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized", self.to_string())
                    .with_code("agora.auth.unauthenticated.v1")
                    .with_type("https://errors.agora.dev/agora.auth.unauthenticated.v1")
            }
            AuthError::Internal(ref msg) => {
                tracing::error!(error = %msg, "auth pipeline misconfigured");
                Problem::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "An internal error occurred",
                )
                .with_code("agora.auth.internal.v1")
                .with_type("https://errors.agora.dev/agora.auth.internal.v1")
            }
        };

        problem.into_response()
    }
}
