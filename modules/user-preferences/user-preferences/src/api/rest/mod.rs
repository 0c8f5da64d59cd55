pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

/// Result type of every REST handler.
pub type ApiResult<T> = Result<T, agora_errors::Problem>;
