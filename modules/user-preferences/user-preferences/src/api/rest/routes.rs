use std::sync::Arc;

use axum::routing::{delete, get, put};
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Prefix of every route of the module.
pub const BASE_PATH: &str = "/user-preferences/v1";

/// Routes of the user-preferences module.
///
/// Handlers expect a `SecurityContext` in the request extensions; the caller
/// must wrap the router in the authentication middleware.
#[must_use]
pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route(
            &format!("{BASE_PATH}/settings"),
            get(handlers::get_settings).patch(handlers::patch_settings),
        )
        .route(
            &format!("{BASE_PATH}/capabilities"),
            get(handlers::list_capabilities),
        )
        .route(
            &format!("{BASE_PATH}/capabilities/{{capability}}"),
            get(handlers::check_capability),
        )
        .route(
            &format!("{BASE_PATH}/identities"),
            get(handlers::list_identities).post(handlers::register_identity),
        )
        .route(
            &format!("{BASE_PATH}/identities/{{id}}/role"),
            put(handlers::change_role),
        )
        .route(
            &format!("{BASE_PATH}/identities/{{id}}"),
            delete(handlers::delete_identity),
        )
        .layer(Extension(service))
}
