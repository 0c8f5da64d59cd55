use std::sync::Arc;

use agora_auth::Authz;
use agora_security::Capability;
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use user_preferences_sdk::{
    CapabilityCheck, IdentityProfile, MergePatch, NewIdentity, RoleAssignment, SettingsRecord,
};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::service::Service;

use super::ApiResult;
use super::dto::{
    CapabilitiesResponse, ChangeRoleRequest, RegisterIdentityRequest, SETTINGS_FIELD,
    SubmitSettingsResponse,
};
use super::error::ProblemScope;

pub async fn get_settings(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
) -> ApiResult<Json<SettingsRecord>> {
    let settings = svc.get_settings(&ctx).await.map_err(|e| scope.domain(&e))?;
    Ok(Json(settings))
}

/// Body is read as raw bytes so the size and depth bounds run before any
/// JSON parsing.
pub async fn patch_settings(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
    body: Bytes,
) -> ApiResult<Json<SubmitSettingsResponse>> {
    let patch = MergePatch::from_envelope(&body, SETTINGS_FIELD, &svc.limits())
        .map_err(|e| scope.domain(&DomainError::from(e)))?;
    let submission = svc
        .submit_settings(&ctx, &patch)
        .await
        .map_err(|e| scope.domain(&e))?;
    Ok(Json(submission.into()))
}

pub async fn list_capabilities(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
) -> ApiResult<Json<CapabilitiesResponse>> {
    let capabilities = svc.capabilities(&ctx).await.map_err(|e| scope.domain(&e))?;
    Ok(Json(CapabilitiesResponse { capabilities }))
}

pub async fn check_capability(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
    Path(name): Path<String>,
) -> ApiResult<Json<CapabilityCheck>> {
    let capability: Capability = name
        .parse()
        .map_err(|_| scope.unknown_capability(&name))?;
    let check = svc
        .check_capability(&ctx, capability)
        .await
        .map_err(|e| scope.domain(&e))?;
    Ok(Json(check))
}

pub async fn register_identity(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req: RegisterIdentityRequest = parse_body(&body, &scope)?;
    let profile = svc
        .register_identity(NewIdentity {
            id: Some(ctx.subject_id()),
            username: req.username,
            email: req.email,
        })
        .await
        .map_err(|e| scope.domain(&e))?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn list_identities(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
) -> ApiResult<Json<Vec<IdentityProfile>>> {
    let profiles = svc.list_identities(&ctx).await.map_err(|e| scope.domain(&e))?;
    Ok(Json(profiles))
}

pub async fn change_role(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<RoleAssignment>> {
    let target = parse_id(&id, &scope)?;
    let req: ChangeRoleRequest = parse_body(&body, &scope)?;
    let assignment = svc
        .change_role(&ctx, target, req.role)
        .await
        .map_err(|e| scope.domain(&e))?;
    Ok(Json(assignment))
}

pub async fn delete_identity(
    Authz(ctx): Authz,
    scope: ProblemScope,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let target = parse_id(&id, &scope)?;
    svc.delete_identity(&ctx, target)
        .await
        .map_err(|e| scope.domain(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_body<T: DeserializeOwned>(body: &[u8], scope: &ProblemScope) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| scope.invalid_request(format!("invalid request body: {e}")))
}

fn parse_id(raw: &str, scope: &ProblemScope) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| scope.invalid_request(format!("invalid identity id '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::routes;
    use crate::domain::service::ServiceConfig;
    use crate::infra::InMemoryIdentityRepository;
    use agora_security::{Role, SecurityContext};
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt as _;

    struct Fixture {
        service: Arc<Service>,
        user: Uuid,
        moderator: Uuid,
        admin: Uuid,
    }

    async fn fixture(config: ServiceConfig) -> Fixture {
        let repo = Arc::new(InMemoryIdentityRepository::new());
        let service = Arc::new(Service::new(repo, config));
        let mut ids = Vec::new();
        for (name, role) in [
            ("alice", Role::User),
            ("molly", Role::Moderator),
            ("root", Role::Admin),
        ] {
            let profile = service
                .bootstrap_identity(
                    NewIdentity {
                        id: None,
                        username: name.to_owned(),
                        email: format!("{name}@example.com"),
                    },
                    role,
                )
                .await
                .unwrap();
            ids.push(profile.id);
        }
        Fixture {
            service,
            user: ids[0],
            moderator: ids[1],
            admin: ids[2],
        }
    }

    fn app(service: &Arc<Service>, subject: Uuid) -> Router {
        let ctx = SecurityContext::builder().subject_id(subject).build();
        routes::router(Arc::clone(service)).layer(Extension(ctx))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
        send_raw(app, method, uri, body).await
    }

    async fn send_raw(app: Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_get_settings_returns_defaults() {
        let f = fixture(ServiceConfig::default()).await;
        let (status, json) = send(
            app(&f.service, f.user),
            "GET",
            "/user-preferences/v1/settings",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["theme"], "system");
        assert_eq!(json["language"], "en");
    }

    #[tokio::test]
    async fn test_get_settings_for_unknown_subject_is_not_found() {
        let f = fixture(ServiceConfig::default()).await;
        let (status, json) = send(
            app(&f.service, Uuid::new_v4()),
            "GET",
            "/user-preferences/v1/settings",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "agora.user_preferences.not_found.v1");
        assert_eq!(json["instance"], "/user-preferences/v1/settings");
    }

    #[tokio::test]
    async fn test_problem_names_request_path_and_trace_id() {
        let f = fixture(ServiceConfig::default()).await;
        let request = Request::builder()
            .method("DELETE")
            .uri("/user-preferences/v1/identities/not-a-uuid")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app(&f.service, f.admin).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["instance"], "/user-preferences/v1/identities/not-a-uuid");
        assert_eq!(json["trace_id"], "req-42");

        let uri = format!("/user-preferences/v1/identities/{}/role", f.user);
        let (status, json) = send(
            app(&f.service, f.moderator),
            "PUT",
            &uri,
            Some(json!({"role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["instance"], uri);
        assert!(json.get("trace_id").is_none());
    }

    #[tokio::test]
    async fn test_patch_settings_applies_and_reports_dropped() {
        let f = fixture(ServiceConfig::default()).await;
        let (status, json) = send(
            app(&f.service, f.user),
            "PATCH",
            "/user-preferences/v1/settings",
            Some(json!({"settings": {"theme": "dark", "unknownKey": "x"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["settings"]["theme"], "dark");
        assert_eq!(json["partial"], true);
        assert_eq!(json["dropped"], json!([{"path": "unknownKey", "reason": "not_allowed"}]));
    }

    #[tokio::test]
    async fn test_structural_alias_does_not_grant_administer() {
        let f = fixture(ServiceConfig::default()).await;
        let (status, json) = send(
            app(&f.service, f.user),
            "PATCH",
            "/user-preferences/v1/settings",
            Some(json!({"settings": {"__structural_alias__": {"administer": true}}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["dropped"][0]["path"], "__structural_alias__");
        assert_eq!(json["dropped"].as_array().unwrap().len(), 1);

        let (status, json) = send(
            app(&f.service, f.user),
            "GET",
            "/user-preferences/v1/capabilities/administer",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"capability": "administer", "allowed": false}));
    }

    #[tokio::test]
    async fn test_patch_settings_bounds() {
        let f = fixture(ServiceConfig::default()).await;

        let mut deep = json!(1);
        for _ in 0..9 {
            deep = json!({ "a": deep });
        }
        let (status, json) = send(
            app(&f.service, f.user),
            "PATCH",
            "/user-preferences/v1/settings",
            Some(json!({ "settings": deep })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], "agora.user_preferences.document_too_deep.v1");

        let big = "x".repeat(20 * 1024);
        let (status, _) = send(
            app(&f.service, f.user),
            "PATCH",
            "/user-preferences/v1/settings",
            Some(json!({"settings": {"language": big}})),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (status, json) = send(
            app(&f.service, f.user),
            "PATCH",
            "/user-preferences/v1/settings",
            Some(json!({"settings": ["theme"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "agora.user_preferences.malformed_document.v1");

        let (status, _) = send_raw(
            app(&f.service, f.user),
            "PATCH",
            "/user-preferences/v1/settings",
            Body::from("{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_and_keeps_record() {
        let f = fixture(ServiceConfig {
            reject_dropped_keys: true,
            ..ServiceConfig::default()
        })
        .await;
        let (status, json) = send(
            app(&f.service, f.user),
            "PATCH",
            "/user-preferences/v1/settings",
            Some(json!({"settings": {"theme": "dark", "__proto__": {}}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["errors"][0]["field"], "__proto__");
        assert_eq!(json["errors"][0]["code"], "reserved");

        let (_, json) = send(
            app(&f.service, f.user),
            "GET",
            "/user-preferences/v1/settings",
            None,
        )
        .await;
        assert_eq!(json["theme"], "system");
    }

    #[tokio::test]
    async fn test_capabilities_by_role() {
        let f = fixture(ServiceConfig::default()).await;
        let (_, json) = send(
            app(&f.service, f.moderator),
            "GET",
            "/user-preferences/v1/capabilities",
            None,
        )
        .await;
        assert_eq!(json["capabilities"], json!(["read", "comment", "moderate"]));

        let (_, json) = send(
            app(&f.service, Uuid::new_v4()),
            "GET",
            "/user-preferences/v1/capabilities",
            None,
        )
        .await;
        assert_eq!(json["capabilities"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_capability_is_bad_request() {
        let f = fixture(ServiceConfig::default()).await;
        let (status, json) = send(
            app(&f.service, f.admin),
            "GET",
            "/user-preferences/v1/capabilities/superpower",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "agora.user_preferences.unknown_capability.v1");
        assert_eq!(json["instance"], "/user-preferences/v1/capabilities/superpower");
    }

    #[tokio::test]
    async fn test_change_role_requires_administer() {
        let f = fixture(ServiceConfig::default()).await;
        let uri = format!("/user-preferences/v1/identities/{}/role", f.user);

        let (status, json) = send(
            app(&f.service, f.moderator),
            "PUT",
            &uri,
            Some(json!({"role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(json["detail"].as_str().unwrap().contains("administer"));

        let (status, json) = send(
            app(&f.service, f.admin),
            "PUT",
            &uri,
            Some(json!({"role": "moderator"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["role"], "moderator");

        let (status, _) = send(
            app(&f.service, f.admin),
            "PUT",
            &uri,
            Some(json!({"role": "owner"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_list_identities_requires_moderate() {
        let f = fixture(ServiceConfig::default()).await;
        let (status, _) = send(
            app(&f.service, f.user),
            "GET",
            "/user-preferences/v1/identities",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = send(
            app(&f.service, f.moderator),
            "GET",
            "/user-preferences/v1/identities",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alice", "molly", "root"]);
        assert!(json[0].get("role").is_none());
        assert!(json[0].get("email").is_none());
    }

    #[tokio::test]
    async fn test_register_identity_uses_subject_id() {
        let f = fixture(ServiceConfig::default()).await;
        let subject = Uuid::new_v4();
        let (status, json) = send(
            app(&f.service, subject),
            "POST",
            "/user-preferences/v1/identities",
            Some(json!({"username": "newbie", "email": "newbie@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["id"], subject.to_string());

        let (status, _) = send(
            app(&f.service, Uuid::new_v4()),
            "POST",
            "/user-preferences/v1/identities",
            Some(json!({"username": "newbie", "email": "other@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            app(&f.service, Uuid::new_v4()),
            "POST",
            "/user-preferences/v1/identities",
            Some(json!({"username": "sneaky", "email": "s@example.com", "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_identity() {
        let f = fixture(ServiceConfig::default()).await;

        let uri = format!("/user-preferences/v1/identities/{}", f.admin);
        let (status, _) = send(app(&f.service, f.user), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/user-preferences/v1/identities/{}", f.user);
        let (status, _) = send(app(&f.service, f.user), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(app(&f.service, f.admin), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            app(&f.service, f.admin),
            "DELETE",
            "/user-preferences/v1/identities/not-a-uuid",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
