//! Inbound HTTP surface.

use crate::providers::ProviderError;
use crate::resolver::{LookupQuery, ReputationResolver, ResolveError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<ReputationResolver>,
}

/// Build and configure the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/reputation-lookup", get(lookup_get).post(lookup_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inbound lookup parameters, accepted as query string or JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupParams {
    pub ip: Option<String>,
    pub domain: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub package_name: String,
}

impl From<LookupParams> for LookupQuery {
    fn from(params: LookupParams) -> Self {
        LookupQuery {
            ip: params.ip,
            domain: params.domain,
            port: params.port,
            package_name: params.package_name,
        }
    }
}

/// GET /health
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// GET /reputation-lookup
async fn lookup_get(
    State(state): State<AppState>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadParams(e.body_text()))?;
    let verdict = state.resolver.resolve(&params.into()).await?;
    Ok(Json(verdict))
}

/// POST /reputation-lookup
async fn lookup_post(
    State(state): State<AppState>,
    params: Result<Json<LookupParams>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(params) = params.map_err(|e| ApiError::BadParams(e.body_text()))?;
    let verdict = state.resolver.resolve(&params.into()).await?;
    Ok(Json(verdict))
}

/// Request failure carried to the HTTP layer.
///
/// Every failure, including malformed parameters, answers with a
/// `{"detail": "<message>"}` body.
pub enum ApiError {
    /// Request parameters could not be parsed.
    BadParams(String),
    /// Resolution failed.
    Resolve(ResolveError),
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        ApiError::Resolve(e)
    }
}

/// Map a resolution error to an HTTP status.
///
/// Missing subjects are the caller's fault; upstream failures map to
/// gateway statuses rather than a blanket 500.
pub(crate) fn error_status(error: &ResolveError) -> StatusCode {
    match error {
        ResolveError::NoSubjectProvided => StatusCode::BAD_REQUEST,
        ResolveError::Provider(ProviderError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        ResolveError::Provider(ProviderError::Unreachable(_)) => StatusCode::BAD_GATEWAY,
        ResolveError::Provider(ProviderError::Unauthorized) => StatusCode::BAD_GATEWAY,
        ResolveError::Provider(ProviderError::InvalidResponse(_)) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadParams(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Resolve(e) => (error_status(&e), e.to_string()),
        };
        (status, Json(json!({"detail": message}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryVerdictStore, Subject, SubjectKind};
    use crate::providers::{RawVerdict, ReputationProvider};
    use async_trait::async_trait;
    use axum::body::to_bytes;

    /// Provider returning a canned payload or failure.
    struct StaticProvider {
        kind: SubjectKind,
        payload: RawVerdict,
        fail: Option<fn() -> ProviderError>,
    }

    #[async_trait]
    impl ReputationProvider for StaticProvider {
        async fn lookup(&self, _subject: &Subject) -> Result<RawVerdict, ProviderError> {
            match self.fail {
                Some(f) => Err(f()),
                None => Ok(self.payload.clone()),
            }
        }

        fn name(&self) -> &str {
            "static"
        }

        fn kind(&self) -> SubjectKind {
            self.kind
        }
    }

    fn state_with(ip: StaticProvider, domain: StaticProvider) -> AppState {
        let store = Arc::new(MemoryVerdictStore::new(100));
        let resolver = ReputationResolver::new(store, Arc::new(ip), Arc::new(domain));
        AppState {
            resolver: Arc::new(resolver),
        }
    }

    fn ok_provider(kind: SubjectKind, payload: RawVerdict) -> StaticProvider {
        StaticProvider {
            kind,
            payload,
            fail: None,
        }
    }

    fn failing_provider(kind: SubjectKind, fail: fn() -> ProviderError) -> StaticProvider {
        StaticProvider {
            kind,
            payload: json!(null),
            fail: Some(fail),
        }
    }

    fn ip_params(ip: &str) -> LookupParams {
        LookupParams {
            ip: Some(ip.to_string()),
            domain: None,
            port: Some(443),
            package_name: "com.example.app".to_string(),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_get_returns_raw_verdict() {
        let state = state_with(
            ok_provider(
                SubjectKind::Ip,
                json!({"is_threat": true, "scores": {"threat": 80}}),
            ),
            ok_provider(SubjectKind::Domain, json!({})),
        );

        let response = lookup_get(State(state), Ok(Query(ip_params("1.2.3.4"))))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"is_threat": true, "scores": {"threat": 80}})
        );
    }

    #[tokio::test]
    async fn test_lookup_post_returns_raw_verdict() {
        let state = state_with(
            ok_provider(SubjectKind::Ip, json!({})),
            ok_provider(SubjectKind::Domain, json!({"score": 42})),
        );

        let params = LookupParams {
            ip: None,
            domain: Some("example.com".to_string()),
            port: None,
            package_name: "com.example.app".to_string(),
        };
        let response = lookup_post(State(state), Ok(Json(params)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"score": 42}));
    }

    #[tokio::test]
    async fn test_missing_subject_answers_detail_body() {
        let state = state_with(
            ok_provider(SubjectKind::Ip, json!({})),
            ok_provider(SubjectKind::Domain, json!({})),
        );

        let params = LookupParams {
            ip: None,
            domain: None,
            port: None,
            package_name: String::new(),
        };
        let response = lookup_get(State(state), Ok(Query(params)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "No IP address or domain provided"})
        );
    }

    #[tokio::test]
    async fn test_provider_failure_answers_detail_body() {
        let state = state_with(
            failing_provider(SubjectKind::Ip, || ProviderError::Timeout),
            ok_provider(SubjectKind::Domain, json!({})),
        );

        let response = lookup_get(State(state), Ok(Query(ip_params("1.2.3.4"))))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "Request timed out"})
        );
    }

    #[tokio::test]
    async fn test_bad_params_answers_detail_body() {
        let response = ApiError::BadParams("Invalid query string".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "Invalid query string"})
        );
    }

    #[tokio::test]
    async fn test_health_body() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&ResolveError::NoSubjectProvided),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&ResolveError::Provider(ProviderError::Timeout)),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            error_status(&ResolveError::Provider(ProviderError::Unreachable(
                "refused".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&ResolveError::Provider(ProviderError::Unauthorized)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&ResolveError::Provider(ProviderError::InvalidResponse(
                "not json".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_params_into_query() {
        let params = ip_params("1.2.3.4");
        let query: LookupQuery = params.into();
        assert_eq!(query.ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(query.port, Some(443));
        assert_eq!(query.package_name, "com.example.app");
    }

    #[test]
    fn test_params_deserialize_defaults() {
        let params: LookupParams = serde_json::from_value(json!({"ip": "1.2.3.4"})).unwrap();
        assert_eq!(params.ip.as_deref(), Some("1.2.3.4"));
        assert!(params.domain.is_none());
        assert!(params.port.is_none());
        assert!(params.package_name.is_empty());
    }
}
