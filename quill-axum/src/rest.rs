use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, Method},
    routing::{self, MethodRouter},
    Json, Router,
};
use quill_core::errors::QuillError;
use quill_core::{QuillApp, ServiceCapabilities, ServiceMethodKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::{
    params::{FromRestParams, RestParams},
    QuillAxumError, QuillAxumState,
};

fn map_json_rejection(rejection: JsonRejection) -> QuillAxumError {
    QuillError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}

async fn method_not_allowed(OriginalUri(uri): OriginalUri, method: Method) -> QuillAxumError {
    QuillError::method_not_allowed(format!("Method {method} is not allowed on {}", uri.path())).into()
}

/// REST routes for one registered service, limited to its capabilities:
///
/// | route          | method |
/// |----------------|--------|
/// | `GET /`        | find   |
/// | `POST /`       | create |
/// | `GET /{id}`    | get    |
/// | `PUT /{id}`    | update |
/// | `DELETE /{id}` | remove |
pub fn service_router<R, P>(
    service_name: Arc<String>,
    caps: &ServiceCapabilities,
    app: Arc<QuillApp<R, P>>,
) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let state = QuillAxumState { app };

    let mut collection: MethodRouter<QuillAxumState<R, P>> = MethodRouter::new();
    let mut item: MethodRouter<QuillAxumState<R, P>> = MethodRouter::new();

    if caps.allows(ServiceMethodKind::Find) {
        let service_name = Arc::clone(&service_name);
        collection = collection.get(
            move |State(state): State<QuillAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): Query<HashMap<String, String>>,
                  OriginalUri(uri): OriginalUri| async move {
                let params = P::from_rest_params(RestParams::from_parts("rest", &headers, query, "GET", &uri));

                let svc = state.app.service(&service_name)?;
                let res = svc.find(params).await?;
                Ok::<_, QuillAxumError>(Json(res))
            },
        );
    }

    if caps.allows(ServiceMethodKind::Create) {
        let service_name = Arc::clone(&service_name);
        collection = collection.post(
            move |State(state): State<QuillAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): Query<HashMap<String, String>>,
                  OriginalUri(uri): OriginalUri,
                  data: Result<Json<R>, JsonRejection>| async move {
                let Json(data) = data.map_err(map_json_rejection)?;
                let params = P::from_rest_params(RestParams::from_parts("rest", &headers, query, "POST", &uri));

                let svc = state.app.service(&service_name)?;
                let res = svc.create(data, params).await?;
                Ok::<_, QuillAxumError>(Json(res))
            },
        );
    }

    if caps.allows(ServiceMethodKind::Get) {
        let service_name = Arc::clone(&service_name);
        item = item.get(
            move |State(state): State<QuillAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): Query<HashMap<String, String>>,
                  OriginalUri(uri): OriginalUri,
                  Path(id): Path<String>| async move {
                let params = P::from_rest_params(RestParams::from_parts("rest", &headers, query, "GET", &uri));

                let svc = state.app.service(&service_name)?;
                let res = svc.get(&id, params).await?;
                Ok::<_, QuillAxumError>(Json(res))
            },
        );
    }

    if caps.allows(ServiceMethodKind::Update) {
        let service_name = Arc::clone(&service_name);
        item = item.put(
            move |State(state): State<QuillAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): Query<HashMap<String, String>>,
                  OriginalUri(uri): OriginalUri,
                  Path(id): Path<String>,
                  data: Result<Json<R>, JsonRejection>| async move {
                let Json(data) = data.map_err(map_json_rejection)?;
                let params = P::from_rest_params(RestParams::from_parts("rest", &headers, query, "PUT", &uri));

                let svc = state.app.service(&service_name)?;
                let res = svc.update(&id, data, params).await?;
                Ok::<_, QuillAxumError>(Json(res))
            },
        );
    }

    if caps.allows(ServiceMethodKind::Remove) {
        let service_name = Arc::clone(&service_name);
        item = item.delete(
            move |State(state): State<QuillAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): Query<HashMap<String, String>>,
                  OriginalUri(uri): OriginalUri,
                  Path(id): Path<String>| async move {
                let params = P::from_rest_params(RestParams::from_parts("rest", &headers, query, "DELETE", &uri));

                let svc = state.app.service(&service_name)?;
                let res = svc.remove(&id, params).await?;
                Ok::<_, QuillAxumError>(Json(res))
            },
        );
    }

    Router::new()
        .route("/", collection.fallback(method_not_allowed))
        .route("/{id}", item.fallback(method_not_allowed))
        .fallback(routing::any(|| async {
            QuillAxumError::from(QuillError::not_found("Route not found"))
        }))
        .with_state(state)
}
