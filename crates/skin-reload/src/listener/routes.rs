//! HTTP surface of the reload listener.
//!
//! | Method | Path            | Result                                         |
//! |--------|-----------------|------------------------------------------------|
//! | GET    | `/update_skins` | 200 `Queued !wp for {steamid}\n`, or 400       |
//! | other  | any             | 404, empty body                                |
//!
//! Method matching is done inside the handler rather than by the router so a
//! non-GET request on the reload path gets a 404, never a 405.

use crate::domain::config::ReloadConfig;
use crate::domain::error::RequestError;
use crate::domain::request::PendingRequest;
use crate::handoff::HandoffSender;
use crate::{IDENTITY_PARAM, UPDATE_SKINS_PATH};
use axum::{
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

/// State shared across request tasks
#[derive(Clone)]
struct ListenerContext {
    queue: HandoffSender,
}

/// Build the listener router.
pub(crate) fn build_router(queue: HandoffSender, config: &ReloadConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(config.request_timeout));

    Router::new()
        .route(UPDATE_SKINS_PATH, any(update_skins))
        .fallback(not_found)
        .layer(middleware)
        .with_state(ListenerContext { queue })
}

/// Acknowledgement body for a queued identity.
pub(crate) fn acknowledgement(identity: &str) -> String {
    format!("Queued !wp for {identity}\n")
}

async fn update_skins(
    State(ctx): State<ListenerContext>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET {
        return not_found().await.into_response();
    }

    match queue_refresh(&ctx.queue, &uri) {
        Ok(identity) => (StatusCode::OK, acknowledgement(&identity)).into_response(),
        Err(e) => {
            warn!(uri = %uri, error = %e, "Rejected skin reload request");
            e.into_response()
        }
    }
}

/// Decode the query, enqueue the identity, and return it for the acknowledgement.
///
/// The query is read as raw pairs so a repeated `steamid` is joined rather
/// than rejected.
fn queue_refresh(queue: &HandoffSender, uri: &Uri) -> Result<String, RequestError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).map_err(|e| {
        debug!(error = %e.body_text(), "Undecodable query string");
        RequestError::MissingIdentity
    })?;

    let values = pairs
        .into_iter()
        .filter(|(key, _)| key == IDENTITY_PARAM)
        .map(|(_, value)| value);
    let request = PendingRequest::from_values(values)?;
    let identity = request.identity().to_string();
    let pending = queue.enqueue(request)?;

    info!(identity = %identity, pending = pending, "Queued skin refresh");
    Ok(identity)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match self {
            RequestError::MissingIdentity => StatusCode::BAD_REQUEST,
            RequestError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(router: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn router() -> (Router, handoff::HandoffReceiver) {
        let (tx, rx) = handoff::channel(100);
        (build_router(tx, &ReloadConfig::ephemeral()), rx)
    }

    #[tokio::test]
    async fn test_get_queues_identity() {
        let (router, mut rx) = router();
        let (status, body) = call(
            router,
            Method::GET,
            "/update_skins?steamid=76561197960287930",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Queued !wp for 76561197960287930\n");
        let queued: Vec<String> = rx.drain_pending().map(|r| r.into_identity()).collect();
        assert_eq!(queued, vec!["76561197960287930"]);
    }

    #[tokio::test]
    async fn test_percent_encoded_identity_is_decoded() {
        let (router, mut rx) = router();
        let (status, body) = call(router, Method::GET, "/update_skins?steamid=a%20b").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Queued !wp for a b\n");
        assert_eq!(rx.drain_pending().next().unwrap().identity(), "a b");
    }

    #[tokio::test]
    async fn test_missing_or_empty_identity_is_400() {
        for uri in [
            "/update_skins",
            "/update_skins?steamid=",
            "/update_skins?other=1",
        ] {
            let (router, rx) = router();
            let (status, body) = call(router, Method::GET, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, "Missing steamid parameter.");
            assert!(rx.is_empty());
        }
    }

    #[tokio::test]
    async fn test_repeated_param_is_joined_and_queued() {
        let (router, mut rx) = router();
        let (status, body) = call(
            router,
            Method::GET,
            "/update_skins?steamid=1&other=x&steamid=2",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Queued !wp for 1,2\n");
        let queued: Vec<String> = rx.drain_pending().map(|r| r.into_identity()).collect();
        assert_eq!(queued, vec!["1,2"]);
    }

    #[tokio::test]
    async fn test_other_methods_are_404() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let (router, rx) = router();
            let (status, body) =
                call(router, method.clone(), "/update_skins?steamid=1").await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
            assert!(body.is_empty());
            assert!(rx.is_empty());
        }
    }

    #[tokio::test]
    async fn test_other_paths_are_404() {
        for uri in ["/", "/update_skins/", "/UPDATE_SKINS?steamid=1", "/health"] {
            let (router, rx) = router();
            let (status, body) = call(router, Method::GET, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body.is_empty());
            assert!(rx.is_empty());
        }
    }

    #[tokio::test]
    async fn test_closed_queue_is_503() {
        let (router, rx) = router();
        drop(rx);
        let (status, _) = call(router, Method::GET, "/update_skins?steamid=1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
