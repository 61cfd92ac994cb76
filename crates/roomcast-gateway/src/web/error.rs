//! Error -> HTTP response mapping.
//!
//! `ApiError` only picks the status and tags the response with the page it
//! wants; [`render_error_pages`] swaps in the rendered HTML. Handlers that fail
//! never need access to the views.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use roomcast_core::error::RoomcastError;

use crate::app_state::AppState;

/// Handler error. Wraps the shared error type so it can be returned from axum
/// handlers with `?`.
#[derive(Debug)]
pub struct ApiError(pub RoomcastError);

impl From<RoomcastError> for ApiError {
    fn from(e: RoomcastError) -> Self {
        Self(e)
    }
}

/// Response extension naming the HTML page to render in place of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    NotFound,
    Internal,
}

fn tagged(status: StatusCode, body: &'static str, page: ErrorPage) -> Response {
    let mut res = (status, body).into_response();
    res.extensions_mut().insert(page);
    res
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            RoomcastError::NotFound => {
                tagged(StatusCode::NOT_FOUND, "not found", ErrorPage::NotFound)
            }
            RoomcastError::BadRequest(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response()
            }
            RoomcastError::Cancelled => {
                (StatusCode::SERVICE_UNAVAILABLE, "server shutting down").into_response()
            }
            other => {
                let code = other.client_code().as_str();
                tracing::error!(error = %other, code, "request failed");
                tagged(StatusCode::INTERNAL_SERVER_ERROR, "internal error", ErrorPage::Internal)
            }
        }
    }
}

/// Response middleware: replace tagged error bodies with their HTML page.
/// If rendering itself fails the plain body is kept.
pub async fn render_error_pages(State(app): State<AppState>, res: Response) -> Response {
    let Some(page) = res.extensions().get::<ErrorPage>().copied() else {
        return res;
    };
    let rendered = match page {
        ErrorPage::NotFound => app.views().not_found(),
        ErrorPage::Internal => app.views().internal_error(),
    };
    match rendered {
        Ok(html) => (res.status(), Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, ?page, "error page render failed");
            res
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use axum::body::to_bytes;

    async fn rendered(e: RoomcastError) -> (StatusCode, String) {
        let app = AppState::new(GatewayConfig::default()).unwrap();
        let res = render_error_pages(State(app), ApiError(e).into_response()).await;
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn status_mapping() {
        let status = |e: RoomcastError| ApiError(e).into_response().status();
        assert_eq!(status(RoomcastError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(RoomcastError::BadRequest("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(RoomcastError::Cancelled), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status(RoomcastError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_errors_get_the_500_page() {
        let (status, body) = rendered(RoomcastError::Internal("boom".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Something went wrong"), "{body}");
        assert!(!body.contains("boom"), "{body}");
    }

    #[tokio::test]
    async fn not_found_gets_the_404_page() {
        let (status, body) = rendered(RoomcastError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("No such session."), "{body}");
    }

    #[tokio::test]
    async fn untagged_responses_pass_through() {
        let (status, body) = rendered(RoomcastError::BadRequest("empty".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "empty");
    }
}
