use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::pages::{self, ClassifyView};
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

const HOME_MESSAGE: &str = "Hello world!";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /
pub async fn home() -> Html<String> {
    Html(pages::home(HOME_MESSAGE))
}

/// GET /classify
pub async fn classify() -> Html<String> {
    Html(pages::classify(&ClassifyView::default()))
}

/// GET /history — every classification, newest first.
pub async fn history(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let db = state.db.clone();
    let entries = tokio::task::spawn_blocking(move || db.list_all())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB list_all error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Html(pages::history(&entries)))
}

/// POST /upload — multipart form with a `file` field. Always answers with
/// the classify page, carrying either the label or an error message.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            warn!("Upload rejected: {}", rejection.body_text());
            return classify_error(rejection.status(), "Expected a multipart form upload");
        }
    };

    let (file_name, bytes) = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(FILE_FIELD) => {
                let file_name = field.file_name().map(str::to_owned);
                match field.bytes().await {
                    Ok(bytes) => break (file_name, bytes),
                    Err(e) => {
                        warn!("Failed to read upload body: {}", e.body_text());
                        return classify_error(e.status(), "The uploaded file could not be read");
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => {
                return classify_error(StatusCode::UNPROCESSABLE_ENTITY, "No file was uploaded");
            }
            Err(e) => {
                warn!("Malformed multipart body: {}", e.body_text());
                return classify_error(e.status(), "The uploaded file could not be read");
            }
        }
    };

    match state.uploader.process(file_name.as_deref(), bytes).await {
        Ok(record) => Html(pages::classify(&ClassifyView::success(record.label))).into_response(),
        Err(failure) => Html(pages::classify(&ClassifyView::error(failure.user_message()))).into_response(),
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn classify_error(status: StatusCode, message: &str) -> Response {
    (status, Html(pages::classify(&ClassifyView::error(message)))).into_response()
}
