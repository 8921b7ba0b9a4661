use crate::core::download::fetch_to_staging;
use crate::core::gateway::Conversion;
use crate::core::staging::StagedFile;
use crate::error::ApiError;
use crate::pages::{SCRIPT_JS, render_index};
use crate::server::types::{
    AppState, BatchDocument, ConversionRequest, ConvertResponse, RequestInput, UploadedFile,
};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::{Value, json};
use std::sync::Arc;

// server status handler
pub async fn server_status_handler() -> Json<Value> {
    Json(json!({"status": "running"}))
}

pub async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(state.config.has_api_key()))
}

pub async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT_JS,
    )
}

/// POST /convert
///
/// Accepts `files` (repeated), `file`, or `url`, plus an optional `api_key`, and
/// answers with the Markdown as JSON. Every staged file is removed before the
/// response is returned, whichever path the request took.
pub async fn convert_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "convert request is not multipart");
            return ApiError::NoInput.into_response();
        }
    };

    let request = match read_request(multipart, state.config.max_content_length_mb()).await {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let api_key = request.api_key.as_deref();
    let result = match request.input {
        RequestInput::Batch(files) => {
            tracing::info!(files = files.len(), "batch conversion");
            Ok(convert_batch(&state, files, api_key).await)
        }
        RequestInput::Single(file) => {
            tracing::info!(filename = %file.filename, bytes = file.data.len(), "single file conversion");
            convert_single(&state, file, api_key).await
        }
        RequestInput::Remote(url) => {
            tracing::info!(url = %url, "remote conversion");
            convert_remote(&state, url, api_key).await
        }
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "conversion request failed");
            e.into_response()
        }
    }
}

/// Buffers the multipart body and applies input precedence:
/// `files` > `file` > non-blank `url`.
async fn read_request(
    mut multipart: Multipart,
    limit_mb: usize,
) -> Result<ConversionRequest, ApiError> {
    let mut batch = Vec::new();
    let mut single: Option<UploadedFile> = None;
    let mut url: Option<String> = None;
    let mut api_key: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, limit_mb))?;
                let upload = UploadedFile { filename, data };
                if name == "files" {
                    batch.push(upload);
                } else if single.is_none() {
                    single = Some(upload);
                }
            }
            "url" | "api_key" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, limit_mb))?;
                if name == "url" {
                    url = Some(value);
                } else {
                    api_key = Some(value);
                }
            }
            _ => {}
        }
    }

    let input = if !batch.is_empty() {
        RequestInput::Batch(batch)
    } else if let Some(file) = single {
        if file.filename.is_empty() {
            return Err(ApiError::NoFile);
        }
        RequestInput::Single(file)
    } else {
        match url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            Some(url) => RequestInput::Remote(url),
            None => return Err(ApiError::NoInput),
        }
    };

    Ok(ConversionRequest {
        input,
        api_key: api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()),
    })
}

fn multipart_error(error: MultipartError, limit_mb: usize) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit_mb }
    } else {
        ApiError::Multipart(error.body_text())
    }
}

async fn convert_single(
    state: &AppState,
    file: UploadedFile,
    api_key: Option<&str>,
) -> Result<ConvertResponse, ApiError> {
    let conversion = stage_and_convert(state, &file, api_key).await?;
    Ok(ConvertResponse::converted(conversion.markdown)
        .with_filename(file.filename)
        .with_is_image(conversion.is_image))
}

/// Entries are converted in request order; a failing entry becomes an error section
/// and the batch carries on.
async fn convert_batch(
    state: &AppState,
    files: Vec<UploadedFile>,
    api_key: Option<&str>,
) -> ConvertResponse {
    let mut document = BatchDocument::default();
    for file in files {
        if file.filename.is_empty() {
            continue;
        }
        match stage_and_convert(state, &file, api_key).await {
            Ok(conversion) => document.push_converted(&file.filename, &conversion.markdown),
            Err(e) => {
                tracing::warn!(filename = %file.filename, error = %e, "batch entry failed");
                document.push_error(&file.filename, &e.to_string());
            }
        }
    }
    tracing::info!(sections = document.len(), "batch conversion finished");
    ConvertResponse::converted(document.finish())
}

async fn convert_remote(
    state: &AppState,
    url: String,
    api_key: Option<&str>,
) -> Result<ConvertResponse, ApiError> {
    let staged = fetch_to_staging(
        &state.http_client,
        &url,
        &state.config.upload_dir,
        state.config.max_content_length,
    )
    .await
    .map_err(ApiError::Download)?;

    let result = convert_staged(state, &staged, api_key).await;
    staged.discard().await;
    let conversion = result?;

    Ok(ConvertResponse::converted(conversion.markdown)
        .with_source_url(url)
        .with_is_image(conversion.is_image))
}

async fn stage_and_convert(
    state: &AppState,
    file: &UploadedFile,
    api_key: Option<&str>,
) -> Result<Conversion, ApiError> {
    let staged = StagedFile::write(&state.config.upload_dir, &file.filename, &file.data).await?;
    let result = convert_staged(state, &staged, api_key).await;
    staged.discard().await;
    result
}

async fn convert_staged(
    state: &AppState,
    staged: &StagedFile,
    api_key: Option<&str>,
) -> Result<Conversion, ApiError> {
    let gateway = Arc::clone(&state.gateway);
    let path = staged.path().to_path_buf();
    let api_key = api_key.map(String::from);

    let conversion = state
        .dispatcher
        .run(move || gateway.convert(&path, api_key.as_deref()))
        .await??;
    Ok(conversion)
}
