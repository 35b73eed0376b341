use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::header,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::render::{check_parity, render, OutputFormat, Parity};
use crate::resume::builder::build;
use crate::resume::model::{DocumentModel, ModelStats};
use crate::resume::normalizer::normalize_bytes;
use crate::state::AppState;

pub const RENDER_ID_HEADER: &str = "x-render-id";

#[derive(Debug, Deserialize)]
pub struct RenderParams {
    pub format: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub canonical: String,
}

#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub canonical: String,
    pub model: DocumentModel,
    pub stats: ModelStats,
}

/// Rejects empty and oversized bodies before any parsing happens.
fn check_input(body: &[u8], max_chars: usize) -> Result<(), AppError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(AppError::Validation("request body is empty".to_string()));
    }
    let chars = String::from_utf8_lossy(body).chars().count();
    if chars > max_chars {
        return Err(AppError::PayloadTooLarge(format!(
            "input has {chars} characters, the limit is {max_chars}"
        )));
    }
    Ok(())
}

/// Runs CPU-bound pipeline work off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in pipeline: {e}")))?
}

/// POST /api/v1/resume/normalize
pub async fn handle_normalize(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NormalizeResponse>, AppError> {
    check_input(&body, state.config.max_input_chars)?;
    let canonical = run_blocking(move || Ok(normalize_bytes(&body))).await?;
    Ok(Json(NormalizeResponse { canonical }))
}

/// POST /api/v1/resume/model
pub async fn handle_model(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ModelResponse>, AppError> {
    check_input(&body, state.config.max_input_chars)?;
    let response = run_blocking(move || {
        let canonical = normalize_bytes(&body);
        let model = build(&canonical);
        let stats = model.stats();
        Ok(ModelResponse {
            canonical,
            model,
            stats,
        })
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/resume/render?format=pdf|docx&style=<label>
pub async fn handle_render(
    State(state): State<AppState>,
    Query(params): Query<RenderParams>,
    body: Bytes,
) -> Result<Response, AppError> {
    let format = params
        .format
        .as_deref()
        .unwrap_or("pdf")
        .parse::<OutputFormat>()
        .map_err(AppError::Validation)?;
    let label = params.style.as_deref().unwrap_or("classic");
    let sheet = state.styles.get(label).cloned().ok_or_else(|| {
        AppError::Validation(format!(
            "unknown style '{label}' (available: {})",
            state.styles.labels().join(", ")
        ))
    })?;
    check_input(&body, state.config.max_input_chars)?;

    let render_id = Uuid::new_v4();
    let span = info_span!("render", %render_id, %format, style = %sheet.label);
    let page = state.page;
    let verify = state.config.verify_parity;

    let output = run_blocking(move || {
        let _guard = span.enter();
        let model = build(&normalize_bytes(&body));
        let output = render(&model, &sheet, format, page)?;

        if verify {
            let other = match format {
                OutputFormat::Pdf => OutputFormat::Docx,
                OutputFormat::Docx => OutputFormat::Pdf,
            };
            let counterpart = render(&model, &sheet, other, page)?;
            let (pdf, docx) = match format {
                OutputFormat::Pdf => (&output.bytes, &counterpart.bytes),
                OutputFormat::Docx => (&counterpart.bytes, &output.bytes),
            };
            match check_parity(pdf, docx)? {
                Parity::Identical { units } => info!(units, "text parity verified"),
                Parity::Mismatch { index, pdf, docx } => {
                    warn!(index, ?pdf, ?docx, "pdf and docx text differ")
                }
            }
        }

        info!(bytes = output.bytes.len(), blocks = model.blocks.len(), "render complete");
        Ok(output)
    })
    .await?;

    Response::builder()
        .header(header::CONTENT_TYPE, output.mime_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"resume.{}\"", output.file_extension()),
        )
        .header(RENDER_ID_HEADER, render_id.to_string())
        .body(Body::from(output.bytes))
        .map_err(|e| AppError::Internal(e.into()))
}
