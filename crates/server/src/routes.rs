//! Router, shared state and the render pipeline behind both endpoints

use crate::config::Config;
use crate::convert::{ChromiumConverter, HtmlToPdf};
use crate::error::ApiError;
use crate::request::RenderRequest;
use crate::response::pdf_response;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use pdf_core::FontRegistry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use template::{
    html, record_from_data, record_renderer, resolve_payload, RenderFont, TemplateError,
    TemplateKind,
};

/// State shared by all requests
#[derive(Clone)]
pub struct AppState {
    pub fonts: Arc<FontRegistry>,
    pub template_dir: PathBuf,
    pub allow_font_fallback: bool,
    pub converter: Option<Arc<dyn HtmlToPdf>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fonts: Arc::new(FontRegistry::new(&config.font_dir)),
            template_dir: config.template_dir.clone(),
            allow_font_fallback: config.allow_font_fallback,
            converter: config
                .chromium
                .as_ref()
                .map(|path| Arc::new(ChromiumConverter::new(path)) as Arc<dyn HtmlToPdf>),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/pdf", post(render_post).get(render_get))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn render_post(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request = RenderRequest::from_body(&body)?;
    respond(state, request).await
}

async fn render_get(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let request = RenderRequest::from_query(&params)?;
    respond(state, request).await
}

async fn respond(state: AppState, request: RenderRequest) -> Result<Response, ApiError> {
    let started = Instant::now();
    let doc_type = request.doc_type;
    let template_key = request.template.clone();
    let name = request.display_name().to_string();

    let result = tokio::task::spawn_blocking(move || render(&state, &request))
        .await
        .map_err(|e| ApiError::Generation(format!("render task failed: {e}")))
        .and_then(|result| result);

    match result {
        Ok(bytes) => {
            log::info!(
                "rendered {} ({}) in {} ms, {} bytes",
                doc_type.as_str(),
                template_key,
                started.elapsed().as_millis(),
                bytes.len()
            );
            Ok(pdf_response(bytes, &name, doc_type))
        }
        Err(ApiError::Generation(detail)) => {
            log::error!(
                "render failed (type={}, template={}): {detail}",
                doc_type.as_str(),
                template_key
            );
            Err(ApiError::Generation(detail))
        }
        Err(e) => {
            log::warn!(
                "render rejected (type={}, template={}): {e}",
                doc_type.as_str(),
                template_key
            );
            Err(e)
        }
    }
}

/// Run one request to completion; blocking
pub fn render(state: &AppState, request: &RenderRequest) -> Result<Vec<u8>, ApiError> {
    let kind = TemplateKind::parse(&request.template)?;

    match kind {
        TemplateKind::Html => render_html(state, request),
        kind => {
            let record = record_from_data(&request.data, request.doc_type)?;
            let font = RenderFont::from_registry(&state.fonts, state.allow_font_fallback)?;
            let renderer = record_renderer(kind, font)
                .ok_or_else(|| ApiError::UnsupportedTemplate(request.template.clone()))?;
            Ok(renderer.render(&record)?)
        }
    }
}

fn render_html(state: &AppState, request: &RenderRequest) -> Result<Vec<u8>, ApiError> {
    let converter = state.converter.as_ref().ok_or_else(|| {
        ApiError::UnsupportedTemplate(format!("{} (no HTML converter configured)", request.template))
    })?;

    let form = resolve_payload(&request.data)?;
    let path = html::template_path(&state.template_dir, request.doc_type);
    let template_html = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TemplateError::TemplateNotFound(path.display().to_string()),
        _ => TemplateError::Io(e),
    })?;

    let today = chrono::Local::now().date_naive();
    let context = html::context_for(&form, request.doc_type, today);
    let document = html::wrap_document(&html::merge(&template_html, &context));
    Ok(converter.convert(&document)?)
}
