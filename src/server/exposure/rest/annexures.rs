//! Annexure generation and download, mounted directly under `/api`

use crate::core::cleanup::Cleanup;
use crate::core::document::ANNEXURE_TEMPLATE;
use crate::core::error::{EntityError, EstateResult};
use crate::core::validation::Validated;
use crate::entities::{Annexure, AnnexureRequest};
use crate::server::host::ServerHost;
use super::response::{attachment, parse_id};
use axum::{
    Router,
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;

/// Header carrying the id of the persisted annexure record
pub const ANNEXURE_ID_HEADER: &str = "x-annexure-id";

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/generate-annexure", post(generate_annexure))
        .route("/download/{id}", get(download_annexure))
}

/// Render, store and record an annexure, answering with the PDF itself.
///
/// The stored file is removed again when the record cannot be written.
async fn generate_annexure(
    State(host): State<Arc<ServerHost>>,
    Validated(request): Validated<AnnexureRequest>,
) -> EstateResult<Response> {
    let document = host
        .generator
        .generate(&ANNEXURE_TEMPLATE, &request.template_data())
        .await?;

    let mut cleanup = Cleanup::new(
        host.files.clone(),
        format!("annexure for {}", request.investor_id),
    );
    let pdf_path = document.stored_path.clone().unwrap_or_default();
    if !pdf_path.is_empty() {
        cleanup.on_failure(pdf_path.clone());
    }

    // The insert may commit after the client goes away; keep the PDF in that case
    let annexures = host.stores.annexures.clone();
    let record = Annexure::from_rendered(&document.data, pdf_path);
    let annexure = cleanup
        .finish_detached(async move { annexures.create(record).await })
        .await?;

    tracing::info!(
        id = %annexure.id,
        investor = %annexure.investor_id,
        file = %document.suggested_file_name,
        "annexure generated"
    );

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                attachment(&document.suggested_file_name),
            ),
            (
                axum::http::HeaderName::from_static(ANNEXURE_ID_HEADER),
                annexure.id.to_string(),
            ),
        ],
        document.bytes,
    )
        .into_response())
}

async fn download_annexure(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Response> {
    let id = parse_id(&id)?;
    let annexure = host
        .stores
        .annexures
        .find_by_id(&id)
        .await?
        .ok_or_else(|| EntityError::not_found("annexure", id))?;

    let bytes = host.files.read(&annexure.pdf_path).await.map_err(|e| {
        tracing::warn!(id = %id, path = %annexure.pdf_path, error = %e, "annexure file missing");
        EntityError::not_found("annexure file", id)
    })?;

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                attachment(&annexure.download_file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}
