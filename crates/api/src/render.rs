//! Client for the external HTML-to-PDF renderer.
//!
//! The renderer is an optional sidecar service; when `RENDERER_URL` is not
//! configured, offers are emitted as HTML only.

use serde_json::json;

use crate::error::AppError;

/// POST the rendered HTML to the renderer and return the PDF bytes.
pub async fn render_pdf(
    http: &reqwest::Client,
    renderer_url: &str,
    html: &str,
) -> Result<Vec<u8>, AppError> {
    let response = http
        .post(renderer_url)
        .json(&json!({ "html": html }))
        .send()
        .await
        .map_err(|e| AppError::Renderer(format!("Renderer unreachable: {e}")))?;

    if !response.status().is_success() {
        return Err(AppError::Renderer(format!(
            "Renderer returned status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Renderer(format!("Renderer response read failed: {e}")))?;
    Ok(bytes.to_vec())
}
