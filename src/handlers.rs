use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    AppState, auth, catalog,
    errors::AppError,
    models::{
        DeleteRequest, ImageMeta, ImagesResponse, LoginRequest, LoginResponse, MessageResponse,
        ReorderRequest, UploadResponse,
    },
};

/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password = body.password.unwrap_or_default();
    if password.is_empty() {
        return Err(AppError::InvalidInput("Password is required".to_string()));
    }

    if !auth::verify_secret(&password, &state.config.admin_password) {
        tracing::warn!("login attempt with incorrect password");
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    let cookie = auth::credential_cookie(
        &state.config.admin_password,
        state.config.credential_ttl_secs,
    );
    tracing::info!("admin login successful");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
        }),
    ))
}

/// GET /api/test — reachable only through the auth middleware, so arriving
/// here means the credential checked out.
pub async fn check_auth() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true }))
}

/// GET /api/images
pub async fn list_images(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImagesResponse>, AppError> {
    let images = state.catalog.list_images().await?;
    tracing::debug!(count = images.len(), "catalog listed");
    Ok(Json(ImagesResponse { images }))
}

/// GET /api/images/{key} — serves the image bytes directly, for deployments
/// where the bucket has no public address.
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let (data, content_type) = state.catalog.fetch_image(&key).await?;
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("failed to build image response: {e}")))?;

    Ok(response)
}

/// POST /api/upload
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut image_filename: Option<String> = None;
    let mut image_content_type: Option<String> = None;
    let mut metadata = ImageMeta::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "image" => {
                image_filename = field.file_name().map(|s| s.to_string());
                image_content_type = field.content_type().map(|m| m.to_string());
                image_data = Some(field.bytes().await?.to_vec());
            }
            "title" => metadata.title = non_empty(field.text().await?),
            "date" => metadata.date = non_empty(field.text().await?),
            "location" => metadata.location = non_empty(field.text().await?),
            "description" => metadata.description = non_empty(field.text().await?),
            "photographer" => metadata.photographer = non_empty(field.text().await?),
            other => tracing::debug!(field = %other, "ignoring unknown multipart field"),
        }
    }

    let image_data = image_data.ok_or_else(|| AppError::MissingFormField("image".to_string()))?;
    if image_data.is_empty() {
        return Err(AppError::InvalidInput(
            "image data cannot be empty".to_string(),
        ));
    }
    // Rejected before any store write
    if image_data.len() > state.config.max_upload_bytes {
        return Err(AppError::PayloadTooLarge(state.config.max_upload_bytes));
    }

    let image = state
        .catalog
        .store_image(
            image_filename.as_deref(),
            image_data,
            image_content_type,
            metadata,
        )
        .await?;

    tracing::info!(key = %image.key, "image uploaded");
    Ok(Json(UploadResponse {
        image_url: image.url,
    }))
}

/// POST /api/reorder
pub async fn reorder_images(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.catalog.save_order(body.images).await?;
    Ok(Json(MessageResponse {
        message: "Order saved".to_string(),
    }))
}

/// DELETE /api/images
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeleteRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let key = body.key.trim();
    if key.is_empty() {
        return Err(AppError::InvalidInput("Key is required".to_string()));
    }
    if key.starts_with(catalog::RESERVED_PREFIX) {
        return Err(AppError::InvalidInput(
            "Key is not a gallery image".to_string(),
        ));
    }

    state.catalog.delete_image(key).await?;
    Ok(Json(MessageResponse {
        message: "Image deleted".to_string(),
    }))
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
