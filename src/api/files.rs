use axum::{
    extract::{Multipart, Query, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::services::FileService;

pub fn routes() -> Router<AppState> {
    Router::new().route("/photos", post(upload_photo))
}

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct UploadPhotoQuery {
    pub folder: Option<String>,
}

/// Загрузка фото счётчика или торговой точки
#[utoipa::path(
    post,
    path = "/api/v1/files/photos",
    tag = "files",
    security(("bearer_auth" = [])),
    params(
        ("folder" = Option<String>, Query, description = "Папка: readings или shops")
    ),
    responses(
        (status = 200, description = "Фото загружено"),
        (status = 400, description = "Неверный файл"),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn upload_photo(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<UploadPhotoQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let folder = query.folder.unwrap_or_else(|| "readings".to_string());
    if folder != "readings" && folder != "shops" {
        return Err(AppError::BadRequest(
            "Допустимые папки: readings, shops".to_string(),
        ));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::File(e.to_string()))?
        .ok_or_else(|| AppError::BadRequest("Файл не передан".to_string()))?;

    let file_name = field.file_name().unwrap_or("photo.jpg").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::File(e.to_string()))?
        .to_vec();

    if data.is_empty() {
        return Err(AppError::BadRequest("Пустой файл".to_string()));
    }

    let file_service = FileService::new(&state.config).await?;
    let url = file_service
        .upload_photo(&folder, &file_name, &content_type, data)
        .await?;

    Ok(Json(json!({
        "success": true,
        "url": url
    })))
}
