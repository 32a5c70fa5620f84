use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::academic::{AcademicYear, Semester};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::ingest::{ingest, IncomingFile, IngestOutcome, UploadBatch};
use crate::models::{Folder, StoredFile};
use crate::resolver::recompute_folder_counters;
use crate::schema::{files, folders};
use crate::state::AppState;

#[derive(Serialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub uploaded_by: Uuid,
    pub original_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub extension: String,
    pub academic_year: String,
    pub semester: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub download_count: i32,
    pub is_favorite: bool,
    pub uploaded_at: String,
    pub last_downloaded_at: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

#[derive(Serialize)]
pub struct FavoriteResponse {
    pub id: Uuid,
    pub is_favorite: bool,
}

pub(super) fn to_iso(value: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(value, Utc).to_rfc3339()
}

pub(super) fn to_file_response(file: StoredFile) -> FileResponse {
    let tags = file.tag_list();
    FileResponse {
        id: file.id,
        folder_id: file.folder_id,
        uploaded_by: file.uploaded_by,
        original_name: file.original_name,
        size_bytes: file.size_bytes,
        mime_type: file.mime_type,
        extension: file.extension,
        academic_year: file.academic_year,
        semester: file.semester,
        description: file.description,
        tags,
        download_count: file.download_count,
        is_favorite: file.is_favorite,
        uploaded_at: to_iso(file.uploaded_at),
        last_downloaded_at: file.last_downloaded_at.map(to_iso),
    }
}

pub async fn upload_files(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let mut department: Option<Uuid> = None;
    let mut category: Option<String> = None;
    let mut academic_year_raw: Option<String> = None;
    let mut semester_raw: Option<String> = None;
    let mut description: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut incoming: Vec<IncomingFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = %err, "invalid multipart data");
        AppError::validation(format!("invalid multipart data: {err}"))
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("files[]") | Some("files") => {
                let original_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| AppError::validation("file entries must carry a filename"))?;
                let declared_mime = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(|err| {
                    error!(error = %err, "failed to read file bytes");
                    AppError::validation(format!("failed to read file bytes: {err}"))
                })?;
                incoming.push(IncomingFile {
                    original_name,
                    declared_mime,
                    bytes: data.to_vec(),
                });
            }
            Some("department") => {
                let value = read_text_field(field).await?;
                department = Some(
                    Uuid::parse_str(value.trim())
                        .map_err(|_| AppError::validation("department must be a valid UUID"))?,
                );
            }
            Some("category") => {
                category = Some(read_text_field(field).await?.trim().to_string());
            }
            Some("academic_year") => {
                let value = read_text_field(field).await?;
                if !value.trim().is_empty() {
                    academic_year_raw = Some(value.trim().to_string());
                }
            }
            Some("semester") => {
                semester_raw = Some(read_text_field(field).await?.trim().to_string());
            }
            Some("description") => {
                let value = read_text_field(field).await?;
                if !value.trim().is_empty() {
                    description = Some(value.trim().to_string());
                }
            }
            Some("tags") => {
                let value = read_text_field(field).await?;
                if !value.trim().is_empty() {
                    tags = serde_json::from_str(&value).map_err(|err| {
                        AppError::validation(format!("tags must be a JSON string array: {err}"))
                    })?;
                }
            }
            _ => {}
        }
    }

    let department =
        department.ok_or_else(|| AppError::validation("department field is required"))?;
    let category = category.ok_or_else(|| AppError::validation("category field is required"))?;
    let semester_raw =
        semester_raw.ok_or_else(|| AppError::validation("semester field is required"))?;

    // A blank academic year falls back to the configured current year.
    let academic_year_raw =
        academic_year_raw.unwrap_or_else(|| state.config.current_academic_year.clone());
    let academic_year: AcademicYear = academic_year_raw
        .parse()
        .map_err(|err: crate::academic::PeriodError| AppError::validation(err.to_string()))?;
    let semester: Semester = semester_raw
        .parse()
        .map_err(|err: crate::academic::PeriodError| AppError::validation(err.to_string()))?;

    let batch = UploadBatch {
        department_id: department,
        category,
        academic_year,
        semester,
        description,
        tags,
        files: incoming,
    };

    let outcome = ingest(&state, batch, &user).await?;
    let message = format!(
        "{} file(s) uploaded, {} skipped",
        outcome.uploaded.len(),
        outcome.warnings.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            message,
            outcome,
        }),
    ))
}

pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let (file, folder) = {
        let mut conn = state.db()?;
        let pair: (StoredFile, Folder) = files::table
            .inner_join(folders::table)
            .filter(files::id.eq(file_id))
            .filter(files::is_deleted.eq(false))
            .select((files::all_columns, folders::all_columns))
            .first(&mut conn)?;

        if pair.1.department_id != user.department_id {
            return Err(AppError::forbidden());
        }

        // Every download counts, including repeats by the same user.
        diesel::update(files::table.find(file_id))
            .set((
                files::download_count.eq(files::download_count + 1),
                files::last_downloaded_at.eq(Some(Utc::now().naive_utc())),
            ))
            .execute(&mut conn)?;

        pair
    };

    let key = format!("{}/{}", folder.path, file.stored_name);
    let bytes = state
        .storage
        .read(&key)
        .await
        .map_err(|err| AppError::internal(format!("failed to read stored file {key}: {err}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&file.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    if let Some(disposition) = attachment_content_disposition(&file.original_name) {
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    Ok((headers, bytes))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    conn.transaction::<(), AppError, _>(|conn| {
        let (file, folder): (StoredFile, Folder) = files::table
            .inner_join(folders::table)
            .filter(files::id.eq(file_id))
            .filter(files::is_deleted.eq(false))
            .select((files::all_columns, folders::all_columns))
            .first(conn)?;

        if folder.department_id != user.department_id {
            return Err(AppError::forbidden());
        }

        diesel::update(files::table.find(file.id))
            .set(files::is_deleted.eq(true))
            .execute(conn)?;

        recompute_folder_counters(conn, folder.id)?;
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<FavoriteResponse>> {
    let mut conn = state.db()?;

    let (file, folder): (StoredFile, Folder) = files::table
        .inner_join(folders::table)
        .filter(files::id.eq(file_id))
        .filter(files::is_deleted.eq(false))
        .select((files::all_columns, folders::all_columns))
        .first(&mut conn)?;

    if folder.department_id != user.department_id {
        return Err(AppError::forbidden());
    }

    let next = !file.is_favorite;
    diesel::update(files::table.find(file.id))
        .set(files::is_favorite.eq(next))
        .execute(&mut conn)?;

    Ok(Json(FavoriteResponse {
        id: file.id,
        is_favorite: next,
    }))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field.text().await.map_err(|err| {
        error!(error = %err, "invalid multipart field");
        AppError::validation(format!("invalid multipart field: {err}"))
    })
}

fn attachment_content_disposition(filename: &str) -> Option<String> {
    if filename.is_empty() {
        return None;
    }

    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            _ => ch,
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    Some(format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    ))
}
