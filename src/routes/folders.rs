use axum::extract::{Json, Path, State};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::academic::{AcademicYear, Semester};
use crate::auth::AuthenticatedUser;
use crate::categories;
use crate::error::{AppError, AppResult};
use crate::models::StoredFile;
use crate::resolver::{load_owned_folder, resolve_or_create_folder, ResolveFolder};
use crate::schema::files;
use crate::state::AppState;

use super::files::{to_file_response, FileResponse};

#[derive(Deserialize)]
pub struct ResolveFolderRequest {
    pub department: Uuid,
    pub category: Option<String>,
    pub academic_year: String,
    pub semester: String,
}

#[derive(Serialize)]
pub struct ResolveFolderResponse {
    pub folder_id: Uuid,
}

#[derive(Serialize)]
pub struct FolderFilesResponse {
    pub folder_id: Uuid,
    pub name: String,
    pub file_count: i32,
    pub total_size: i64,
    pub files: Vec<FileResponse>,
}

pub async fn resolve_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ResolveFolderRequest>,
) -> AppResult<Json<ResolveFolderResponse>> {
    let academic_year: AcademicYear = payload
        .academic_year
        .parse()
        .map_err(|err: crate::academic::PeriodError| AppError::validation(err.to_string()))?;
    let semester: Semester = payload
        .semester
        .parse()
        .map_err(|err: crate::academic::PeriodError| AppError::validation(err.to_string()))?;

    if let Some(category) = payload.category.as_deref() {
        if !categories::is_known(category) {
            return Err(AppError::validation(format!(
                "unknown category '{category}'"
            )));
        }
    }

    let mut conn = state.db()?;
    let folder_id = resolve_or_create_folder(
        &mut conn,
        &ResolveFolder {
            department_id: payload.department,
            category: payload.category.as_deref(),
            academic_year,
            semester,
        },
        &user,
    )?;

    Ok(Json(ResolveFolderResponse { folder_id }))
}

pub async fn list_folder_files(
    State(state): State<AppState>,
    Path(folder_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<FolderFilesResponse>> {
    let mut conn = state.db()?;

    let folder = load_owned_folder(&mut conn, folder_id, &user)?;

    let rows: Vec<StoredFile> = files::table
        .filter(files::folder_id.eq(folder_id))
        .filter(files::is_deleted.eq(false))
        .order(files::uploaded_at.desc())
        .load(&mut conn)?;

    Ok(Json(FolderFilesResponse {
        folder_id: folder.id,
        name: folder.name,
        file_count: folder.file_count,
        total_size: folder.total_size,
        files: rows.into_iter().map(to_file_response).collect(),
    }))
}
