//! Batch upload ingestion. Batch-level problems reject the whole request;
//! per-file problems skip that file and surface as warnings.

use diesel::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::academic::{AcademicYear, Semester};
use crate::auth::AuthenticatedUser;
use crate::categories;
use crate::error::{AppError, AppResult};
use crate::models::{tags_to_value, NewStoredFile};
use crate::resolver::{recompute_folder_counters, resolve_or_create_folder, ResolveFolder};
use crate::schema::{files, folders};
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug)]
pub struct IncomingFile {
    pub original_name: String,
    pub declared_mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct UploadBatch {
    pub department_id: Uuid,
    pub category: String,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub files: Vec<IncomingFile>,
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
pub struct IngestOutcome {
    pub uploaded: Vec<UploadedFile>,
    pub warnings: Vec<String>,
}

pub async fn ingest(
    state: &AppState,
    mut batch: UploadBatch,
    actor: &AuthenticatedUser,
) -> AppResult<IngestOutcome> {
    if batch.department_id != actor.department_id {
        return Err(AppError::forbidden());
    }

    if !categories::is_known(&batch.category) {
        return Err(AppError::validation(format!(
            "unknown category '{}'",
            batch.category
        )));
    }

    if batch.files.is_empty() {
        return Err(AppError::validation("no files provided"));
    }

    let incoming = std::mem::take(&mut batch.files);
    let mut uploaded = Vec::new();
    let mut warnings = Vec::new();
    // Resolved lazily; a batch that stores nothing creates no folder.
    let mut folder_id: Option<Uuid> = None;

    for file in incoming {
        if exceeds_size_limit(file.bytes.len() as u64) {
            warnings.push(format!("File too large: {}", file.original_name));
            continue;
        }

        let content_hash = hex::encode(Sha256::digest(&file.bytes));

        let existing_name = {
            let mut conn = state.db()?;
            duplicate_in_scope(
                &mut conn,
                batch.department_id,
                &batch.category,
                batch.academic_year,
                batch.semester,
                &content_hash,
            )?
        };

        if let Some(existing) = existing_name {
            info!(
                original_name = %file.original_name,
                content_hash = %content_hash,
                "skipping duplicate upload"
            );
            warnings.push(format!(
                "Duplicate file: {} (already exists as {existing})",
                file.original_name
            ));
            continue;
        }

        let extension = file_extension(&file.original_name);
        let mime_type = detect_mime(&file.bytes, &file.original_name);
        if let Some(declared) = file.declared_mime.as_deref() {
            if declared != mime_type {
                tracing::debug!(
                    original_name = %file.original_name,
                    declared,
                    detected = %mime_type,
                    "declared content type overridden by content sniffing"
                );
            }
        }
        let file_id = Uuid::new_v4();
        let stored_name = if extension.is_empty() {
            file_id.to_string()
        } else {
            format!("{file_id}.{extension}")
        };
        let storage_key = format!(
            "departments/{}/{}/{}/{}/{}",
            batch.department_id, batch.category, batch.semester, batch.academic_year, stored_name,
        );

        if let Err(err) = state.storage.write(&storage_key, &file.bytes).await {
            warn!(
                original_name = %file.original_name,
                error = %err,
                "storage write failed, skipping file"
            );
            warnings.push(format!("Failed to store file: {}", file.original_name));
            continue;
        }

        let size_bytes = file.bytes.len() as i64;
        let record = NewStoredFile {
            id: file_id,
            folder_id: Uuid::nil(), // assigned inside the transaction
            uploaded_by: actor.user_id,
            original_name: file.original_name.clone(),
            stored_name: stored_name.clone(),
            size_bytes,
            mime_type: mime_type.clone(),
            extension,
            content_hash,
            academic_year: batch.academic_year.to_string(),
            semester: batch.semester.as_str().to_string(),
            description: batch.description.clone(),
            tags: tags_to_value(&batch.tags),
        };

        let insert_result = {
            let mut conn = state.db()?;
            insert_file(
                &mut conn,
                record,
                &mut folder_id,
                &batch,
                actor,
            )
        };

        match insert_result {
            Ok(target_folder) => {
                info!(
                    file_id = %file_id,
                    folder_id = %target_folder,
                    original_name = %file.original_name,
                    size_bytes,
                    "file ingested"
                );
                uploaded.push(UploadedFile {
                    id: file_id,
                    folder_id: target_folder,
                    original_name: file.original_name,
                    stored_name,
                    size_bytes,
                    mime_type,
                });
            }
            Err(err) => {
                // No orphaned object after a failed insert.
                if let Err(cleanup) = state.storage.remove(&storage_key).await {
                    warn!(key = %storage_key, error = %cleanup, "failed to clean up storage after insert error");
                }
                return Err(err);
            }
        }
    }

    Ok(IngestOutcome { uploaded, warnings })
}

/// Folder resolution and row insertion share one transaction per file.
fn insert_file(
    conn: &mut PgConnection,
    mut record: NewStoredFile,
    folder_id: &mut Option<Uuid>,
    batch: &UploadBatch,
    actor: &AuthenticatedUser,
) -> AppResult<Uuid> {
    conn.transaction::<Uuid, AppError, _>(|conn| {
        let target_folder = match *folder_id {
            Some(id) => id,
            None => {
                let resolved = resolve_or_create_folder(
                    conn,
                    &ResolveFolder {
                        department_id: batch.department_id,
                        category: Some(&batch.category),
                        academic_year: batch.academic_year,
                        semester: batch.semester,
                    },
                    actor,
                )?;
                *folder_id = Some(resolved);
                resolved
            }
        };

        record.folder_id = target_folder;
        diesel::insert_into(files::table)
            .values(&record)
            .execute(conn)?;

        recompute_folder_counters(conn, target_folder)?;
        Ok(target_folder)
    })
}

/// Duplicate detection is scoped per (department, category, year, semester)
/// bucket, not global.
fn duplicate_in_scope(
    conn: &mut PgConnection,
    department_id: Uuid,
    category: &str,
    academic_year: AcademicYear,
    semester: Semester,
    content_hash: &str,
) -> AppResult<Option<String>> {
    let existing: Option<String> = files::table
        .inner_join(folders::table)
        .filter(folders::department_id.eq(department_id))
        .filter(folders::category.eq(category))
        .filter(folders::is_deleted.eq(false))
        .filter(files::academic_year.eq(academic_year.to_string()))
        .filter(files::semester.eq(semester.as_str()))
        .filter(files::content_hash.eq(content_hash))
        .filter(files::is_deleted.eq(false))
        .select(files::original_name)
        .first(conn)
        .optional()?;

    Ok(existing)
}

pub fn exceeds_size_limit(declared_size: u64) -> bool {
    declared_size > MAX_UPLOAD_BYTES
}

pub fn file_extension(original_name: &str) -> String {
    std::path::Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// Derives the MIME type from leading bytes; unrecognized signatures fall
/// back to an extension-based guess.
pub fn detect_mime(bytes: &[u8], original_name: &str) -> String {
    if bytes.starts_with(b"%PDF-") {
        return "application/pdf".to_string();
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return "image/png".to_string();
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg".to_string();
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return "image/gif".to_string();
    }
    if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        // Office Open XML containers are zip archives.
        let guessed = mime_guess::from_path(original_name).first_or_octet_stream();
        if guessed.essence_str().contains("officedocument") {
            return guessed.essence_str().to_string();
        }
        return "application/zip".to_string();
    }

    mime_guess::from_path(original_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
