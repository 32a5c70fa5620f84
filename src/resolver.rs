//! Folder resolution: every (department, category, academic year, semester)
//! bucket maps to exactly one non-deleted folder, created lazily on first
//! use.

use diesel::{prelude::*, result::DatabaseErrorKind, PgConnection};
use tracing::{debug, info};
use uuid::Uuid;

use crate::academic::{AcademicYear, FolderKey, Semester};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Folder, NewFolder};
use crate::schema::folders;

#[derive(Debug, Clone)]
pub struct ResolveFolder<'a> {
    pub department_id: Uuid,
    pub category: Option<&'a str>,
    pub academic_year: AcademicYear,
    pub semester: Semester,
}

/// Resolves the folder for the given bucket, inserting it if absent.
/// Idempotent: repeated calls with identical inputs return the same id.
/// Callers may only resolve folders in their own department.
pub fn resolve_or_create_folder(
    conn: &mut PgConnection,
    request: &ResolveFolder<'_>,
    actor: &AuthenticatedUser,
) -> AppResult<Uuid> {
    if request.department_id != actor.department_id {
        return Err(AppError::forbidden());
    }

    let key = FolderKey::new(
        request.department_id,
        request.category,
        request.academic_year,
        request.semester,
    );

    if let Some(existing) = lookup_folder(conn, &key)? {
        debug!(folder_id = %existing, name = %key.name, "resolved existing folder");
        return Ok(existing);
    }

    let new_folder = NewFolder {
        id: Uuid::new_v4(),
        department_id: key.department_id,
        category: key.category.clone(),
        name: key.name.clone(),
        path: key.storage_prefix(request.academic_year, request.semester),
        academic_year: request.academic_year.to_string(),
        semester: request.semester.as_str().to_string(),
        file_count: 0,
        total_size: 0,
    };

    // The insert gets its own nested transaction: when the caller already
    // holds one, diesel issues a SAVEPOINT, so a unique violation rolls back
    // to it instead of aborting the outer transaction.
    let inserted = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
        diesel::insert_into(folders::table)
            .values(&new_folder)
            .execute(conn)
    });

    match inserted {
        Ok(_) => {
            info!(folder_id = %new_folder.id, name = %key.name, "created folder");
            Ok(new_folder.id)
        }
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            // A concurrent first upload won the unique index race; adopt the
            // winner's id.
            lookup_folder(conn, &key)?.ok_or_else(|| {
                AppError::internal(format!("folder '{}' vanished after unique conflict", key.name))
            })
        }
        Err(err) => Err(AppError::from(err)),
    }
}

fn lookup_folder(conn: &mut PgConnection, key: &FolderKey) -> AppResult<Option<Uuid>> {
    let query = folders::table
        .filter(folders::department_id.eq(key.department_id))
        .filter(folders::name.eq(&key.name))
        .filter(folders::is_deleted.eq(false))
        .select(folders::id);

    let found = if let Some(category) = key.category.as_deref() {
        query
            .filter(folders::category.eq(category))
            .first::<Uuid>(conn)
            .optional()?
    } else {
        query
            .filter(folders::category.is_null())
            .first::<Uuid>(conn)
            .optional()?
    };

    Ok(found)
}

/// Recomputes a folder's live file count and total size from the files
/// table; counters are derived, never incremented.
pub fn recompute_folder_counters(conn: &mut PgConnection, folder_id: Uuid) -> AppResult<()> {
    use crate::schema::files;

    let sizes: Vec<i64> = files::table
        .filter(files::folder_id.eq(folder_id))
        .filter(files::is_deleted.eq(false))
        .select(files::size_bytes)
        .load(conn)?;

    let file_count = sizes.len() as i32;
    let total_size: i64 = sizes.iter().sum();

    diesel::update(folders::table.find(folder_id))
        .set((
            folders::file_count.eq(file_count),
            folders::total_size.eq(total_size),
            folders::updated_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    Ok(())
}

pub fn load_owned_folder(
    conn: &mut PgConnection,
    folder_id: Uuid,
    actor: &AuthenticatedUser,
) -> AppResult<Folder> {
    let folder: Folder = folders::table
        .find(folder_id)
        .filter(folders::is_deleted.eq(false))
        .first(conn)?;

    if folder.department_id != actor.department_id {
        return Err(AppError::forbidden());
    }

    Ok(folder)
}
