use axum::extract::{Json, Query, State};

use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::academic::{AcademicYear, Semester};
use crate::auth::AuthenticatedUser;
use crate::categories;
use crate::error::{AppError, AppResult};
use crate::schema::{files, folders, users};
use crate::state::AppState;
use crate::tracker::{compute_matrix, FacultyRef, FileFact, Matrix};

#[derive(Deserialize)]
pub struct MatrixQuery {
    pub semester: String,
    pub academic_year: Option<String>,
}

pub async fn submission_matrix(
    State(state): State<AppState>,
    Query(query): Query<MatrixQuery>,
    user: AuthenticatedUser,
) -> AppResult<Json<Matrix>> {
    let semester: Semester = query
        .semester
        .parse()
        .map_err(|err: crate::academic::PeriodError| AppError::validation(err.to_string()))?;

    let academic_year_raw = query
        .academic_year
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| state.config.current_academic_year.clone());
    let academic_year: AcademicYear = academic_year_raw
        .parse()
        .map_err(|err: crate::academic::PeriodError| AppError::validation(err.to_string()))?;

    let mut conn = state.db()?;

    let faculty: Vec<FacultyRef> = users::table
        .filter(users::department_id.eq(user.department_id))
        .filter(users::is_approved.eq(true))
        .order(users::display_name.asc())
        .select((users::id, users::display_name))
        .load::<(Uuid, String)>(&mut conn)?
        .into_iter()
        .map(|(id, display_name)| FacultyRef { id, display_name })
        .collect();

    let facts: Vec<FileFact> = files::table
        .inner_join(folders::table)
        .filter(folders::department_id.eq(user.department_id))
        .filter(folders::category.is_not_null())
        .filter(folders::is_deleted.eq(false))
        .filter(files::academic_year.eq(academic_year.to_string()))
        .filter(files::semester.eq(semester.as_str()))
        .filter(files::is_deleted.eq(false))
        .select((
            files::uploaded_by,
            folders::category,
            files::size_bytes,
            files::uploaded_at,
        ))
        .load::<(Uuid, Option<String>, i64, chrono::NaiveDateTime)>(&mut conn)?
        .into_iter()
        .filter_map(|(uploaded_by, category, size_bytes, uploaded_at)| {
            category.map(|category| FileFact {
                uploaded_by,
                category,
                size_bytes,
                uploaded_at,
            })
        })
        .collect();

    let columns: Vec<&'static categories::Category> = categories::all().iter().collect();

    Ok(Json(compute_matrix(&faculty, &columns, &facts)))
}
