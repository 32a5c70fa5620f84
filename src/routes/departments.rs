use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::AppResult,
    models::Department,
    schema::departments,
    state::AppState,
};

#[derive(Serialize)]
pub struct DepartmentResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

pub async fn list_departments(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<DepartmentResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Department> = departments::table
        .filter(departments::active.eq(true))
        .order(departments::code.asc())
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|department| DepartmentResponse {
                id: department.id,
                code: department.code,
                name: department.name,
            })
            .collect(),
    ))
}
