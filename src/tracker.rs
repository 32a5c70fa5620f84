//! Submission matrix: which faculty members have submitted which document
//! categories for a given semester and academic year.
//!
//! The computation is a pure read over file facts loaded by the route layer.
//! Cells attribute files to their uploader; a category counts as submitted
//! for a faculty member only if they uploaded at least one live file in it.
//! Percentages round half away from zero.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::categories::Category;

#[derive(Debug, Clone)]
pub struct FacultyRef {
    pub id: Uuid,
    pub display_name: String,
}

/// One non-deleted file relevant to the filter period, reduced to the fields
/// the matrix needs.
#[derive(Debug, Clone)]
pub struct FileFact {
    pub uploaded_by: Uuid,
    pub category: String,
    pub size_bytes: i64,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct MatrixCell {
    pub has_files: bool,
    pub file_count: i64,
    pub total_size: i64,
    pub latest_upload_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct FacultyRow {
    pub faculty_id: Uuid,
    pub display_name: String,
    pub cells: Vec<MatrixCell>,
    pub submitted_count: usize,
    pub completion_percent: i32,
}

#[derive(Debug, Serialize)]
pub struct Matrix {
    pub categories: Vec<&'static Category>,
    pub rows: Vec<FacultyRow>,
    pub faculty_count: usize,
    pub complete_faculty: usize,
    pub submitted_cells: usize,
    pub total_cells: usize,
    pub overall_percent: i32,
}

pub fn compute_matrix(
    faculty: &[FacultyRef],
    categories: &[&'static Category],
    facts: &[FileFact],
) -> Matrix {
    let mut cells: HashMap<(Uuid, &str), MatrixCell> = HashMap::new();
    for fact in facts {
        let Some(category) = categories
            .iter()
            .find(|category| category.key == fact.category)
        else {
            continue;
        };
        let cell = cells
            .entry((fact.uploaded_by, category.key))
            .or_default();
        cell.has_files = true;
        cell.file_count += 1;
        cell.total_size += fact.size_bytes;
        cell.latest_upload_at = match cell.latest_upload_at {
            Some(existing) if existing >= fact.uploaded_at => Some(existing),
            _ => Some(fact.uploaded_at),
        };
    }

    let mut rows = Vec::with_capacity(faculty.len());
    let mut submitted_cells = 0usize;
    let mut complete_faculty = 0usize;

    for member in faculty {
        let row_cells: Vec<MatrixCell> = categories
            .iter()
            .map(|category| {
                cells
                    .remove(&(member.id, category.key))
                    .unwrap_or_default()
            })
            .collect();

        let submitted_count = row_cells.iter().filter(|cell| cell.has_files).count();
        submitted_cells += submitted_count;
        if !categories.is_empty() && submitted_count == categories.len() {
            complete_faculty += 1;
        }

        rows.push(FacultyRow {
            faculty_id: member.id,
            display_name: member.display_name.clone(),
            submitted_count,
            completion_percent: percent(submitted_count, categories.len()),
            cells: row_cells,
        });
    }

    let total_cells = faculty.len() * categories.len();

    Matrix {
        categories: categories.to_vec(),
        faculty_count: faculty.len(),
        complete_faculty,
        submitted_cells,
        total_cells,
        overall_percent: percent(submitted_cells, total_cells),
        rows,
    }
}

/// Integer percentage, rounding half away from zero; an empty denominator
/// yields 0 rather than a division error.
fn percent(part: usize, whole: usize) -> i32 {
    if whole == 0 {
        return 0;
    }
    // 0.5 rounds up: f64::round rounds half away from zero.
    ((part as f64 / whole as f64) * 100.0).round() as i32
}
