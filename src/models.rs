use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = departments)]
pub struct Department {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = departments)]
pub struct NewDepartment {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = users)]
#[diesel(belongs_to(Department, foreign_key = department_id))]
pub struct User {
    pub id: Uuid,
    pub department_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub employee_id: Option<String>,
    pub position: Option<String>,
    pub is_approved: bool,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub department_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub employee_id: Option<String>,
    pub position: Option<String>,
    pub is_approved: bool,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = folders)]
#[diesel(belongs_to(Department, foreign_key = department_id))]
pub struct Folder {
    pub id: Uuid,
    pub department_id: Uuid,
    pub category: Option<String>,
    pub name: String,
    pub path: String,
    pub academic_year: String,
    pub semester: String,
    pub file_count: i32,
    pub total_size: i64,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = folders)]
pub struct NewFolder {
    pub id: Uuid,
    pub department_id: Uuid,
    pub category: Option<String>,
    pub name: String,
    pub path: String,
    pub academic_year: String,
    pub semester: String,
    pub file_count: i32,
    pub total_size: i64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = files)]
#[diesel(belongs_to(Folder, foreign_key = folder_id))]
pub struct StoredFile {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub uploaded_by: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub extension: String,
    pub content_hash: String,
    pub academic_year: String,
    pub semester: String,
    pub description: Option<String>,
    pub tags: serde_json::Value,
    pub download_count: i32,
    pub is_favorite: bool,
    pub is_deleted: bool,
    pub uploaded_at: NaiveDateTime,
    pub last_downloaded_at: Option<NaiveDateTime>,
}

impl StoredFile {
    /// Tags live as a JSON array in the database; the domain type is an
    /// ordered list of strings.
    pub fn tag_list(&self) -> Vec<String> {
        tags_from_value(&self.tags)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = files)]
pub struct NewStoredFile {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub uploaded_by: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub extension: String,
    pub content_hash: String,
    pub academic_year: String,
    pub semester: String,
    pub description: Option<String>,
    pub tags: serde_json::Value,
}

pub fn tags_to_value(tags: &[String]) -> serde_json::Value {
    serde_json::Value::Array(
        tags.iter()
            .map(|tag| serde_json::Value::String(tag.clone()))
            .collect(),
    )
}

pub fn tags_from_value(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}
