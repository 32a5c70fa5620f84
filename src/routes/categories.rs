use axum::Json;

use crate::auth::AuthenticatedUser;
use crate::categories::{self, Category};

pub async fn list_categories(_user: AuthenticatedUser) -> Json<&'static [Category]> {
    Json(categories::all())
}
