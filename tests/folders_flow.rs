mod common;

use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use deptdocs::academic::{AcademicYear, Semester};
use deptdocs::auth::AuthenticatedUser;
use deptdocs::error::AppError;
use deptdocs::resolver::{resolve_or_create_folder, ResolveFolder};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
struct ResolveFolderPayload<'a> {
    department: Uuid,
    category: Option<&'a str>,
    academic_year: &'a str,
    semester: &'a str,
}

#[derive(Deserialize)]
struct ResolveResponse {
    folder_id: Uuid,
}

#[tokio::test]
async fn resolving_the_same_bucket_twice_returns_one_folder() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    let dept = app.insert_department("CS", "Computer Science").await?;
    app.insert_user("alice", "secret-pass", dept).await?;
    let token = app.login_token("alice", "secret-pass").await?;

    let payload = ResolveFolderPayload {
        department: dept,
        category: Some("workload"),
        academic_year: "2024-2025",
        semester: "first",
    };

    let first = app
        .post_json("/api/folders/resolve", &payload, Some(&token))
        .await?;
    assert_eq!(first.status(), StatusCode::OK);
    let first: ResolveResponse = serde_json::from_slice(&body_to_vec(first.into_body()).await?)?;

    let second = app
        .post_json("/api/folders/resolve", &payload, Some(&token))
        .await?;
    assert_eq!(second.status(), StatusCode::OK);
    let second: ResolveResponse = serde_json::from_slice(&body_to_vec(second.into_body()).await?)?;

    assert_eq!(first.folder_id, second.folder_id);
    assert_eq!(app.count_folders().await?, 1);
    Ok(())
}

#[tokio::test]
async fn malformed_academic_years_create_nothing() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    let dept = app.insert_department("CS", "Computer Science").await?;
    app.insert_user("alice", "secret-pass", dept).await?;
    let token = app.login_token("alice", "secret-pass").await?;

    for year in ["2024-2026", "2024", "abcd-efgh"] {
        let response = app
            .post_json(
                "/api/folders/resolve",
                &ResolveFolderPayload {
                    department: dept,
                    category: Some("workload"),
                    academic_year: year,
                    semester: "first",
                },
                Some(&token),
            )
            .await?;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "year '{year}' should be rejected"
        );
    }

    assert_eq!(app.count_folders().await?, 0);
    Ok(())
}

#[tokio::test]
async fn unknown_semester_is_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    let dept = app.insert_department("CS", "Computer Science").await?;
    app.insert_user("alice", "secret-pass", dept).await?;
    let token = app.login_token("alice", "secret-pass").await?;

    let response = app
        .post_json(
            "/api/folders/resolve",
            &ResolveFolderPayload {
                department: dept,
                category: Some("workload"),
                academic_year: "2024-2025",
                semester: "summer",
            },
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.count_folders().await?, 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_first_uploads_converge_on_one_folder() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    let dept = app.insert_department("CS", "Computer Science").await?;
    let user_id = app.insert_user("alice", "secret-pass", dept).await?;
    let actor = AuthenticatedUser {
        user_id,
        username: "alice".to_string(),
        department_id: dept,
        role: "faculty".to_string(),
    };
    let year: AcademicYear = "2024-2025".parse().unwrap();

    let request = move || ResolveFolder {
        department_id: dept,
        category: Some("workload"),
        academic_year: year,
        semester: Semester::First,
    };

    // The winner resolves the folder and holds its transaction open; the
    // loser's insert then blocks on the unique index until the winner
    // commits, takes the violation inside an already-open transaction, and
    // must still come back with the winner's id.
    let winner_actor = actor.clone();
    let winner = app.with_conn(move |conn| {
        conn.transaction::<Uuid, AppError, _>(|conn| {
            let id = resolve_or_create_folder(conn, &request(), &winner_actor)?;
            std::thread::sleep(Duration::from_millis(300));
            Ok(id)
        })
        .map_err(|err| anyhow!("winner resolve failed with status {}", err.status()))
    });

    let loser = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let loser_actor = actor.clone();
        app.with_conn(move |conn| {
            conn.transaction::<Uuid, AppError, _>(|conn| {
                resolve_or_create_folder(conn, &request(), &loser_actor)
            })
            .map_err(|err| anyhow!("loser resolve failed with status {}", err.status()))
        })
        .await
    };

    let (winner, loser) = tokio::join!(winner, loser);
    assert_eq!(winner?, loser?);
    assert_eq!(app.count_folders().await?, 1);
    Ok(())
}

#[tokio::test]
async fn cannot_resolve_folders_in_another_department() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    let own_dept = app.insert_department("CS", "Computer Science").await?;
    let other_dept = app.insert_department("MATH", "Mathematics").await?;
    app.insert_user("alice", "secret-pass", own_dept).await?;
    let token = app.login_token("alice", "secret-pass").await?;

    let response = app
        .post_json(
            "/api/folders/resolve",
            &ResolveFolderPayload {
                department: other_dept,
                category: Some("workload"),
                academic_year: "2024-2025",
                semester: "first",
            },
            Some(&token),
        )
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    // Rejected requests must leave no trace.
    assert_eq!(app.count_folders().await?, 0);
    Ok(())
}
