use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use deptdocs::auth::jwt::JwtService;
use deptdocs::auth::password::hash_password;
use deptdocs::config::AppConfig;
use deptdocs::db::{self, PgPool};
use deptdocs::models::{NewDepartment, NewUser};
use deptdocs::routes;
use deptdocs::state::AppState;
use deptdocs::storage::FileStorage;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[allow(dead_code)]
#[derive(Clone)]
pub struct StoredObject {
    pub key: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
}

#[async_trait]
impl FileStorage for FakeStorage {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let stored = StoredObject {
            key: key.to_string(),
            bytes: bytes.to_vec(),
        };
        let mut guard = self.objects.lock().await;
        guard.insert(stored.key.clone(), stored);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let guard = self.objects.lock().await;
        guard
            .get(key)
            .map(|obj| obj.bytes.clone())
            .ok_or_else(|| anyhow!("object {key} missing"))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.objects.lock().await;
        guard.remove(key);
        Ok(())
    }
}

impl FakeStorage {
    #[allow(dead_code)]
    pub async fn object_count(&self) -> usize {
        let guard = self.objects.lock().await;
        guard.len()
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    storage: Arc<FakeStorage>,
}

impl TestApp {
    /// Returns `None` when TEST_DATABASE_URL is not set so the suite can be
    /// run without a database at hand.
    pub async fn try_new() -> Result<Option<Self>> {
        let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
            return Ok(None);
        };

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            cors_allowed_origin: None,
            storage_root: std::env::temp_dir().join("deptdocs-tests"),
            current_academic_year: "2024-2025".to_string(),
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let storage = Arc::new(FakeStorage::default());
        let storage_for_state: Arc<dyn FileStorage> = storage.clone();
        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool.clone(), config, storage_for_state, jwt);
        let router = routes::create_router(state.clone());

        Ok(Some(Self {
            state,
            router,
            storage,
        }))
    }

    #[allow(dead_code)]
    pub fn storage(&self) -> Arc<FakeStorage> {
        self.storage.clone()
    }

    pub async fn insert_department(&self, code: &str, name: &str) -> Result<Uuid> {
        let code = code.to_string();
        let name = name.to_string();
        self.with_conn(move |conn| {
            let department = NewDepartment {
                id: Uuid::new_v4(),
                code,
                name,
                active: true,
            };
            diesel::insert_into(deptdocs::schema::departments::table)
                .values(&department)
                .execute(conn)
                .context("failed to insert department")?;
            Ok(department.id)
        })
        .await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password: &str,
        department_id: Uuid,
    ) -> Result<Uuid> {
        let username = username.to_string();
        let password = password.to_string();
        self.with_conn(move |conn| {
            let user = NewUser {
                id: Uuid::new_v4(),
                department_id,
                username: username.clone(),
                password_hash: hash_password(&password)?,
                display_name: username,
                employee_id: None,
                position: None,
                is_approved: true,
                role: "faculty".to_string(),
            };
            diesel::insert_into(deptdocs::schema::users::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert user")?;
            Ok(user.id)
        })
        .await
    }

    pub async fn login_token(&self, username: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "/api/auth/login",
                &LoginPayload { username, password },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            access_token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.access_token)
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    /// Builds the multipart batch-upload request the way a browser form
    /// would: scalar fields plus one or more `files[]` parts.
    #[allow(dead_code)]
    pub async fn upload_files(
        &self,
        department: Uuid,
        category: &str,
        academic_year: &str,
        semester: &str,
        files: &[(&str, &str, &[u8])],
        token: &str,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();

        let mut push_field = |name: &str, value: &str, body: &mut Vec<u8>| {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            body.extend(value.as_bytes());
            body.extend(b"\r\n");
        };

        push_field("department", &department.to_string(), &mut body);
        push_field("category", category, &mut body);
        push_field("academic_year", academic_year, &mut body);
        push_field("semester", semester, &mut body);

        for (filename, content_type, data) in files {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!(
                    "Content-Disposition: form-data; name=\"files[]\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
            body.extend(*data);
            body.extend(b"\r\n");
        }

        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/files")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body))?;

        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn count_folders(&self) -> Result<i64> {
        self.with_conn(|conn| {
            use deptdocs::schema::folders::dsl::folders;
            folders
                .count()
                .get_result(conn)
                .context("failed to count folders")
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn count_files(&self) -> Result<i64> {
        self.with_conn(|conn| {
            use deptdocs::schema::files::dsl::files;
            files
                .count()
                .get_result(conn)
                .context("failed to count files")
        })
        .await
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE files, folders, users, departments RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
