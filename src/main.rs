pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod repository;
pub mod views;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    routing::{get, post},
    Form, Router,
};
use config::Config;
use db::driver::Db;
use error::AppError;
use maud::Markup;
use models::GridVariant;
use serde::Deserialize;
use tokio::{
    net::TcpListener,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// === App State ===
#[derive(Debug, Clone)]
struct AppState {
    state: Arc<RwLock<Db>>,
    variant: GridVariant,
}
impl AppState {
    fn new(db: Db, variant: GridVariant) -> Self {
        Self {
            state: Arc::new(RwLock::new(db)),
            variant,
        }
    }

    // renders only read
    async fn read(&self) -> RwLockReadGuard<'_, Db> {
        self.state.read().await
    }
    // mutations run one at a time
    async fn write(&self) -> RwLockWriteGuard<'_, Db> {
        self.state.write().await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,todo_crud=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = Db::new_with_path(&config.db_path)?;
    info!(
        db = %db.path().display(),
        variant = ?config.variant,
        "storage ready"
    );
    let app = router(AppState::new(db, config.variant));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
    info!("shutting down");
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/app", get(refresh))
        .route("/todos", post(create_todo))
        .route("/grid", post(edit_grid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// full re-render of the `#app` region from whatever is stored right now
fn render(db: &Db, variant: GridVariant) -> Result<Markup, AppError> {
    let pass = views::render_app(db, variant)?;
    Ok(views::app_html(&pass))
}

// === Routes ===
async fn root(State(state): State<AppState>) -> Result<Markup, AppError> {
    let db = state.read().await;
    Ok(views::page(render(&db, state.variant)?))
}

async fn refresh(State(state): State<AppState>) -> Result<Markup, AppError> {
    let db = state.read().await;
    render(&db, state.variant)
}

#[derive(Deserialize)]
struct CreateTodo {
    #[serde(default)]
    title: String,
}
async fn create_todo(
    State(state): State<AppState>,
    Form(CreateTodo { title }): Form<CreateTodo>,
) -> Result<Markup, AppError> {
    let db = state.write().await;
    let todo = repository::create(&db, &title)?;
    info!(id = %todo.id, "added todo");
    render(&db, state.variant)
}

async fn edit_grid(
    State(state): State<AppState>,
    Form(cells): Form<Vec<(String, String)>>,
) -> Result<Markup, AppError> {
    let db = state.write().await;
    let outcome = reconcile::reconcile(&db, &cells, state.variant)?;
    info!(
        updated = outcome.updated,
        deleted = outcome.deleted,
        "reconciled grid edits"
    );
    render(&db, state.variant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use crate::db::driver::tests::{setup, teardown};
    use tower::ServiceExt;

    async fn body_string(response: Response) -> Result<String> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn form_post(uri: &str, body: String) -> Result<Request<Body>> {
        Ok(Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))?)
    }

    fn app(db: &Db, variant: GridVariant) -> Result<Router> {
        Ok(router(AppState::new(Db::new_with_path(db.path())?, variant)))
    }

    #[tokio::test]
    async fn test_root_renders_empty_state() -> Result<()> {
        let (path, db) = setup()?;
        let request = Request::builder().uri("/").body(Body::empty())?;
        let response = app(&db, GridVariant::Deletable)?.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await?;
        assert!(body.contains(views::PAGE_TITLE));
        assert!(body.contains(views::EMPTY_WARNING));
        assert!(!body.contains("<table"));
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_todo_rerenders_grid() -> Result<()> {
        let (path, db) = setup()?;
        let response = app(&db, GridVariant::Deletable)?
            .oneshot(form_post("/todos", "title=Buy+milk".to_string())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await?;
        assert!(body.contains("value=\"Buy milk\""));
        assert!(!body.contains(views::EMPTY_WARNING));

        let todos = repository::list(&db)?;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Buy milk");
        assert!(!todos[0].completed);
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_todo_accepts_empty_title() -> Result<()> {
        let (path, db) = setup()?;
        let response = app(&db, GridVariant::Deletable)?
            .oneshot(form_post("/todos", "title=".to_string())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(repository::list(&db)?[0].title, "");
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_has_no_side_effects() -> Result<()> {
        let (path, db) = setup()?;
        let todo = repository::create(&db, "stay")?;
        let request = Request::builder().uri("/app").body(Body::empty())?;
        let response = app(&db, GridVariant::Deletable)?.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await?.contains("value=\"stay\""));
        assert_eq!(repository::list(&db)?, vec![todo]);
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_grid_edit_updates_and_deletes() -> Result<()> {
        let (path, db) = setup()?;
        let kept = repository::create(&db, "kept")?;
        let dropped = repository::create(&db, "dropped")?;
        let body = format!(
            "rows%5B0%5D.id={}&rows%5B0%5D.title=kept+renamed&rows%5B0%5D.completed=on\
             &rows%5B1%5D.id={}&rows%5B1%5D.title=dropped&rows%5B1%5D.delete=on",
            kept.id, dropped.id
        );
        let response = app(&db, GridVariant::Deletable)?
            .oneshot(form_post("/grid", body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let stored = repository::get(&db, &kept.id)?.expect("kept row stays");
        assert_eq!(stored.title, "kept renamed");
        assert!(stored.completed);
        assert!(repository::get(&db, &dropped.id)?.is_none());

        let body = body_string(response).await?;
        assert!(body.contains("value=\"kept renamed\""));
        assert!(!body.contains("value=\"dropped\""));
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_grid_edit_deleting_last_row_shows_warning() -> Result<()> {
        let (path, db) = setup()?;
        let only = repository::create(&db, "only")?;
        let body = format!(
            "rows%5B0%5D.id={}&rows%5B0%5D.title=only&rows%5B0%5D.delete=on",
            only.id
        );
        let response = app(&db, GridVariant::Deletable)?
            .oneshot(form_post("/grid", body)?)
            .await?;
        assert!(body_string(response).await?.contains(views::EMPTY_WARNING));
        assert!(repository::list(&db)?.is_empty());
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_plain_grid_cannot_delete() -> Result<()> {
        let (path, db) = setup()?;
        let todo = repository::create(&db, "sticky")?;
        let body = format!(
            "rows%5B0%5D.id={}&rows%5B0%5D.title=sticky&rows%5B0%5D.completed=1&rows%5B0%5D.delete=on",
            todo.id
        );
        let response = app(&db, GridVariant::Plain)?
            .oneshot(form_post("/grid", body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let stored = repository::get(&db, &todo.id)?.expect("plain grid never deletes");
        assert!(stored.completed);
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_grid_is_rejected() -> Result<()> {
        let (path, db) = setup()?;
        let todo = repository::create(&db, "untouched")?;
        let response = app(&db, GridVariant::Deletable)?
            .oneshot(form_post("/grid", "rows%5B0%5D.title=no+id".to_string())?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await?;
        assert!(body.contains("role=\"alert\""));
        assert!(body.contains("row 0 has no id"));
        assert_eq!(repository::list(&db)?, vec![todo]);
        teardown((path, db))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_fault_renders_generic_alert() -> Result<()> {
        let (path, db) = setup()?;
        let app = app(&db, GridVariant::Deletable)?;
        // a directory where the database file was makes every open fail
        std::fs::remove_file(&path)?;
        std::fs::create_dir(&path)?;

        let request = Request::builder().uri("/app").body(Body::empty())?;
        let response = app.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_string(response).await?;
        assert!(body.contains("role=\"alert\""));
        assert!(body.contains("Something went wrong, try refreshing"));
        std::fs::remove_dir(&path)?;
        Ok(())
    }
}
