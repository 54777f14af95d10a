// Import axum routing utilities and Router
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir; // Serves the browser UI (HTML/CSS/JS)
use tracing::info;

use weekly_tracker::config::{AppConfig, STATE_KEY, TASKS_KEY};
use weekly_tracker::routes_schedule::{self as schedule, SharedStore};
use weekly_tracker::routes_stats as stats;
use weekly_tracker::routes_tasks::{self as daily, SharedTasks};
use weekly_tracker::{logging, AppResult, FileStorage, ScheduleStore, TaskStore};

fn api(store: SharedStore) -> Router {
    Router::new()
        // whole document
        .route("/state", get(schedule::get_state))
        .route("/export", get(schedule::export_state))
        .route("/import", post(schedule::import_state))
        .route("/clear", post(schedule::clear_state))
        // blocks
        .route("/blocks", post(schedule::create_block))
        .route("/blocks/:id", put(schedule::update_block).delete(schedule::delete_block))
        .route("/blocks/:id/complete", post(schedule::complete_block))
        // activities
        .route("/activities", post(schedule::create_activity))
        .route(
            "/activities/:id",
            put(schedule::update_activity).delete(schedule::delete_activity),
        )
        .route("/activities/:id/toggle", post(schedule::toggle_activity))
        // settings
        .route("/settings", get(schedule::get_settings).put(schedule::put_settings))
        // derived figures
        .route("/summary", get(stats::get_summary))
        .route("/upcoming", get(stats::get_upcoming))
        .route("/days/:day_index", get(stats::get_day))
        .with_state(store)
}

fn tasks_api(tasks: SharedTasks) -> Router {
    Router::new()
        .route("/tasks", get(daily::get_tasks).post(daily::create_task))
        .route("/tasks/:id", delete(daily::delete_task))
        .route("/tasks/:id/toggle", post(daily::toggle_task))
        .with_state(tasks)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    logging::init_logging()?;
    let config = AppConfig::from_env()?;

    let store = ScheduleStore::open(FileStorage::new(&config.data_dir), STATE_KEY);
    info!(
        data_dir = %config.data_dir.display(),
        blocks = store.state().time_blocks.len(),
        activities = store.state().activities.len(),
        "schedule loaded"
    );
    let tasks = TaskStore::open(FileStorage::new(&config.data_dir), TASKS_KEY);
    info!(dates = tasks.state().dates().count(), "daily tasks loaded");

    let app = Router::new()
        .nest(
            "/api",
            api(schedule::shared(store)).merge(tasks_api(daily::shared_tasks(tasks))),
        )
        .fallback_service(ServeDir::new(&config.static_dir));

    info!("server running at http://{}", config.addr);
    info!("api base: http://{}/api", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
