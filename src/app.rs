#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::conflict::check_conflicts;
use crate::downloader;
use crate::saving::{self, Snapshot};
use crate::schedule::{self, CellField, Schedule};
use crate::summary::teacher_day_counts;

pub struct AppState {
    snapshot: Mutex<Snapshot>,
    data_path: PathBuf,
}

#[derive(Deserialize)]
struct CellUpdate {
    class: usize,
    day: usize,
    slot: usize,
    field: CellField,
    value: String,
}

#[derive(Deserialize)]
struct ResizeRequest {
    count: usize,
}

#[derive(Deserialize)]
struct ClassNameUpdate {
    index: usize,
    name: String,
}

#[derive(Deserialize)]
struct SlotUpdate {
    index: usize,
    start: String,
    end: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

impl StatusResponse {
    fn ok() -> Self {
        StatusResponse {
            status: "ok".to_string(),
            message: None,
        }
    }

    fn conflict(message: String) -> Self {
        StatusResponse {
            status: "conflict".to_string(),
            message: Some(message),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        StatusResponse {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

pub async fn run(data_path: PathBuf, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = saving::load_snapshot(&data_path);

    let app_state = Arc::new(AppState {
        snapshot: Mutex::new(snapshot),
        data_path,
    });

    // Build router
    let app = Router::new()
        .route("/", get(serve_landing))
        .route("/sheet", get(serve_sheet))
        .route("/api/state", get(get_state))
        .route("/api/generate", post(generate_schedule))
        .route("/api/reset", post(reset_routine))
        .route("/api/cell", post(update_cell))
        .route("/api/config/classes", post(resize_classes))
        .route("/api/config/class_name", post(rename_class))
        .route("/api/config/slots", post(resize_slots))
        .route("/api/config/slot", post(relabel_slot))
        .route("/api/summary", get(get_summary))
        .route("/api/export/xlsx", get(export_xlsx))
        .route("/api/export/csv", get(export_csv))
        .route("/api/backup", get(download_backup))
        .route("/api/restore", post(restore_backup))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(app_state);

    // Start server
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    log::info!("listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Writes the committed snapshot to disk. Persistence is fire-and-forget:
/// a failed write is logged and the in-memory state stays authoritative.
fn persist(state: &AppState, snapshot: &Snapshot) {
    if let Err(e) = saving::save_snapshot(snapshot, &state.data_path) {
        log::warn!(
            "failed to persist snapshot to {}: {}",
            state.data_path.display(),
            e
        );
    }
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/landing.html"))
}

async fn serve_sheet() -> Html<&'static str> {
    Html(include_str!("./static/sheet.html"))
}

async fn get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.lock().unwrap();

    Json(serde_json::json!({
        "config": snapshot.config,
        "schedule": snapshot.schedule,
    }))
}

async fn generate_schedule(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut snapshot = state.snapshot.lock().unwrap();
    snapshot.schedule = Some(Schedule::create(&snapshot.config));
    persist(&state, &snapshot);

    Json(StatusResponse::ok())
}

async fn reset_routine(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut snapshot = state.snapshot.lock().unwrap();
    *snapshot = Snapshot::default();
    persist(&state, &snapshot);

    Json(StatusResponse::ok())
}

async fn update_cell(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CellUpdate>,
) -> impl IntoResponse {
    let mut snapshot = state.snapshot.lock().unwrap();
    let Snapshot {
        config, schedule, ..
    } = &mut *snapshot;

    let Some(schedule) = schedule.as_mut() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("No schedule generated yet")),
        )
            .into_response();
    };

    if payload.class >= config.class_names.len()
        || payload.day >= config.days.len()
        || payload.slot >= config.time_slots.len()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("Cell out of range")),
        )
            .into_response();
    }

    match schedule.set_cell(
        config,
        payload.class,
        payload.day,
        payload.slot,
        payload.field,
        &payload.value,
    ) {
        Ok(()) => {
            persist(&state, &snapshot);
            Json(StatusResponse::ok()).into_response()
        }
        Err(conflict) => (
            StatusCode::CONFLICT,
            Json(StatusResponse::conflict(conflict.to_string())),
        )
            .into_response(),
    }
}

async fn resize_classes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResizeRequest>,
) -> impl IntoResponse {
    let mut snapshot = state.snapshot.lock().unwrap();
    let Snapshot {
        config, schedule, ..
    } = &mut *snapshot;

    schedule::resize_classes(config, schedule, payload.count);
    persist(&state, &snapshot);

    Json(StatusResponse::ok())
}

async fn resize_slots(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResizeRequest>,
) -> impl IntoResponse {
    let mut snapshot = state.snapshot.lock().unwrap();
    let Snapshot {
        config, schedule, ..
    } = &mut *snapshot;

    schedule::resize_slots(config, schedule, payload.count);
    persist(&state, &snapshot);

    Json(StatusResponse::ok())
}

async fn rename_class(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClassNameUpdate>,
) -> impl IntoResponse {
    let mut snapshot = state.snapshot.lock().unwrap();

    if payload.index >= snapshot.config.class_names.len() {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("Class index out of range")),
        )
            .into_response();
    }

    schedule::set_class_name(&mut snapshot.config, payload.index, &payload.name);
    persist(&state, &snapshot);

    Json(StatusResponse::ok()).into_response()
}

async fn relabel_slot(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SlotUpdate>,
) -> impl IntoResponse {
    let mut snapshot = state.snapshot.lock().unwrap();

    if payload.index >= snapshot.config.time_slots.len() {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("Slot index out of range")),
        )
            .into_response();
    }

    schedule::set_slot(
        &mut snapshot.config,
        payload.index,
        &payload.start,
        &payload.end,
    );
    persist(&state, &snapshot);

    Json(StatusResponse::ok()).into_response()
}

async fn get_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.lock().unwrap();

    match &snapshot.schedule {
        Some(schedule) => Json(teacher_day_counts(schedule, &snapshot.config)),
        None => Json(Default::default()),
    }
}

/// Refuses an export while there is nothing to export or the grid still
/// carries a conflict, mirroring the editor's own download guard.
fn exportable(snapshot: &Snapshot) -> Result<&Schedule, StatusResponse> {
    let Some(schedule) = snapshot.schedule.as_ref() else {
        return Err(StatusResponse::error(
            "No schedule to download. Please generate first.",
        ));
    };

    if let Some(conflict) = check_conflicts(schedule, &snapshot.config) {
        return Err(StatusResponse::error(format!(
            "Cannot download. There's a conflict: {}",
            conflict
        )));
    }

    Ok(schedule)
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.lock().unwrap();

    let schedule = match exportable(&snapshot) {
        Ok(schedule) => schedule,
        Err(response) => return (StatusCode::CONFLICT, Json(response)).into_response(),
    };

    match downloader::to_xlsx(schedule, &snapshot.config) {
        Ok(buffer) => Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            )
            .header(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"schedule.xlsx\"",
            )
            .body(axum::body::Body::from(Bytes::from(buffer)))
            .unwrap(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusResponse::error(e.to_string())),
        )
            .into_response(),
    }
}

async fn export_csv(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.lock().unwrap();

    let schedule = match exportable(&snapshot) {
        Ok(schedule) => schedule,
        Err(response) => return (StatusCode::CONFLICT, Json(response)).into_response(),
    };

    let csv = downloader::to_csv(schedule, &snapshot.config);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"schedule.csv\"",
        )
        .body(axum::body::Body::from(csv))
        .unwrap()
}

async fn download_backup(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.lock().unwrap();

    let mut buffer = Vec::new();
    match saving::backup_to_memory(&snapshot, &mut buffer) {
        Ok(_) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/gzip")
            .header(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"timetable-backup.bin.gz\"",
            )
            .body(axum::body::Body::from(Bytes::from(buffer)))
            .unwrap(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusResponse::error(e.to_string())),
        )
            .into_response(),
    }
}

async fn restore_backup(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file_data = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name().unwrap_or("unknown") == "snapshot" {
            file_data = field.bytes().await.unwrap_or_default().to_vec();
        }
    }

    if file_data.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("No file data received")),
        )
            .into_response();
    }

    match saving::restore_from_memory(&file_data) {
        Ok(restored) => {
            let mut snapshot = state.snapshot.lock().unwrap();
            *snapshot = restored;
            persist(&state, &snapshot);

            Json(StatusResponse::ok()).into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error(format!(
                "Failed to restore backup: {}",
                e
            ))),
        )
            .into_response(),
    }
}
