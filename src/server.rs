use crate::config::Settings;
use crate::data::{TimetableRequest, TimetableResponse};
use crate::error::{GenerateError, ServerError};
use crate::sample::sample_request;
use crate::solver;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone)]
struct AppState {
    settings: Arc<Settings>,
}

/// Raises the cancel flag when dropped, so a solve stops once its request
/// is abandoned.
struct CancelOnDrop(Arc<AtomicBool>);

impl CancelOnDrop {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(input): Json<TimetableRequest>,
) -> Result<(StatusCode, Json<TimetableResponse>), GenerateError> {
    let cancel = CancelOnDrop::new();
    let node_limit = state.settings.node_limit;
    let mut handle = tokio::task::spawn_blocking({
        let cancel = Arc::clone(&cancel.0);
        move || solver::solve(&input, node_limit, &cancel)
    });

    let result = match tokio::time::timeout(state.settings.solve_timeout(), &mut handle).await {
        Ok(joined) => joined?,
        Err(_) => {
            warn!(
                "Solve exceeded {} ms, cancelling",
                state.settings.solve_timeout_ms
            );
            cancel.cancel();
            handle.await?
        }
    };

    let response = result?;
    let status = match &response {
        TimetableResponse::Solved(solved) => {
            info!(
                "Generated timetable with {} lessons (score {})",
                solved.timetable.assignments().len(),
                solved.score
            );
            StatusCode::OK
        }
        TimetableResponse::Failed(failure) => {
            info!("Timetable generation failed: {}", failure.kind);
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    Ok((status, Json(response)))
}

async fn sample_handler() -> Json<TimetableRequest> {
    Json(sample_request())
}

pub fn router(settings: Settings) -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/sample", get(sample_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(AppState {
            settings: Arc::new(settings),
        })
}

pub async fn run_server(settings: Settings) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router(settings)).await?;
    Ok(())
}
