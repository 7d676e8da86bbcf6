use crate::board::BoardStore;
use crate::command::{CommandAction, CommandHandler};
use crate::config::AppConfig;
use crate::error::ErrorBody;
use crate::poller::{PrinterPoller, SheetPoller};
use crate::prefs::{Preferences, Theme};
use crate::printers::PrinterStatus;
use crate::render::{self, BoardView, PrinterCard};
use crate::status::DisplayMode;
use crate::ui;
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::{
    Json, Router,
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<BoardStore>,
    pub prefs: Preferences,
    pub sheet: Arc<SheetPoller>,
    pub printers: Arc<PrinterPoller>,
    pub commands: Arc<CommandHandler>,
}

impl AppState {
    async fn board_view(&self) -> BoardView {
        render::board_view(&self.store.sheet().await, self.prefs.display_mode())
    }

    async fn printer_cards(&self) -> Vec<PrinterCard> {
        render::printer_cards(&self.store.printer_statuses().await)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/fragments/board", get(board_fragment))
        .route("/fragments/printers", get(printers_fragment))
        .route("/api/board", get(board))
        .route("/api/printers", get(printers))
        .route("/api/printers/:number/command", post(command))
        .route("/api/refresh", post(refresh))
        .route("/api/preferences", get(preferences).post(update_preferences))
        .route("/ws/updates", get(ws_updates))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState) -> Result<()> {
    let addr: SocketAddr = state.config.http_bind.parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("UI listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(graceful_shutdown())
        .await?;

    Ok(())
}

async fn graceful_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down http server");
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let props = ui::PageProps {
        board: state.board_view().await,
        printers: state.printer_cards().await,
        theme: state.prefs.theme(),
        mode: state.prefs.display_mode(),
        sheet_refresh_ms: state.config.sheet_refresh.as_millis() as u64,
        printer_refresh_ms: state.config.printer_refresh.as_millis() as u64,
    };
    Html(ui::render_page(props))
}

async fn board_fragment(State(state): State<AppState>) -> impl IntoResponse {
    Html(ui::render_board(state.board_view().await))
}

async fn printers_fragment(State(state): State<AppState>) -> impl IntoResponse {
    Html(ui::render_printers(state.printer_cards().await))
}

async fn board(State(state): State<AppState>) -> Json<BoardView> {
    Json(state.board_view().await)
}

async fn printers(State(state): State<AppState>) -> Json<Vec<PrinterCard>> {
    Json(state.printer_cards().await)
}

#[derive(Serialize)]
struct RefreshResponse {
    board: BoardView,
    printers: Vec<PrinterCard>,
}

/// Runs a cycle of both boards now, alongside the timers.
async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    tracing::info!("Manual refresh requested");
    let (board, printers) = tokio::join!(state.sheet.poll(), state.printers.poll());
    Json(RefreshResponse { board, printers })
}

#[derive(Deserialize)]
struct CommandRequest {
    action: CommandAction,
}

#[derive(Serialize)]
struct CommandResponse {
    card: PrinterCard,
    status: PrinterStatus,
    error: Option<ErrorBody>,
}

async fn command(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Json(body): Json<CommandRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let index = state
        .store
        .printer_index(&number)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown printer: {number}")))?;
    let outcome = state
        .commands
        .execute(index, body.action)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown printer: {number}")))?;
    let endpoint = &state.store.endpoints()[index];
    Ok(Json(CommandResponse {
        card: render::printer_card(endpoint, &outcome.status),
        status: outcome.status,
        error: outcome.error.as_ref().map(ErrorBody::from),
    }))
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PreferencesBody {
    theme: Option<Theme>,
    display_mode: Option<DisplayMode>,
    api_url: Option<String>,
}

fn current_preferences(prefs: &Preferences) -> PreferencesBody {
    PreferencesBody {
        theme: prefs.theme(),
        display_mode: Some(prefs.display_mode()),
        api_url: prefs.api_url(),
    }
}

async fn preferences(State(state): State<AppState>) -> Json<PreferencesBody> {
    Json(current_preferences(&state.prefs))
}

/// Applies a partial update. Returns whether the API URL was touched.
fn save_preferences(prefs: &Preferences, body: PreferencesBody) -> Result<bool> {
    if let Some(theme) = body.theme {
        prefs.set_theme(theme)?;
    }
    if let Some(mode) = body.display_mode {
        prefs.set_display_mode(mode)?;
    }
    match body.api_url {
        Some(url) => {
            prefs.set_api_url(&url)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn update_preferences(
    State(state): State<AppState>,
    Json(body): Json<PreferencesBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let prefs = state.prefs.clone();
    // The file store writes synchronously.
    let url_changed = tokio::task::spawn_blocking(move || save_preferences(&prefs, body))
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Task join error: {err}"),
            )
        })?
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save preferences: {err}"),
            )
        })?;
    if url_changed {
        tracing::info!("Sheet source changed, polling now");
        let sheet = Arc::clone(&state.sheet);
        tokio::spawn(async move {
            sheet.poll().await;
        });
    }
    Ok(Json(current_preferences(&state.prefs)))
}

async fn ws_updates(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let mut rx = state.store.subscribe();
    loop {
        let update = match rx.recv().await {
            Ok(update) => update,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Update feed lagged by {skipped} messages");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let payload = match serde_json::to_string(&update) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if socket.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }
}
