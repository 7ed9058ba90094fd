//! Tauri v2 plugin exposing the widget controller to a webview.
//!
//! ```ignore
//! tauri::Builder::default()
//!     .plugin(feedback_widget::plugin::init(WidgetConfig::load(None)?))
//! ```

use log::info;
use parking_lot::Mutex;
use std::time::Instant;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Manager, Runtime, State};

use crate::config::WidgetConfig;
use crate::connectors::Dispatcher;
use crate::geometry::drag::{GestureKind, PointerPoint};
use crate::geometry::{Position, Size};
use crate::record::Field;
use crate::widget::{FeedbackWidget, SubmitError, WidgetSnapshot};

pub const PLUGIN_NAME: &str = "feedback-widget";

// Until the webview reports its real size.
const INITIAL_VIEWPORT: Size = Size::new(1280.0, 720.0);

pub struct WidgetState {
    widget: Mutex<FeedbackWidget>,
}

impl WidgetState {
    pub fn new(widget: FeedbackWidget) -> Self {
        Self {
            widget: Mutex::new(widget),
        }
    }
}

pub fn init<R: Runtime>(config: WidgetConfig) -> TauriPlugin<R> {
    Builder::new(PLUGIN_NAME)
        .invoke_handler(tauri::generate_handler![
            feedback_state,
            feedback_set_viewport,
            feedback_pointer_down,
            feedback_pointer_move,
            feedback_pointer_up,
            feedback_open,
            feedback_close,
            feedback_set_field,
            feedback_set_rating,
            feedback_submit,
        ])
        .setup(move |app, _api| {
            let dispatcher = Dispatcher::http(config.retry.policy());
            let widget = FeedbackWidget::with_dispatcher(config, dispatcher, INITIAL_VIEWPORT);
            app.manage(WidgetState::new(widget));
            info!("✅ Feedback widget plugin ready");
            Ok(())
        })
        .build()
}

#[tauri::command]
fn feedback_state(state: State<'_, WidgetState>) -> WidgetSnapshot {
    state.widget.lock().snapshot()
}

#[tauri::command]
fn feedback_set_viewport(width: f64, height: f64, state: State<'_, WidgetState>) -> Position {
    let mut widget = state.widget.lock();
    widget.handle_viewport_resize(Size::new(width, height));
    widget.position()
}

#[tauri::command]
fn feedback_pointer_down(x: f64, y: f64, state: State<'_, WidgetState>) -> bool {
    state.widget.lock().pointer_down(PointerPoint::new(x, y), Instant::now())
}

#[tauri::command]
fn feedback_pointer_move(x: f64, y: f64, state: State<'_, WidgetState>) -> Option<Position> {
    state.widget.lock().pointer_move(PointerPoint::new(x, y))
}

#[tauri::command]
fn feedback_pointer_up(x: f64, y: f64, state: State<'_, WidgetState>) -> Option<GestureKind> {
    state.widget.lock().pointer_up(PointerPoint::new(x, y), Instant::now())
}

#[tauri::command]
fn feedback_open(state: State<'_, WidgetState>) -> WidgetSnapshot {
    let mut widget = state.widget.lock();
    widget.open();
    widget.snapshot()
}

#[tauri::command]
fn feedback_close(state: State<'_, WidgetState>) -> WidgetSnapshot {
    let mut widget = state.widget.lock();
    widget.close();
    widget.snapshot()
}

#[tauri::command]
fn feedback_set_field(field: Field, value: String, state: State<'_, WidgetState>) {
    state.widget.lock().set_field(field, &value);
}

#[tauri::command]
fn feedback_set_rating(rating: u8, state: State<'_, WidgetState>) {
    state.widget.lock().set_rating(rating);
}

/// Validation failures come back as a snapshot carrying the field errors;
/// delivery failures come back as an error string.
#[tauri::command]
async fn feedback_submit(state: State<'_, WidgetState>) -> Result<WidgetSnapshot, String> {
    let ticket = {
        let mut widget = state.widget.lock();
        match widget.begin_submit() {
            Ok(ticket) => ticket,
            Err(SubmitError::Validation(_)) => return Ok(widget.snapshot()),
            Err(e) => return Err(e.to_string()),
        }
    };

    let outcome = ticket.send().await;

    let mut widget = state.widget.lock();
    widget.finish_submit(&ticket, outcome).map_err(|e| e.to_string())?;
    Ok(widget.snapshot())
}
