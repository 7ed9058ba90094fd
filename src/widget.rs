//! The widget controller: display mode, trigger/panel positions, drag
//! gestures, form data and the submission flow.
//!
//! The controller is a plain state machine driven by the view layer's
//! events. Submission is split into [`FeedbackWidget::begin_submit`] and
//! [`FeedbackWidget::finish_submit`] so a host can release its lock on the
//! controller while the network call runs.

use futures::future::{BoxFuture, FutureExt};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::config::WidgetConfig;
use crate::connectors::{ConnectorConfig, DispatchError, Dispatcher};
use crate::geometry::drag::{DragGesture, GestureKind, PointerPoint};
use crate::geometry::{clamp_to_viewport, place_panel, Position, Size, Viewport};
use crate::record::{FeedbackRecord, Field, FieldRequirements};
use crate::theme::Palette;
use crate::validation::{validate, FieldErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayMode {
    Collapsed,
    Expanded,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Feedback form has errors: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Dispatch(DispatchError),
    #[error("Submit handler failed: {0}")]
    Override(String),
    #[error("A submission is already in progress")]
    AlreadySubmitting,
    #[error("Feedback panel is not open")]
    NotOpen,
}

pub type SubmitFuture = BoxFuture<'static, Result<(), String>>;

/// Caller-supplied submit function that replaces the connector path.
pub type SubmitFn = Arc<dyn Fn(FeedbackRecord) -> SubmitFuture + Send + Sync>;

pub fn submit_fn<F, Fut>(f: F) -> SubmitFn
where
    F: Fn(FeedbackRecord) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    Arc::new(move |record| f(record).boxed())
}

/// Where validated feedback goes.
#[derive(Clone)]
pub enum SubmitTarget {
    Override(SubmitFn),
    Connector {
        name: String,
        config: ConnectorConfig,
        dispatcher: Dispatcher,
    },
    Unconfigured,
}

impl SubmitTarget {
    /// Connector target from the config's `connector` selection, if any.
    pub fn from_config(config: &WidgetConfig, dispatcher: Dispatcher) -> Self {
        match &config.connector {
            Some(selection) => SubmitTarget::Connector {
                name: selection.name.clone(),
                config: selection.config.clone(),
                dispatcher,
            },
            None => SubmitTarget::Unconfigured,
        }
    }

    pub async fn submit(&self, record: &FeedbackRecord) -> Result<(), SubmitError> {
        match self {
            SubmitTarget::Override(f) => f(record.clone()).await.map_err(SubmitError::Override),
            SubmitTarget::Connector {
                name,
                config,
                dispatcher,
            } => dispatcher
                .dispatch(name, record, config)
                .await
                .map_err(SubmitError::Dispatch),
            SubmitTarget::Unconfigured => {
                debug!("No submit function or connector provided");
                Ok(())
            }
        }
    }
}

/// A validated record and its destination, detached from the controller.
#[derive(Clone)]
pub struct SubmitTicket {
    pub record: FeedbackRecord,
    target: SubmitTarget,
    session: u64,
}

impl SubmitTicket {
    pub async fn send(&self) -> Result<(), SubmitError> {
        self.target.submit(&self.record).await
    }
}

/// Serializable snapshot of everything the view layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    pub mode: DisplayMode,
    pub show_confirmation: bool,
    pub submitting: bool,
    pub position: Position,
    pub dragging: bool,
    pub visible_fields: Vec<Field>,
    pub form: FeedbackRecord,
    pub errors: FieldErrors,
    pub last_error: Option<String>,
}

pub struct FeedbackWidget {
    config: WidgetConfig,
    requirements: FieldRequirements,
    target: SubmitTarget,
    viewport: Viewport,
    trigger_extent: Size,
    mode: DisplayMode,
    show_confirmation: bool,
    submitting: bool,
    // Bumped on every close; tickets from an earlier session are stale.
    session: u64,
    trigger: Position,
    panel: Position,
    return_position: Position,
    drag: Option<DragGesture>,
    form: FeedbackRecord,
    errors: FieldErrors,
    last_error: Option<String>,
}

impl FeedbackWidget {
    pub fn new(config: WidgetConfig, target: SubmitTarget, viewport: Viewport) -> Self {
        let requirements = config.requirements();
        let trigger_extent = config.trigger_size;
        let trigger = clamp_to_viewport(config.position, trigger_extent, viewport);
        let form = FeedbackRecord::prefilled(config.prefill_name.as_deref(), config.prefill_email.as_deref());

        Self {
            config,
            requirements,
            target,
            viewport,
            trigger_extent,
            mode: DisplayMode::Collapsed,
            show_confirmation: false,
            submitting: false,
            session: 0,
            trigger,
            panel: trigger,
            return_position: trigger,
            drag: None,
            form,
            errors: FieldErrors::default(),
            last_error: None,
        }
    }

    /// Controller whose submissions go to the configured connector.
    pub fn with_dispatcher(config: WidgetConfig, dispatcher: Dispatcher, viewport: Viewport) -> Self {
        let target = SubmitTarget::from_config(&config, dispatcher);
        Self::new(config, target, viewport)
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode == DisplayMode::Expanded
    }

    pub fn show_confirmation(&self) -> bool {
        self.show_confirmation
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn trigger_position(&self) -> Position {
        self.trigger
    }

    pub fn panel_position(&self) -> Position {
        self.panel
    }

    /// Position of whichever element is currently on screen.
    pub fn position(&self) -> Position {
        match self.mode {
            DisplayMode::Collapsed => self.trigger,
            DisplayMode::Expanded => self.panel,
        }
    }

    pub fn form(&self) -> &FeedbackRecord {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn visible_fields(&self) -> Vec<Field> {
        self.requirements.visible()
    }

    pub fn palette(&self, prefers_dark: bool) -> &'static Palette {
        self.config.theme.palette(prefers_dark)
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            mode: self.mode,
            show_confirmation: self.show_confirmation,
            submitting: self.submitting,
            position: self.position(),
            dragging: self.is_dragging(),
            visible_fields: self.visible_fields(),
            form: self.form.clone(),
            errors: self.errors.clone(),
            last_error: self.last_error.clone(),
        }
    }

    // Geometry

    pub fn handle_viewport_resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.trigger = clamp_to_viewport(self.trigger, self.trigger_extent, viewport);
        self.return_position = clamp_to_viewport(self.return_position, self.trigger_extent, viewport);
        if self.is_open() {
            self.panel = clamp_to_viewport(self.panel, self.config.panel.size(), viewport);
        }
    }

    /// Measured size of the rendered trigger, used to clamp drags.
    pub fn set_trigger_extent(&mut self, extent: Size) {
        self.trigger_extent = extent;
        self.trigger = clamp_to_viewport(self.trigger, extent, self.viewport);
    }

    /// Starts a gesture on the trigger. Returns `false` when dragging is
    /// disabled or the panel is open.
    pub fn pointer_down(&mut self, pointer: PointerPoint, at: Instant) -> bool {
        if !self.config.draggable || self.is_open() {
            return false;
        }
        self.drag = Some(DragGesture::begin(pointer, self.trigger, at));
        true
    }

    pub fn pointer_move(&mut self, pointer: PointerPoint) -> Option<Position> {
        let gesture = self.drag.as_mut()?;
        self.trigger = gesture.track(pointer, self.trigger_extent, self.viewport);
        Some(self.trigger)
    }

    /// Ends the gesture. A click opens the panel; a drag leaves the trigger
    /// where it was dropped.
    pub fn pointer_up(&mut self, pointer: PointerPoint, at: Instant) -> Option<GestureKind> {
        let mut gesture = self.drag.take()?;
        self.trigger = gesture.track(pointer, self.trigger_extent, self.viewport);
        let start = gesture.start_offsets();
        let kind = gesture.finish(pointer, at);
        match kind {
            GestureKind::Click => {
                self.trigger = start;
                self.open();
            }
            GestureKind::Drag => {
                debug!("Trigger dropped at right={} bottom={}", self.trigger.right, self.trigger.bottom)
            }
        }
        Some(kind)
    }

    /// Click on a non-draggable trigger.
    pub fn click_trigger(&mut self) {
        if !self.config.draggable {
            self.open();
        }
    }

    pub fn open(&mut self) {
        if self.is_open() {
            return;
        }
        self.drag = None;
        self.return_position = self.trigger;
        self.panel = place_panel(self.trigger, self.config.trigger_size, self.config.panel.size(), self.viewport);
        self.mode = DisplayMode::Expanded;
        self.show_confirmation = false;
        info!(
            "📂 Feedback panel opened at right={} bottom={}",
            self.panel.right, self.panel.bottom
        );
    }

    /// Cancel, confirmation close and acknowledgement all end here.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.trigger = clamp_to_viewport(self.return_position, self.trigger_extent, self.viewport);
        self.mode = DisplayMode::Collapsed;
        self.session = self.session.wrapping_add(1);
        self.show_confirmation = false;
        self.reset_form();
        info!("📁 Feedback panel closed");
    }

    // Form

    pub fn set_field(&mut self, field: Field, value: &str) {
        if !self.requirements.is_visible(field) {
            warn!("Ignoring input for hidden field '{}'", field);
            return;
        }
        self.form.set_text(field, value);
    }

    pub fn set_rating(&mut self, rating: u8) {
        if self.requirements.is_visible(Field::Rating) {
            self.form.set_rating(rating);
        }
    }

    pub fn reset_form(&mut self) {
        self.form = FeedbackRecord::prefilled(
            self.config.prefill_name.as_deref(),
            self.config.prefill_email.as_deref(),
        );
        self.errors = FieldErrors::default();
        self.last_error = None;
    }

    // Submission

    /// Validates the form and marks the widget as submitting. Validation
    /// failures are stored for display and nothing is sent.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitError> {
        if !self.is_open() || self.show_confirmation {
            return Err(SubmitError::NotOpen);
        }
        if self.submitting {
            return Err(SubmitError::AlreadySubmitting);
        }

        self.errors = FieldErrors::default();
        let record = match validate(&self.requirements, &self.form) {
            Ok(record) => record,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(SubmitError::Validation(errors));
            }
        };

        self.submitting = true;
        self.last_error = None;
        Ok(SubmitTicket {
            record,
            target: self.target.clone(),
            session: self.session,
        })
    }

    /// Applies the outcome of a ticket. Success shows the confirmation and
    /// resets the form; failure keeps the form open with `last_error` set.
    /// If the panel was closed since the ticket was issued, only the
    /// `submitting` flag is cleared.
    pub fn finish_submit(
        &mut self,
        ticket: &SubmitTicket,
        outcome: Result<(), SubmitError>,
    ) -> Result<(), SubmitError> {
        self.submitting = false;
        if ticket.session != self.session {
            match &outcome {
                Ok(()) => info!("Feedback from a closed panel was delivered"),
                Err(e) => warn!("Feedback from a closed panel was not delivered: {}", e),
            }
            return outcome;
        }
        match outcome {
            Ok(()) => {
                info!("🎉 Feedback submitted");
                if self.is_open() {
                    self.show_confirmation = true;
                }
                self.reset_form();
                Ok(())
            }
            Err(e) => {
                error!("Error submitting feedback: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn submit(&mut self) -> Result<(), SubmitError> {
        let ticket = self.begin_submit()?;
        let outcome = ticket.send().await;
        self.finish_submit(&ticket, outcome)
    }
}
