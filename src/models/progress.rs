// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Progress of long-running backend jobs streamed as server-sent events.
//!
//! The state machine is pure: the worker thread feeds it raw event payloads and
//! the UI reads back `(progress, total, status)`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

/// A streamed backend job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamJob {
    ThemeDescriptions,
    TranslateProducts,
}

impl StreamJob {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::ThemeDescriptions => "/theme_descriptions",
            Self::TranslateProducts => "/translate_products",
        }
    }

    /// Query parameter carrying the user input.
    pub fn query_key(self) -> &'static str {
        match self {
            Self::ThemeDescriptions => "theme",
            Self::TranslateProducts => "language",
        }
    }

    pub fn empty_input_message(self) -> &'static str {
        match self {
            Self::ThemeDescriptions => "Please enter a theme.",
            Self::TranslateProducts => "Please enter a language.",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ThemeDescriptions => "AI Theme Product Descriptions",
            Self::TranslateProducts => "Translate Products",
        }
    }
}

/// Per-event phase reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Processing,
    Complete,
    Error,
    Skipped,
    #[serde(other)]
    Unknown,
}

/// One decoded event payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ProgressEvent {
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "unknown_phase")]
    pub status: ProgressPhase,
}

fn unknown_phase() -> ProgressPhase {
    ProgressPhase::Unknown
}

impl ProgressEvent {
    pub fn parse(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    pub fn status_text(&self) -> String {
        match self.status {
            ProgressPhase::Complete => "Done!".to_string(),
            ProgressPhase::Error => "Error on one or more products.".to_string(),
            ProgressPhase::Skipped => "Some products skipped (no description).".to_string(),
            ProgressPhase::Processing | ProgressPhase::Unknown => {
                format!("Processing {} of {}...", self.progress, self.total)
            }
        }
    }
}

pub const STARTING_TEXT: &str = "Starting...";
pub const PARSE_ERROR_TEXT: &str = "Error parsing progress.";
pub const CONNECTION_LOST_TEXT: &str = "Connection lost or error occurred.";

/// Cancellation handle shared between the UI and the worker reading a stream.
#[derive(Clone, Debug)]
pub struct StreamHandle {
    pub id: u64,
    cancel: Arc<AtomicBool>,
}

impl StreamHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

impl PartialEq for StreamHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Lifecycle of a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Complete,
    Failed,
}

impl StreamState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }
}

/// Job progress as shown to the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobProgress {
    pub state: StreamState,
    pub progress: u64,
    pub total: u64,
    pub status: String,
    active: Option<StreamHandle>,
}

impl JobProgress {
    /// Begin tracking a new stream, closing any previous one.
    pub fn start(&mut self, handle: StreamHandle) {
        if let Some(prev) = self.active.take() {
            prev.cancel();
        }
        self.state = StreamState::Connecting;
        self.progress = 0;
        self.total = 0;
        self.status = STARTING_TEXT.to_string();
        self.active = Some(handle);
    }

    pub fn active_id(&self) -> Option<u64> {
        self.active.as_ref().map(|h| h.id)
    }

    fn accepts(&self, id: u64) -> bool {
        self.state.is_active() && self.active_id() == Some(id)
    }

    /// Response headers arrived. Returns false when the stream is stale.
    pub fn opened(&mut self, id: u64) -> bool {
        if !self.accepts(id) {
            return false;
        }
        self.state = StreamState::Streaming;
        true
    }

    /// Apply one raw event payload. Returns false when the event was ignored.
    pub fn apply(&mut self, id: u64, data: &str) -> bool {
        if !self.accepts(id) {
            return false;
        }
        self.state = StreamState::Streaming;
        match ProgressEvent::parse(data) {
            Ok(event) => {
                self.progress = event.progress;
                self.total = event.total;
                self.status = event.status_text();
                if event.status == ProgressPhase::Complete {
                    self.state = StreamState::Complete;
                    self.close();
                }
            }
            Err(err) => {
                log::warn!("malformed progress event {data:?}: {err}");
                self.status = PARSE_ERROR_TEXT.to_string();
            }
        }
        true
    }

    /// Connection error or end of stream before completion.
    pub fn connection_lost(&mut self, id: u64) -> bool {
        if !self.accepts(id) {
            return false;
        }
        self.state = StreamState::Failed;
        self.status = CONNECTION_LOST_TEXT.to_string();
        self.close();
        true
    }

    /// User cancel: close the stream and go back to idle.
    pub fn cancel(&mut self) {
        self.close();
        self.state = StreamState::Idle;
        self.status.clear();
    }

    fn close(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }

    /// Rounded percentage; zero until a total is known.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.progress as f64 / self.total as f64) * 100.0).round() as u32
    }
}
