//! Append-only event log for simulation transitions and stage messages.
//!
//! Storage order is oldest-first (append order == timestamp order); renderers
//! display newest-first via [`EventLog::iter_newest_first`]. The log is
//! capped at the most recent [`EventLog::MAX_EVENTS`] entries, dropping the
//! oldest first. Entries are immutable in identity — the one allowed
//! mutation is an in-place [`action_data`](LogEvent::action_data) update,
//! used by the inline priority editor.
//!
//! Field names serialize in the camelCase wire form the original dashboard
//! and chat backend exchange (`fromNodeId`, `toNodeId`, `actionData`).

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use thiserror::Error;

use crate::types::StageId;

/// Follow-on effect tag carried by some log entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogAction {
    /// Open the extracted-document viewer; `action_data` holds the tree.
    ShowDocument,
    /// Priority assigned during adjudication; `action_data` holds the value
    /// and may be edited in place afterwards.
    SetPriority,
}

/// One recorded simulation event.
///
/// `from_node == None` marks a run's start event; everything else is a
/// transition, a narrated stage message, or a stage/run completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Epoch milliseconds; append order equals timestamp order.
    pub timestamp: i64,
    #[serde(rename = "fromNodeId")]
    pub from_node: Option<StageId>,
    #[serde(rename = "toNodeId")]
    pub to_node: StageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<LogAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_data: Option<Value>,
}

impl LogEvent {
    /// A run-start event (no originating stage).
    pub fn start(timestamp: i64, entry: StageId) -> Self {
        Self {
            timestamp,
            from_node: None,
            to_node: entry,
            reason: Some("Simulation started.".to_string()),
            action: None,
            action_data: None,
        }
    }

    /// A stage-to-stage transition with its selection reason.
    pub fn transition(
        timestamp: i64,
        from: StageId,
        to: StageId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            from_node: Some(from),
            to_node: to,
            reason: Some(reason.into()),
            action: None,
            action_data: None,
        }
    }

    /// A narrated stage message or completion phrase attributed to `stage`.
    pub fn stage_message(timestamp: i64, stage: StageId, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            from_node: Some(stage.clone()),
            to_node: stage,
            reason: Some(text.into()),
            action: None,
            action_data: None,
        }
    }

    /// Attach a follow-on action and its payload.
    #[must_use]
    pub fn with_action(mut self, action: LogAction, data: Value) -> Self {
        self.action = Some(action);
        self.action_data = Some(data);
        self
    }
}

/// Errors from event-log mutations.
#[derive(Debug, Error, Diagnostic)]
pub enum EventLogError {
    #[error("event log index {index} out of range (len {len})")]
    #[diagnostic(code(claimsim::log::index_out_of_range))]
    IndexOutOfRange { index: usize, len: usize },

    #[error("event at index {index} carries no action to update")]
    #[diagnostic(
        code(claimsim::log::no_action),
        help("Only entries tagged with an action accept action-data edits.")
    )]
    NoAction { index: usize },
}

/// Append-only ordered record of transitions and stage messages, capped at
/// the most recent 100 entries.
///
/// # Examples
///
/// ```rust
/// use claimsim::log::{EventLog, LogEvent};
///
/// let mut log = EventLog::new();
/// log.append(LogEvent::start(1, "intake".into()));
/// log.append(LogEvent::transition(2, "intake".into(), "extraction".into(), "dwell elapsed"));
///
/// assert_eq!(log.len(), 2);
/// // Rendering order is newest-first.
/// let newest = log.iter_newest_first().next().unwrap();
/// assert_eq!(newest.to_node.as_str(), "extraction");
/// ```
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: VecDeque<LogEvent>,
}

impl EventLog {
    /// Maximum retained entries; the oldest is dropped when exceeded.
    pub const MAX_EVENTS: usize = 100;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append an event, dropping the oldest entry if the cap is reached.
    pub fn append(&mut self, event: LogEvent) {
        if self.events.len() == Self::MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LogEvent> {
        self.events.get(index)
    }

    /// Oldest-first iteration (storage order).
    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter()
    }

    /// Newest-first iteration (rendering order).
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter().rev()
    }

    /// Oldest-first snapshot, e.g. for archiving or the assistant payload.
    #[must_use]
    pub fn to_vec(&self) -> Vec<LogEvent> {
        self.events.iter().cloned().collect()
    }

    /// Update the action payload of the entry at `index` in place.
    ///
    /// The entry's position, timestamp, and action tag are untouched; only
    /// the payload changes. Used by the inline priority editor.
    pub fn update_action_data(&mut self, index: usize, data: Value) -> Result<(), EventLogError> {
        let len = self.events.len();
        let event = self
            .events
            .get_mut(index)
            .ok_or(EventLogError::IndexOutOfRange { index, len })?;
        if event.action.is_none() {
            return Err(EventLogError::NoAction { index });
        }
        event.action_data = Some(data);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
