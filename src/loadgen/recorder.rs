// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Task timing recorder.
//!
//! Every measured invocation gets a fresh `TaskId`. `begin` stores the start
//! time under that id, `complete` removes it, computes the elapsed time and
//! fires one `RequestEvent`. A `complete` without a matching `begin` degrades
//! to caller-supplied defaults instead of failing, so one bad measurement
//! never stops a load run.

use crate::loadgen::events::{EventKind, EventSink, RequestEvent};
use crate::rpc_core::constants::load;
use crate::utils::time;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Newtype wrapper around Uuid for per-invocation correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generate a new random TaskId
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TaskId)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0.to_string()
    }
}

impl TryFrom<String> for TaskId {
    type Error = uuid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Uuid::parse_str(&s).map(TaskId)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Start record of an in-flight task
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTask {
    pub name: String,
    pub start_time: f64,
    pub request_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

/// Used by `complete` when the task id has no pending record.
/// A missing `start_time` is taken as one second before completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionDefaults {
    pub name: String,
    pub request_type: String,
    pub start_time: Option<f64>,
}

/// Render a function name the way load reports show it: `` `get balance` ``
pub fn request_type_label(function_name: &str) -> String {
    format!("`{}`", function_name.replace('_', " "))
}

pub struct EventRecorder {
    pending: Mutex<HashMap<TaskId, PendingTask>>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecorder")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl EventRecorder {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            sink,
        }
    }

    pub fn begin(
        &self,
        task_id: TaskId,
        request_type: impl Into<String>,
        name: impl Into<String>,
        start_time: Option<f64>,
    ) {
        let task = PendingTask {
            name: name.into(),
            start_time: start_time.unwrap_or_else(time::now),
            request_type: request_type.into(),
        };
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        pending.insert(task_id, task);
        debug!(task_id = %task_id, in_flight = pending.len(), "Task started");
    }

    /// Finish a task and fire its event. Returns the event that was fired.
    pub fn complete(
        &self,
        task_id: &TaskId,
        outcome: Outcome,
        response_length: f64,
        defaults: &CompletionDefaults,
    ) -> RequestEvent {
        let record = self
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(task_id);
        let end_time = time::now();

        let (name, request_type, start_time) = match record {
            Some(task) => (task.name, task.request_type, task.start_time),
            None => {
                debug!(task_id = %task_id, "No pending record, using defaults");
                (
                    defaults.name.clone(),
                    defaults.request_type.clone(),
                    defaults
                        .start_time
                        .unwrap_or(end_time - load::MISSING_START_OFFSET_SECS),
                )
            }
        };

        let (kind, exception) = match outcome {
            Outcome::Success => (EventKind::Success, None),
            Outcome::Failure(message) => (EventKind::Failure, Some(message)),
        };

        let event = RequestEvent {
            kind,
            name,
            request_type,
            response_time: time::elapsed_ms(start_time, end_time),
            response_length,
            exception,
        };
        self.sink.fire(&event);
        debug!(
            request_type = %event.request_type,
            kind = ?event.kind,
            response_time_ms = event.response_time,
            "Task completed"
        );
        event
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Time `operation` under `label`. Errors are recorded as failures and
    /// swallowed: the caller gets `None` and keeps running.
    ///
    /// Dropping the returned future before it resolves still completes the
    /// task, as a failure with the exception `cancelled`.
    pub async fn instrument<T, E, Fut>(&self, label: &str, operation: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut guard = InFlight::start(self, request_type_label(label));

        let (outcome, value) = match operation.await {
            Ok(value) => (Outcome::Success, Some(value)),
            Err(e) => (Outcome::Failure(e.to_string()), None),
        };

        guard.finish(outcome);
        value
    }
}

/// Open task of an `instrument` call; completes it on drop if still open.
struct InFlight<'a> {
    recorder: &'a EventRecorder,
    task_id: TaskId,
    request_type: String,
    open: bool,
}

impl<'a> InFlight<'a> {
    fn start(recorder: &'a EventRecorder, request_type: String) -> Self {
        let task_id = TaskId::generate();
        recorder.begin(task_id, request_type.clone(), "", None);
        Self {
            recorder,
            task_id,
            request_type,
            open: true,
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        if !self.open {
            return;
        }
        self.open = false;
        let defaults = CompletionDefaults {
            request_type: self.request_type.clone(),
            ..Default::default()
        };
        self.recorder.complete(&self.task_id, outcome, 0.0, &defaults);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.open {
            debug!(task_id = %self.task_id, "Task dropped before completion");
            self.finish(Outcome::Failure(load::CANCELLED_EXCEPTION.to_string()));
        }
    }
}
