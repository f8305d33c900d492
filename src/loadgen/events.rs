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

//! Request events and the sinks that consume them.
//!
//! A `RequestEvent` is what a load-test framework's event bus expects for
//! each measured call: name, type, response time in ms, response length and,
//! for failures, the error message.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    pub kind: EventKind,
    pub name: String,
    pub request_type: String,
    /// Milliseconds, three decimals
    pub response_time: f64,
    pub response_length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

/// Destination of measured events.
pub trait EventSink: Send + Sync {
    fn fire(&self, event: &RequestEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn fire(&self, event: &RequestEvent) {
        (**self).fire(event)
    }
}

/// Logs every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn fire(&self, event: &RequestEvent) {
        match event.kind {
            EventKind::Success => debug!(
                request_type = %event.request_type,
                name = %event.name,
                response_time_ms = event.response_time,
                "success"
            ),
            EventKind::Failure => warn!(
                request_type = %event.request_type,
                name = %event.name,
                response_time_ms = event.response_time,
                exception = event.exception.as_deref().unwrap_or(""),
                "failure"
            ),
        }
    }
}

/// Forwards each event to every inner sink, in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn fire(&self, event: &RequestEvent) {
        for sink in &self.sinks {
            sink.fire(event);
        }
    }
}

/// Aggregated numbers for one `(request_type, name)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub request_type: String,
    pub name: String,
    pub requests: u64,
    pub failures: u64,
    pub total_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub total_length: f64,
    pub last_exception: Option<String>,
}

impl StatsEntry {
    fn empty(request_type: &str, name: &str) -> Self {
        Self {
            request_type: request_type.to_string(),
            name: name.to_string(),
            requests: 0,
            failures: 0,
            total_response_time: 0.0,
            min_response_time: f64::INFINITY,
            max_response_time: 0.0,
            total_length: 0.0,
            last_exception: None,
        }
    }

    fn record(&mut self, event: &RequestEvent) {
        self.requests += 1;
        if event.kind == EventKind::Failure {
            self.failures += 1;
            self.last_exception = event.exception.clone();
        }
        self.total_response_time += event.response_time;
        self.min_response_time = self.min_response_time.min(event.response_time);
        self.max_response_time = self.max_response_time.max(event.response_time);
        self.total_length += event.response_length;
    }

    fn merge(&mut self, other: &StatsEntry) {
        self.requests += other.requests;
        self.failures += other.failures;
        self.total_response_time += other.total_response_time;
        self.min_response_time = self.min_response_time.min(other.min_response_time);
        self.max_response_time = self.max_response_time.max(other.max_response_time);
        self.total_length += other.total_length;
        if other.last_exception.is_some() {
            self.last_exception = other.last_exception.clone();
        }
    }

    pub fn avg_response_time(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.total_response_time / self.requests as f64
        }
    }

    pub fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.failures as f64 / self.requests as f64
        }
    }
}

/// In-memory aggregation of events, safe to share between tasks.
#[derive(Debug, Default)]
pub struct StatsCollector {
    entries: Mutex<HashMap<(String, String), StatsEntry>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries sorted by request type, then name.
    pub fn snapshot(&self) -> Vec<StatsEntry> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let mut out: Vec<StatsEntry> = entries.values().cloned().collect();
        out.sort_by(|a, b| {
            a.request_type
                .cmp(&b.request_type)
                .then_with(|| a.name.cmp(&b.name))
        });
        out
    }

    pub fn total(&self) -> StatsEntry {
        let mut total = StatsEntry::empty("", "Aggregated");
        for entry in self.snapshot() {
            total.merge(&entry);
        }
        total
    }
}

impl EventSink for StatsCollector {
    fn fire(&self, event: &RequestEvent) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries
            .entry((event.request_type.clone(), event.name.clone()))
            .or_insert_with(|| StatsEntry::empty(&event.request_type, &event.name))
            .record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, request_type: &str, time: f64) -> RequestEvent {
        RequestEvent {
            kind,
            name: String::new(),
            request_type: request_type.to_string(),
            response_time: time,
            response_length: 0.0,
            exception: match kind {
                EventKind::Failure => Some("boom".to_string()),
                EventKind::Success => None,
            },
        }
    }

    #[test]
    fn test_stats_aggregation() {
        let stats = StatsCollector::new();
        stats.fire(&event(EventKind::Success, "`block number`", 10.0));
        stats.fire(&event(EventKind::Success, "`block number`", 30.0));
        stats.fire(&event(EventKind::Failure, "`get balance`", 5.0));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.len(), 2);
        let block = &snapshot[0];
        assert_eq!(block.request_type, "`block number`");
        assert_eq!(block.requests, 2);
        assert_eq!(block.avg_response_time(), 20.0);
        assert_eq!(block.min_response_time, 10.0);
        assert_eq!(block.max_response_time, 30.0);

        let balance = &snapshot[1];
        assert_eq!(balance.failures, 1);
        assert_eq!(balance.last_exception.as_deref(), Some("boom"));

        let total = stats.total();
        assert_eq!(total.requests, 3);
        assert_eq!(total.failures, 1);
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(StatsCollector::new());
        let b = Arc::new(StatsCollector::new());
        let fanout = FanoutSink::new()
            .with(a.clone())
            .with(b.clone())
            .with(Arc::new(TracingSink));
        fanout.fire(&event(EventKind::Success, "x", 1.0));
        assert_eq!(a.total().requests, 1);
        assert_eq!(b.total().requests, 1);
    }

    #[test]
    fn test_event_serialization_omits_missing_exception() {
        let json = serde_json::to_value(event(EventKind::Success, "x", 1.5)).unwrap();
        assert_eq!(json["kind"], "success");
        assert!(json.get("exception").is_none());
    }
}
