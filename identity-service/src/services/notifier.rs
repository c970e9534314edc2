//! Domain event sink.
//!
//! Registration and invite flows emit events that a real-time layer may
//! fan out to connected clients. Delivery is best-effort: the core never
//! fails an operation because a notification could not be delivered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    CompanyRegistered {
        company_id: Uuid,
        user_id: Uuid,
        name: String,
    },
    EmployeeRegistered {
        company_id: Uuid,
        employee_id: Uuid,
        user_id: Uuid,
    },
    InviteTokenIssued {
        company_id: Uuid,
        issued_by: Uuid,
        expires_at: DateTime<Utc>,
    },
    InviteTokenConsumed {
        company_id: Uuid,
        used_by: Uuid,
        used_by_email: String,
    },
}

#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}

/// Notifier that logs events instead of pushing them anywhere.
pub struct LoggingNotifier;

#[async_trait]
impl EventNotifier for LoggingNotifier {
    async fn publish(&self, event: DomainEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(event = %payload, "Domain event"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize domain event"),
        }
    }
}

/// Notifier that records events for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    events: std::sync::Mutex<Vec<DomainEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
