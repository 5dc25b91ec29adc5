//! Storage traits for events and attendance responses, plus in-memory
//! implementations used by tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::EventResult;
use crate::models::{AttendanceResponse, AttendanceStatus, Event, Participant, UpdateEvent};
use crate::query::EventQuery;

/// Persistence for events and their embedded participants
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert(&self, event: Event) -> EventResult<Event>;

    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>>;

    /// Events matching `query`, ordered by date then creation.
    async fn find(&self, query: &EventQuery) -> EventResult<Vec<Event>>;

    /// Write the present fields and `updated_at` in one step; `None` if the
    /// event no longer exists.
    async fn update_fields(
        &self,
        id: Uuid,
        update: &UpdateEvent,
        updated_at: DateTime<Utc>,
    ) -> EventResult<Option<Event>>;

    /// Append `participants` only if none of them is a member yet.
    ///
    /// Returns `false` when the event is gone or one of the users joined
    /// concurrently; nothing is written in that case.
    async fn add_participants(
        &self,
        id: Uuid,
        participants: &[Participant],
        updated_at: DateTime<Utc>,
    ) -> EventResult<bool>;

    async fn delete(&self, id: Uuid) -> EventResult<bool>;
}

/// Outcome of an attendance upsert
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub response: AttendanceResponse,
    /// `true` when no response existed for the pair before
    pub created: bool,
}

/// Persistence for attendance responses, one per (event, user)
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Atomically create or overwrite the pair's response. `created_at` and
    /// the ID are only set on creation.
    async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> EventResult<UpsertOutcome>;

    async fn find_one(&self, event_id: Uuid, user_id: Uuid)
    -> EventResult<Option<AttendanceResponse>>;

    /// Responses for the event in insertion order.
    async fn list_for_event(
        &self,
        event_id: Uuid,
        status: Option<AttendanceStatus>,
    ) -> EventResult<Vec<AttendanceResponse>>;

    /// Remove every response of the event, returning how many went.
    async fn delete_for_event(&self, event_id: Uuid) -> EventResult<u64>;
}

/// In-memory implementation of EventRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: Event) -> EventResult<Event> {
        let mut events = self.events.write().await;
        events.insert(event.id, event.clone());

        tracing::debug!(event_id = %event.id, "Stored event");
        Ok(event)
    }

    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.get(&id).cloned())
    }

    async fn find(&self, query: &EventQuery) -> EventResult<Vec<Event>> {
        let events = self.events.read().await;

        let mut result: Vec<Event> = events
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();

        result.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        result.truncate(query.limit as usize);

        Ok(result)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        update: &UpdateEvent,
        updated_at: DateTime<Utc>,
    ) -> EventResult<Option<Event>> {
        let mut events = self.events.write().await;

        Ok(events.get_mut(&id).map(|event| {
            event.apply(update, updated_at);
            event.clone()
        }))
    }

    async fn add_participants(
        &self,
        id: Uuid,
        participants: &[Participant],
        updated_at: DateTime<Utc>,
    ) -> EventResult<bool> {
        let mut events = self.events.write().await;

        let Some(event) = events.get_mut(&id) else {
            return Ok(false);
        };

        let clash = participants
            .iter()
            .any(|new| event.participants.iter().any(|p| p.user_id == new.user_id));
        if clash {
            return Ok(false);
        }

        event.participants.extend_from_slice(participants);
        event.updated_at = updated_at;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        let mut events = self.events.write().await;
        Ok(events.remove(&id).is_some())
    }
}

/// In-memory implementation of ResponseRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryResponseRepository {
    responses: Arc<RwLock<HashMap<(Uuid, Uuid), AttendanceResponse>>>,
}

impl InMemoryResponseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored responses across all events.
    pub async fn len(&self) -> usize {
        self.responses.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.responses.read().await.is_empty()
    }
}

#[async_trait]
impl ResponseRepository for InMemoryResponseRepository {
    async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> EventResult<UpsertOutcome> {
        let mut responses = self.responses.write().await;

        if let Some(existing) = responses.get_mut(&(event_id, user_id)) {
            existing.status = status;
            existing.updated_at = now;
            return Ok(UpsertOutcome {
                response: existing.clone(),
                created: false,
            });
        }

        let response = AttendanceResponse {
            id: Uuid::now_v7(),
            event_id,
            user_id,
            status,
            created_at: now,
            updated_at: now,
        };
        responses.insert((event_id, user_id), response.clone());

        Ok(UpsertOutcome {
            response,
            created: true,
        })
    }

    async fn find_one(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> EventResult<Option<AttendanceResponse>> {
        let responses = self.responses.read().await;
        Ok(responses.get(&(event_id, user_id)).cloned())
    }

    async fn list_for_event(
        &self,
        event_id: Uuid,
        status: Option<AttendanceStatus>,
    ) -> EventResult<Vec<AttendanceResponse>> {
        let responses = self.responses.read().await;

        let mut result: Vec<AttendanceResponse> = responses
            .values()
            .filter(|r| r.event_id == event_id && status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();

        // UUIDv7 IDs sort by creation time
        result.sort_by_key(|r| r.id);
        Ok(result)
    }

    async fn delete_for_event(&self, event_id: Uuid) -> EventResult<u64> {
        let mut responses = self.responses.write().await;
        let before = responses.len();
        responses.retain(|(event, _), _| *event != event_id);
        Ok((before - responses.len()) as u64)
    }
}
