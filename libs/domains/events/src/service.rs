use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::directory::UserDirectory;
use crate::error::{EventError, EventResult};
use crate::membership::{Membership, OrganizerAction};
use crate::models::{
    CreateEvent, DeleteResult, Event, EventSearch, InviteResult, InviteUsers, ParticipantRole,
    SearchResults, UpdateEvent, today, validate_event_date,
};
use crate::query::EventQuery;
use crate::repository::{EventRepository, ResponseRepository};

/// Store calls that take longer than this fail with [`EventError::Timeout`]
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5000);

pub const ALREADY_INVITED: &str = "All users are already invited to this event";

/// Service layer for events, attendance responses and summaries
pub struct EventService<E: EventRepository, R: ResponseRepository> {
    pub(crate) events: Arc<E>,
    pub(crate) responses: Arc<R>,
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) store_timeout: Duration,
}

impl<E: EventRepository, R: ResponseRepository> Clone for EventService<E, R> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            responses: Arc::clone(&self.responses),
            directory: Arc::clone(&self.directory),
            store_timeout: self.store_timeout,
        }
    }
}

impl<E: EventRepository, R: ResponseRepository> EventService<E, R> {
    pub fn new(events: E, responses: R, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            events: Arc::new(events),
            responses: Arc::new(responses),
            directory,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Run a store call under the configured deadline.
    pub(crate) async fn store<T>(
        &self,
        op: impl Future<Output = EventResult<T>>,
    ) -> EventResult<T> {
        match tokio::time::timeout(self.store_timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.store_timeout, "Store operation timed out");
                Err(EventError::Timeout(self.store_timeout))
            }
        }
    }

    /// Fetch an event and its membership; NotFound before any role check.
    pub(crate) async fn load(&self, id: Uuid) -> EventResult<(Event, Membership)> {
        let event = self
            .store(self.events.get_by_id(id))
            .await?
            .ok_or(EventError::NotFound(id))?;
        let membership = Membership::of(&event)?;
        Ok((event, membership))
    }

    /// Create an event organized by `owner_id`
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, owner_id: Uuid, input: CreateEvent) -> EventResult<Event> {
        input.validate()?;
        validate_event_date(&input.date, today())?;

        let event = self.store(self.events.insert(Event::new(owner_id, input))).await?;
        tracing::info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    /// Get an event by ID; any authenticated caller may read it
    #[instrument(skip(self), fields(event_id = %id))]
    pub async fn get(&self, id: Uuid) -> EventResult<Event> {
        self.store(self.events.get_by_id(id))
            .await?
            .ok_or(EventError::NotFound(id))
    }

    /// Apply a partial update; organizer only
    #[instrument(skip(self, input), fields(event_id = %id))]
    pub async fn update(&self, id: Uuid, caller: Uuid, input: UpdateEvent) -> EventResult<Event> {
        let (_, membership) = self.load(id).await?;
        membership.require_organizer(caller, OrganizerAction::Update)?;

        input.validate()?;
        if let Some(date) = &input.date {
            validate_event_date(date, today())?;
        }

        self.store(self.events.update_fields(id, &input, Utc::now()))
            .await?
            .ok_or(EventError::NotFound(id))
    }

    /// Delete an event and then its responses; organizer only.
    ///
    /// A failed response cleanup does not fail the delete; it is logged and
    /// reported through `cascade_failed`.
    #[instrument(skip(self), fields(event_id = %id))]
    pub async fn delete(&self, id: Uuid, caller: Uuid) -> EventResult<DeleteResult> {
        let (_, membership) = self.load(id).await?;
        membership.require_organizer(caller, OrganizerAction::Delete)?;

        if !self.store(self.events.delete(id)).await? {
            return Err(EventError::NotFound(id));
        }

        let (responses_deleted, cascade_failed) =
            match self.store(self.responses.delete_for_event(id)).await {
                Ok(count) => (count, false),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to delete responses of deleted event");
                    (0, true)
                }
            };

        tracing::info!(responses_deleted, "Event deleted");
        Ok(DeleteResult {
            id,
            deleted: true,
            responses_deleted,
            cascade_failed,
        })
    }

    /// Add users as attendees; organizer only.
    ///
    /// The store write only applies while none of the new users is a member,
    /// so a concurrent invite triggers one re-read before giving up.
    #[instrument(skip(self, input), fields(event_id = %id))]
    pub async fn invite(
        &self,
        id: Uuid,
        caller: Uuid,
        input: InviteUsers,
    ) -> EventResult<InviteResult> {
        input.validate()?;

        for attempt in 1..=2 {
            let (_, membership) = self.load(id).await?;
            membership.require_organizer(caller, OrganizerAction::Invite)?;

            let added = membership.add_attendees(&input.user_ids);
            if added.is_empty() {
                return Err(EventError::Conflict(ALREADY_INVITED.to_string()));
            }

            if self
                .store(self.events.add_participants(id, &added, Utc::now()))
                .await?
            {
                let invited: Vec<Uuid> = added.iter().map(|p| p.user_id).collect();
                tracing::info!(invited_count = invited.len(), "Users invited");
                return Ok(InviteResult {
                    invited_count: invited.len(),
                    invited,
                });
            }

            tracing::debug!(attempt, "Participants changed during invite, re-reading");
        }

        Err(EventError::Conflict(
            "Event participants changed concurrently, please retry".to_string(),
        ))
    }

    /// Events the user organizes
    #[instrument(skip(self))]
    pub async fn organized(&self, user_id: Uuid) -> EventResult<Vec<Event>> {
        let query = EventQuery::for_member(user_id).with_role(ParticipantRole::Organizer);
        self.store(self.events.find(&query)).await
    }

    /// Events the user is invited to as attendee
    #[instrument(skip(self))]
    pub async fn invited(&self, user_id: Uuid) -> EventResult<Vec<Event>> {
        let query = EventQuery::for_member(user_id).with_role(ParticipantRole::Attendee);
        self.store(self.events.find(&query)).await
    }

    /// Events the user belongs to that match the search criteria
    #[instrument(skip(self))]
    pub async fn search(&self, user_id: Uuid, search: &EventSearch) -> EventResult<SearchResults> {
        let query = EventQuery::from_search(user_id, search)?;
        let events = self.store(self.events.find(&query)).await?;

        Ok(SearchResults {
            filters: query.to_search(),
            total_results: events.len(),
            events,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::directory::MockUserDirectory;
    use crate::models::{AttendanceStatus, Participant};
    use crate::repository::{InMemoryEventRepository, InMemoryResponseRepository};
    use async_trait::async_trait;
    use chrono::{DateTime, Days};

    pub(crate) type TestService = EventService<InMemoryEventRepository, InMemoryResponseRepository>;

    pub(crate) fn service_with(directory: MockUserDirectory) -> TestService {
        EventService::new(
            InMemoryEventRepository::new(),
            InMemoryResponseRepository::new(),
            Arc::new(directory),
        )
    }

    pub(crate) fn service() -> TestService {
        service_with(MockUserDirectory::new())
    }

    pub(crate) fn input(title: &str) -> CreateEvent {
        CreateEvent {
            title: title.to_string(),
            description: "Quarterly planning with the whole team".to_string(),
            date: today()
                .checked_add_days(Days::new(7))
                .unwrap()
                .format("%Y-%m-%d")
                .to_string(),
            time: "10:00".to_string(),
            location: "Conference room A".to_string(),
        }
    }

    /// Event organized by `owner` with `attendees` already invited
    pub(crate) async fn seeded(svc: &TestService, owner: Uuid, attendees: &[Uuid]) -> Event {
        let event = svc.create(owner, input("Planning")).await.unwrap();
        if !attendees.is_empty() {
            svc.invite(
                event.id,
                owner,
                InviteUsers {
                    user_ids: attendees.to_vec(),
                },
            )
            .await
            .unwrap();
        }
        svc.get(event.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_organizer() {
        let svc = service();
        let owner = Uuid::now_v7();

        let event = svc.create(owner, input("Planning")).await.unwrap();

        assert_eq!(event.participants, vec![Participant::organizer(owner)]);
        assert_eq!(svc.get(event.id).await.unwrap().title, "Planning");
    }

    #[tokio::test]
    async fn test_create_rejects_past_date_and_bad_format() {
        let svc = service();
        let owner = Uuid::now_v7();

        let mut past = input("Planning");
        past.date = today()
            .checked_sub_days(Days::new(1))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string();
        let err = svc.create(owner, past).await.unwrap_err();
        assert!(matches!(err, EventError::Validation(msg) if msg.contains("past")));

        let mut malformed = input("Planning");
        malformed.date = "2030/01/01".to_string();
        let err = svc.create(owner, malformed).await.unwrap_err();
        assert!(matches!(err, EventError::Validation(msg) if msg.contains("YYYY-MM-DD")));

        let mut today_input = input("Planning");
        today_input.date = today().format("%Y-%m-%d").to_string();
        assert!(svc.create(owner, today_input).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_short_title() {
        let svc = service();
        let err = svc.create(Uuid::now_v7(), input("ab")).await.unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_missing_event() {
        let svc = service();
        let id = Uuid::now_v7();
        assert!(matches!(svc.get(id).await, Err(EventError::NotFound(got)) if got == id));
    }

    #[tokio::test]
    async fn test_update_by_organizer_only() {
        let svc = service();
        let (owner, attendee) = (Uuid::now_v7(), Uuid::now_v7());
        let event = seeded(&svc, owner, &[attendee]).await;

        let change = UpdateEvent {
            title: Some("Renamed meeting".to_string()),
            ..Default::default()
        };

        let err = svc.update(event.id, attendee, change.clone()).await.unwrap_err();
        assert!(
            matches!(err, EventError::Forbidden(msg) if msg == "Only event organizers can update events")
        );

        let invalid = UpdateEvent {
            title: Some("x".to_string()),
            ..Default::default()
        };
        let err = svc.update(event.id, attendee, invalid).await.unwrap_err();
        assert!(matches!(err, EventError::Forbidden(_)));
        assert_eq!(svc.get(event.id).await.unwrap().title, event.title);

        let updated = svc.update(event.id, owner, change).await.unwrap();
        assert_eq!(updated.title, "Renamed meeting");
        assert_eq!(updated.description, event.description);
        assert_eq!(updated.participants, event.participants);
        assert!(updated.updated_at >= event.updated_at);
    }

    #[tokio::test]
    async fn test_update_not_found_wins_over_forbidden() {
        let svc = service();
        let err = svc
            .update(Uuid::now_v7(), Uuid::now_v7(), UpdateEvent::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_revalidates_present_date() {
        let svc = service();
        let owner = Uuid::now_v7();
        let event = seeded(&svc, owner, &[]).await;

        let err = svc
            .update(
                event.id,
                owner,
                UpdateEvent {
                    date: Some("2000-01-01".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));

        let untouched = svc.update(event.id, owner, UpdateEvent::default()).await.unwrap();
        assert_eq!(untouched.date, event.date);
    }

    #[tokio::test]
    async fn test_invite_adds_only_new_members() {
        let svc = service();
        let (owner, a, b) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let event = seeded(&svc, owner, &[a]).await;

        let result = svc
            .invite(
                event.id,
                owner,
                InviteUsers {
                    user_ids: vec![a, b, b, owner],
                },
            )
            .await
            .unwrap();

        assert_eq!(result.invited_count, 1);
        assert_eq!(result.invited, vec![b]);

        let stored = svc.get(event.id).await.unwrap();
        assert_eq!(
            stored.participants,
            vec![
                Participant::organizer(owner),
                Participant::attendee(a),
                Participant::attendee(b)
            ]
        );
    }

    #[tokio::test]
    async fn test_invite_conflict_and_permissions() {
        let svc = service();
        let (owner, a) = (Uuid::now_v7(), Uuid::now_v7());
        let event = seeded(&svc, owner, &[a]).await;

        let err = svc
            .invite(event.id, owner, InviteUsers { user_ids: vec![a] })
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Conflict(msg) if msg == ALREADY_INVITED));

        let err = svc
            .invite(
                event.id,
                a,
                InviteUsers {
                    user_ids: vec![Uuid::now_v7()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Forbidden(_)));

        let err = svc
            .invite(event.id, owner, InviteUsers { user_ids: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_responses() {
        let svc = service();
        let (owner, a) = (Uuid::now_v7(), Uuid::now_v7());
        let event = seeded(&svc, owner, &[a]).await;

        svc.submit_response(event.id, a, AttendanceStatus::Going)
            .await
            .unwrap();

        let err = svc.delete(event.id, a).await.unwrap_err();
        assert!(
            matches!(err, EventError::Forbidden(msg) if msg == "Only event organizers can delete events")
        );

        let result = svc.delete(event.id, owner).await.unwrap();
        assert!(result.deleted);
        assert_eq!(result.responses_deleted, 1);
        assert!(!result.cascade_failed);

        assert!(matches!(svc.get(event.id).await, Err(EventError::NotFound(_))));
        assert!(svc.responses.is_empty().await);
    }

    /// Response store whose cascade delete always fails
    struct BrokenCascade(InMemoryResponseRepository);

    #[async_trait]
    impl ResponseRepository for BrokenCascade {
        async fn upsert(
            &self,
            event_id: Uuid,
            user_id: Uuid,
            status: AttendanceStatus,
            now: DateTime<Utc>,
        ) -> EventResult<crate::repository::UpsertOutcome> {
            self.0.upsert(event_id, user_id, status, now).await
        }

        async fn find_one(
            &self,
            event_id: Uuid,
            user_id: Uuid,
        ) -> EventResult<Option<crate::models::AttendanceResponse>> {
            self.0.find_one(event_id, user_id).await
        }

        async fn list_for_event(
            &self,
            event_id: Uuid,
            status: Option<AttendanceStatus>,
        ) -> EventResult<Vec<crate::models::AttendanceResponse>> {
            self.0.list_for_event(event_id, status).await
        }

        async fn delete_for_event(&self, _event_id: Uuid) -> EventResult<u64> {
            Err(EventError::Database("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_delete_survives_cascade_failure() {
        let svc = EventService::new(
            InMemoryEventRepository::new(),
            BrokenCascade(InMemoryResponseRepository::new()),
            Arc::new(MockUserDirectory::new()),
        );
        let owner = Uuid::now_v7();
        let event = svc.create(owner, input("Planning")).await.unwrap();

        let result = svc.delete(event.id, owner).await.unwrap();
        assert!(result.deleted);
        assert!(result.cascade_failed);
        assert!(matches!(svc.get(event.id).await, Err(EventError::NotFound(_))));
    }

    /// Event store that never answers
    struct Stalled;

    #[async_trait]
    impl EventRepository for Stalled {
        async fn insert(&self, _event: Event) -> EventResult<Event> {
            std::future::pending().await
        }
        async fn get_by_id(&self, _id: Uuid) -> EventResult<Option<Event>> {
            std::future::pending().await
        }
        async fn find(&self, _query: &EventQuery) -> EventResult<Vec<Event>> {
            std::future::pending().await
        }
        async fn update_fields(
            &self,
            _id: Uuid,
            _update: &UpdateEvent,
            _updated_at: DateTime<Utc>,
        ) -> EventResult<Option<Event>> {
            std::future::pending().await
        }
        async fn add_participants(
            &self,
            _id: Uuid,
            _participants: &[Participant],
            _updated_at: DateTime<Utc>,
        ) -> EventResult<bool> {
            std::future::pending().await
        }
        async fn delete(&self, _id: Uuid) -> EventResult<bool> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_store_timeout() {
        let svc = EventService::new(
            Stalled,
            InMemoryResponseRepository::new(),
            Arc::new(MockUserDirectory::new()),
        )
        .with_timeout(Duration::from_millis(20));

        let err = svc.get(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, EventError::Timeout(after) if after == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_organized_invited_and_search() {
        let svc = service();
        let (owner, guest) = (Uuid::now_v7(), Uuid::now_v7());

        let planning = seeded(&svc, owner, &[guest]).await;
        let mut other = input("Retro with snacks");
        other.location = "Roof terrace".to_string();
        let retro = svc.create(guest, other).await.unwrap();

        let organized: Vec<_> = svc.organized(owner).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(organized, vec![planning.id]);

        let invited: Vec<_> = svc.invited(guest).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(invited, vec![planning.id]);

        let all = svc.search(guest, &EventSearch::default()).await.unwrap();
        assert_eq!(all.total_results, 2);

        let by_keyword = svc
            .search(
                guest,
                &EventSearch {
                    keyword: Some("RETRO".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_keyword.total_results, 1);
        assert_eq!(by_keyword.events[0].id, retro.id);
        assert_eq!(by_keyword.filters.keyword.as_deref(), Some("RETRO"));

        let by_role = svc
            .search(
                guest,
                &EventSearch {
                    role: Some("organizer".to_string()),
                    location: Some("terrace".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_role.total_results, 1);

        let err = svc
            .search(
                guest,
                &EventSearch {
                    role: Some("host".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));

        let outsider = svc.search(Uuid::now_v7(), &EventSearch::default()).await.unwrap();
        assert_eq!(outsider.total_results, 0);
    }
}
