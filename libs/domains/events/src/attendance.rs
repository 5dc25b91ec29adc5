//! Attendance responses (RSVP) for event participants.

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::EventResult;
use crate::membership::OrganizerAction;
use crate::models::{AttendanceResponse, AttendanceStatus, OwnResponse};
use crate::repository::{EventRepository, ResponseRepository};
use crate::service::EventService;

impl<E: EventRepository, R: ResponseRepository> EventService<E, R> {
    /// Record the caller's response, replacing any earlier one.
    ///
    /// Returns the stored response and whether it was newly created.
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn submit_response(
        &self,
        event_id: Uuid,
        caller: Uuid,
        status: AttendanceStatus,
    ) -> EventResult<(AttendanceResponse, bool)> {
        let (_, membership) = self.load(event_id).await?;
        membership.require_participant(caller)?;

        let outcome = self
            .store(self.responses.upsert(event_id, caller, status, Utc::now()))
            .await?;

        tracing::info!(created = outcome.created, %status, "Response recorded");
        Ok((outcome.response, outcome.created))
    }

    /// The caller's own response, or `no_response` when none is stored
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn get_own_response(&self, event_id: Uuid, caller: Uuid) -> EventResult<OwnResponse> {
        let (_, membership) = self.load(event_id).await?;
        membership.require_participant(caller)?;

        Ok(self
            .store(self.responses.find_one(event_id, caller))
            .await?
            .map_or_else(OwnResponse::none, OwnResponse::Responded))
    }

    /// All responses of the event in submission order; organizer only
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn list_responses(
        &self,
        event_id: Uuid,
        caller: Uuid,
        status: Option<AttendanceStatus>,
    ) -> EventResult<Vec<AttendanceResponse>> {
        let (_, membership) = self.load(event_id).await?;
        membership.require_organizer(caller, OrganizerAction::ViewAttendees)?;

        self.store(self.responses.list_for_event(event_id, status))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::EventError;
    use crate::membership::NOT_INVITED;
    use crate::models::{AttendanceStatus, AttendeeStatus, OwnResponse};
    use crate::service::tests::{seeded, service};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_submit_creates_then_updates() {
        let svc = service();
        let (owner, guest) = (Uuid::now_v7(), Uuid::now_v7());
        let event = seeded(&svc, owner, &[guest]).await;

        let (first, created) = svc
            .submit_response(event.id, guest, AttendanceStatus::Maybe)
            .await
            .unwrap();
        assert!(created);

        let (second, created) = svc
            .submit_response(event.id, guest, AttendanceStatus::Going)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.status, AttendanceStatus::Going);

        let listed = svc.list_responses(event.id, owner, None).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_organizer_may_respond() {
        let svc = service();
        let owner = Uuid::now_v7();
        let event = seeded(&svc, owner, &[]).await;

        let (response, _) = svc
            .submit_response(event.id, owner, AttendanceStatus::Going)
            .await
            .unwrap();
        assert_eq!(response.user_id, owner);
    }

    #[tokio::test]
    async fn test_non_member_cannot_respond_or_read() {
        let svc = service();
        let owner = Uuid::now_v7();
        let event = seeded(&svc, owner, &[]).await;
        let stranger = Uuid::now_v7();

        let err = svc
            .submit_response(event.id, stranger, AttendanceStatus::Going)
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Forbidden(msg) if msg == NOT_INVITED));

        let err = svc.get_own_response(event.id, stranger).await.unwrap_err();
        assert!(matches!(err, EventError::Forbidden(_)));

        assert!(svc.responses.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_event_is_not_found() {
        let svc = service();
        let err = svc
            .submit_response(Uuid::now_v7(), Uuid::now_v7(), AttendanceStatus::Going)
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_own_response_defaults_to_no_response() {
        let svc = service();
        let (owner, guest) = (Uuid::now_v7(), Uuid::now_v7());
        let event = seeded(&svc, owner, &[guest]).await;

        let own = svc.get_own_response(event.id, guest).await.unwrap();
        assert_eq!(own.status(), AttendeeStatus::NoResponse);
        assert_eq!(
            serde_json::to_value(&own).unwrap(),
            serde_json::json!({ "status": "no_response" })
        );

        svc.submit_response(event.id, guest, AttendanceStatus::NotGoing)
            .await
            .unwrap();
        let own = svc.get_own_response(event.id, guest).await.unwrap();
        assert!(matches!(own, OwnResponse::Responded(ref r) if r.user_id == guest));
        assert_eq!(own.status(), AttendeeStatus::NotGoing);
    }

    #[tokio::test]
    async fn test_list_is_organizer_only_and_filters() {
        let svc = service();
        let (owner, a, b) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let event = seeded(&svc, owner, &[a, b]).await;

        svc.submit_response(event.id, a, AttendanceStatus::Going).await.unwrap();
        svc.submit_response(event.id, b, AttendanceStatus::Maybe).await.unwrap();

        let err = svc.list_responses(event.id, a, None).await.unwrap_err();
        assert!(
            matches!(err, EventError::Forbidden(msg) if msg == "Only event organizers can view attendees")
        );

        let all: Vec<_> = svc
            .list_responses(event.id, owner, None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(all, vec![a, b]);

        let maybe = svc
            .list_responses(event.id, owner, Some(AttendanceStatus::Maybe))
            .await
            .unwrap();
        assert_eq!(maybe.len(), 1);
        assert_eq!(maybe[0].user_id, b);
    }
}
