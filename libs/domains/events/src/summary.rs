//! Attendance summary for an event's organizer.
//!
//! Joins the attendee participants with their stored responses and their
//! profiles from the [`UserDirectory`](crate::directory::UserDirectory).
//! Counts always cover every attendee; attendees whose profile cannot be
//! resolved are left out of the itemized list and counted in `unresolved`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::EventResult;
use crate::membership::{Membership, OrganizerAction};
use crate::models::{AttendanceResponse, AttendeeStatus, UserProfile};
use crate::repository::{EventRepository, ResponseRepository};
use crate::service::EventService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendeeEntry {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub status: AttendeeStatus,
    /// When the response was last changed; absent without a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendeeSummary {
    pub event_id: Uuid,
    pub going: usize,
    pub maybe: usize,
    pub not_going: usize,
    pub no_response: usize,
    /// Number of attendee participants, organizer excluded
    pub total: usize,
    /// Attendees without a resolvable profile
    pub unresolved: usize,
    pub attendees: Vec<AttendeeEntry>,
}

/// Build the summary from already loaded data.
pub fn summarize(
    membership: &Membership,
    responses: &[AttendanceResponse],
    profiles: &[UserProfile],
) -> AttendeeSummary {
    let by_user: HashMap<Uuid, &AttendanceResponse> =
        responses.iter().map(|r| (r.user_id, r)).collect();
    let profiles: HashMap<Uuid, &UserProfile> = profiles.iter().map(|p| (p.id, p)).collect();

    let attendee_ids = membership.attendees();
    let mut summary = AttendeeSummary {
        event_id: membership.event_id(),
        going: 0,
        maybe: 0,
        not_going: 0,
        no_response: 0,
        total: attendee_ids.len(),
        unresolved: 0,
        attendees: Vec::with_capacity(attendee_ids.len()),
    };

    for user_id in attendee_ids {
        let response = by_user.get(&user_id);
        let status = response.map_or(AttendeeStatus::NoResponse, |r| r.status.into());

        match status {
            AttendeeStatus::Going => summary.going += 1,
            AttendeeStatus::Maybe => summary.maybe += 1,
            AttendeeStatus::NotGoing => summary.not_going += 1,
            AttendeeStatus::NoResponse => summary.no_response += 1,
        }

        let Some(profile) = profiles.get(&user_id) else {
            summary.unresolved += 1;
            continue;
        };

        summary.attendees.push(AttendeeEntry {
            user_id,
            name: profile.name.clone(),
            email: profile.email.clone(),
            status,
            responded_at: response.map(|r| r.updated_at),
        });
    }

    summary
}

impl<E: EventRepository, R: ResponseRepository> EventService<E, R> {
    /// Attendance summary of the event; organizer only
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn summary(&self, event_id: Uuid, caller: Uuid) -> EventResult<AttendeeSummary> {
        let (_, membership) = self.load(event_id).await?;
        membership.require_organizer(caller, OrganizerAction::ViewAttendees)?;

        let responses = self
            .store(self.responses.list_for_event(event_id, None))
            .await?;
        let attendees = membership.attendees();
        let profiles = self.store(self.directory.profiles(&attendees)).await?;

        let summary = summarize(&membership, &responses, &profiles);
        if summary.unresolved > 0 {
            tracing::warn!(
                unresolved = summary.unresolved,
                "Attendees without a resolvable profile left out of the summary"
            );
        }
        Ok(summary)
    }
}
