//! Event domain models

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{EventError, EventResult};

/// Role a participant holds within one event
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ParticipantRole {
    Organizer,
    Attendee,
}

/// A user's membership entry, embedded in its event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    #[serde(with = "database::mongodb::uuid_as_binary")]
    pub user_id: Uuid,
    pub role: ParticipantRole,
}

impl Participant {
    pub fn organizer(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ParticipantRole::Organizer,
        }
    }

    pub fn attendee(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ParticipantRole::Attendee,
        }
    }
}

/// Scheduled event with its participant list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Unique identifier
    #[serde(rename = "_id", alias = "id", with = "database::mongodb::uuid_as_binary")]
    pub id: Uuid,

    pub title: String,

    pub description: String,

    /// Calendar day, `YYYY-MM-DD`
    #[schema(example = "2030-06-01")]
    pub date: String,

    /// Local clock time, `HH:MM`
    #[schema(example = "09:30")]
    pub time: String,

    pub location: String,

    /// Ordered membership list; exactly one organizer
    #[serde(default)]
    pub participants: Vec<Participant>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// New event organized by `owner_id`.
    pub fn new(owner_id: Uuid, input: CreateEvent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            description: input.description,
            date: input.date,
            time: input.time,
            location: input.location,
            participants: vec![Participant::organizer(owner_id)],
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the present fields of `update`.
    pub fn apply(&mut self, update: &UpdateEvent, updated_at: DateTime<Utc>) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(date) = &update.date {
            self.date = date.clone();
        }
        if let Some(time) = &update.time {
            self.time = time.clone();
        }
        if let Some(location) = &update.location {
            self.location = location.clone();
        }
        self.updated_at = updated_at;
    }
}

/// DTO for creating events
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,

    /// `YYYY-MM-DD`, today or later
    #[schema(example = "2030-06-01")]
    pub date: String,

    /// `HH:MM`
    #[schema(example = "09:30")]
    pub time: String,

    #[validate(length(min = 5, max = 500, message = "Location must be between 5 and 500 characters"))]
    pub location: String,
}

/// DTO for partial updates; absent fields stay untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 5, max = 500, message = "Location must be between 5 and 500 characters"))]
    pub location: Option<String>,
}

/// Users to add as attendees
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InviteUsers {
    #[validate(length(min = 1, message = "At least one user ID is required"))]
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InviteResult {
    /// Number of users newly added
    pub invited_count: usize,
    /// IDs newly added, in request order
    pub invited: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResult {
    pub id: Uuid,
    pub deleted: bool,
    /// Attendance responses removed with the event
    pub responses_deleted: u64,
    /// Set when response cleanup failed after the event was removed
    pub cascade_failed: bool,
}

/// Declared attendance intent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Going,
    Maybe,
    NotGoing,
}

/// A participant's stored response (RSVP)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    #[serde(rename = "_id", alias = "id", with = "database::mongodb::uuid_as_binary")]
    pub id: Uuid,
    #[serde(with = "database::mongodb::uuid_as_binary")]
    pub event_id: Uuid,
    #[serde(with = "database::mongodb::uuid_as_binary")]
    pub user_id: Uuid,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitResponse {
    pub status: AttendanceStatus,
}

/// Attendance state including the unstored "no response yet"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeStatus {
    Going,
    Maybe,
    NotGoing,
    NoResponse,
}

impl From<AttendanceStatus> for AttendeeStatus {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Going => Self::Going,
            AttendanceStatus::Maybe => Self::Maybe,
            AttendanceStatus::NotGoing => Self::NotGoing,
        }
    }
}

/// The caller's own response, or `{"status": "no_response"}`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum OwnResponse {
    Responded(AttendanceResponse),
    NoResponse { status: AttendeeStatus },
}

impl OwnResponse {
    pub fn none() -> Self {
        Self::NoResponse {
            status: AttendeeStatus::NoResponse,
        }
    }

    pub fn status(&self) -> AttendeeStatus {
        match self {
            Self::Responded(response) => response.status.into(),
            Self::NoResponse { status } => *status,
        }
    }
}

/// Optional status filter for the organizer's response list
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResponseFilter {
    pub status: Option<AttendanceStatus>,
}

/// Display data resolved for a user ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Search criteria; every field is optional and blank strings are ignored
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema, IntoParams,
)]
#[into_params(parameter_in = Query)]
pub struct EventSearch {
    /// Case-insensitive match on title or description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Inclusive lower bound, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Inclusive upper bound, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// `organizer` or `attendee`
    #[serde(default, alias = "user_role", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Case-insensitive match on location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Result cap, default 100, at most 500
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchResults {
    /// Criteria as applied
    pub filters: EventSearch,
    pub total_results: usize,
    pub events: Vec<Event>,
}

/// Day against which event dates are checked
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accept `YYYY-MM-DD` dates that are not before `today`.
pub fn validate_event_date(date: &str, today: NaiveDate) -> EventResult<()> {
    let parsed = (date.len() == 10)
        .then(|| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .flatten()
        .ok_or_else(|| {
            EventError::Validation("Invalid date format, expected YYYY-MM-DD".to_string())
        })?;

    if parsed < today {
        return Err(EventError::Validation(
            "Event date cannot be in the past".to_string(),
        ));
    }

    Ok(())
}
