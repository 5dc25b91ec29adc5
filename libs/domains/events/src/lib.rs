//! Events Domain
//!
//! Event scheduling core: who may see, change and respond to an event, and
//! how attendance is tracked and summarized.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Request Flow                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  JWT middleware ──► CurrentUser ──► handlers                 │
//! │                                        │                     │
//! │                                        ▼                     │
//! │                                  EventService                │
//! │                    ┌───────────────┼───────────────┐         │
//! │                    ▼               ▼               ▼         │
//! │               Membership      EventQuery       summarize     │
//! │              (role checks)   (filters)      (aggregation)    │
//! │                    │               │               │         │
//! │                    ▼               ▼               ▼         │
//! │           EventRepository  ResponseRepository  UserDirectory │
//! │             (events)        (event_responses)   (users)      │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every store call runs under a deadline (`STORE_TIMEOUT_MS`, 5 s by
//! default) and surfaces as a 503 when it expires.

mod attendance;
mod directory;
mod error;
mod handlers;
mod membership;
mod models;
mod mongodb;
mod query;
mod repository;
mod service;
mod summary;

pub use directory::UserDirectory;
pub use error::{EventError, EventResult};
pub use handlers::{ApiDoc, router};
pub use membership::{MemberRole, Membership, NOT_INVITED, OrganizerAction};
pub use models::{
    AttendanceResponse, AttendanceStatus, AttendeeStatus, CreateEvent, DeleteResult, Event,
    EventSearch, InviteResult, InviteUsers, OwnResponse, Participant, ParticipantRole,
    ResponseFilter, SearchResults, SubmitResponse, UpdateEvent, UserProfile, today,
    validate_event_date,
};
pub use crate::mongodb::{
    EVENTS_COLLECTION, MongoEventRepository, MongoResponseRepository, RESPONSES_COLLECTION,
};
pub use query::{DEFAULT_LIMIT, EventQuery, MAX_LIMIT};
pub use repository::{
    EventRepository, InMemoryEventRepository, InMemoryResponseRepository, ResponseRepository,
    UpsertOutcome,
};
pub use service::{ALREADY_INVITED, DEFAULT_STORE_TIMEOUT, EventService};
pub use summary::{AttendeeEntry, AttendeeSummary, summarize};
