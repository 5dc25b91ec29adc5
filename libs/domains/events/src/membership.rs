//! Membership and authorization rules over an event's participant list.
//!
//! Every mutating operation builds a [`Membership`] from the stored
//! participants, which also re-checks the list invariants: user IDs are
//! unique and exactly one participant is the organizer.

use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::models::{Event, Participant, ParticipantRole};

/// A caller's standing within one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Organizer,
    Attendee,
    NonMember,
}

impl From<ParticipantRole> for MemberRole {
    fn from(role: ParticipantRole) -> Self {
        match role {
            ParticipantRole::Organizer => Self::Organizer,
            ParticipantRole::Attendee => Self::Attendee,
        }
    }
}

/// Actions reserved for the organizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizerAction {
    Update,
    Delete,
    Invite,
    ViewAttendees,
}

impl OrganizerAction {
    pub fn denied_message(self) -> &'static str {
        match self {
            Self::Update => "Only event organizers can update events",
            Self::Delete => "Only event organizers can delete events",
            Self::Invite => "Only event organizers can invite users",
            Self::ViewAttendees => "Only event organizers can view attendees",
        }
    }
}

pub const NOT_INVITED: &str = "User is not invited to this event";

/// Ordered user ID to role mapping for one event
#[derive(Debug, Clone)]
pub struct Membership {
    event_id: Uuid,
    members: Vec<(Uuid, ParticipantRole)>,
}

impl Membership {
    /// Build from a stored participant list.
    ///
    /// A list with duplicate users or without exactly one organizer means the
    /// document was corrupted outside this service and is reported as internal.
    pub fn from_participants(event_id: Uuid, participants: &[Participant]) -> EventResult<Self> {
        let mut seen = HashSet::with_capacity(participants.len());
        let mut organizers = 0;

        for participant in participants {
            if !seen.insert(participant.user_id) {
                return Err(EventError::Internal(format!(
                    "Event {} lists user {} more than once",
                    event_id, participant.user_id
                )));
            }
            if participant.role == ParticipantRole::Organizer {
                organizers += 1;
            }
        }

        if organizers != 1 {
            return Err(EventError::Internal(format!(
                "Event {} has {} organizers",
                event_id, organizers
            )));
        }

        Ok(Self {
            event_id,
            members: participants.iter().map(|p| (p.user_id, p.role)).collect(),
        })
    }

    pub fn of(event: &Event) -> EventResult<Self> {
        Self::from_participants(event.id, &event.participants)
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn role_of(&self, user_id: Uuid) -> MemberRole {
        self.members
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, role)| MemberRole::from(*role))
            .unwrap_or(MemberRole::NonMember)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.role_of(user_id) != MemberRole::NonMember
    }

    pub fn organizer(&self) -> Option<Uuid> {
        self.members
            .iter()
            .find(|(_, role)| *role == ParticipantRole::Organizer)
            .map(|(id, _)| *id)
    }

    /// Attendee user IDs in list order.
    pub fn attendees(&self) -> Vec<Uuid> {
        self.members
            .iter()
            .filter(|(_, role)| *role == ParticipantRole::Attendee)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn require_organizer(&self, user_id: Uuid, action: OrganizerAction) -> EventResult<()> {
        match self.role_of(user_id) {
            MemberRole::Organizer => Ok(()),
            _ => Err(EventError::Forbidden(action.denied_message().to_string())),
        }
    }

    /// Any role qualifies.
    pub fn require_participant(&self, user_id: Uuid) -> EventResult<()> {
        if self.is_member(user_id) {
            Ok(())
        } else {
            Err(EventError::Forbidden(NOT_INVITED.to_string()))
        }
    }

    /// Attendee entries for the candidates that are not members yet,
    /// first occurrence order, duplicates dropped.
    pub fn add_attendees(&self, candidates: &[Uuid]) -> Vec<Participant> {
        let mut taken: HashSet<Uuid> = self.members.iter().map(|(id, _)| *id).collect();

        candidates
            .iter()
            .filter(|id| taken.insert(**id))
            .map(|id| Participant::attendee(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(organizer: Uuid, attendees: &[Uuid]) -> Membership {
        let mut participants = vec![Participant::organizer(organizer)];
        participants.extend(attendees.iter().map(|id| Participant::attendee(*id)));
        Membership::from_participants(Uuid::now_v7(), &participants).unwrap()
    }

    #[test]
    fn test_role_of() {
        let (organizer, attendee, stranger) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let m = membership(organizer, &[attendee]);

        assert_eq!(m.role_of(organizer), MemberRole::Organizer);
        assert_eq!(m.role_of(attendee), MemberRole::Attendee);
        assert_eq!(m.role_of(stranger), MemberRole::NonMember);
        assert!(m.is_member(attendee));
        assert!(!m.is_member(stranger));
        assert_eq!(m.organizer(), Some(organizer));
        assert_eq!(m.attendees(), vec![attendee]);
    }

    #[test]
    fn test_require_organizer_messages() {
        let (organizer, attendee) = (Uuid::now_v7(), Uuid::now_v7());
        let m = membership(organizer, &[attendee]);

        assert!(m.require_organizer(organizer, OrganizerAction::Delete).is_ok());

        for action in [
            OrganizerAction::Update,
            OrganizerAction::Delete,
            OrganizerAction::Invite,
            OrganizerAction::ViewAttendees,
        ] {
            match m.require_organizer(attendee, action) {
                Err(EventError::Forbidden(msg)) => assert_eq!(msg, action.denied_message()),
                other => panic!("expected Forbidden, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_require_participant() {
        let (organizer, attendee) = (Uuid::now_v7(), Uuid::now_v7());
        let m = membership(organizer, &[attendee]);

        assert!(m.require_participant(organizer).is_ok());
        assert!(m.require_participant(attendee).is_ok());
        assert!(matches!(
            m.require_participant(Uuid::now_v7()),
            Err(EventError::Forbidden(msg)) if msg == NOT_INVITED
        ));
    }

    #[test]
    fn test_add_attendees_skips_members_and_duplicates() {
        let (organizer, existing) = (Uuid::now_v7(), Uuid::now_v7());
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let m = membership(organizer, &[existing]);

        let added = m.add_attendees(&[organizer, a, existing, b, a]);

        assert_eq!(added, vec![Participant::attendee(a), Participant::attendee(b)]);
        assert!(m.add_attendees(&[organizer, existing]).is_empty());
    }

    #[test]
    fn test_invariants_checked() {
        let (organizer, other) = (Uuid::now_v7(), Uuid::now_v7());
        let event_id = Uuid::now_v7();

        let duplicate = [Participant::organizer(organizer), Participant::attendee(organizer)];
        assert!(matches!(
            Membership::from_participants(event_id, &duplicate),
            Err(EventError::Internal(_))
        ));

        let two_organizers = [Participant::organizer(organizer), Participant::organizer(other)];
        assert!(Membership::from_participants(event_id, &two_organizers).is_err());

        let none = [Participant::attendee(other)];
        assert!(Membership::from_participants(event_id, &none).is_err());
    }
}
