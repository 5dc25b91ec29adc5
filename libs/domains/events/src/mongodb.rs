//! MongoDB implementations of EventRepository and ResponseRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use database::mongodb::{is_duplicate_key, uuid_bson};
use mongodb::bson::{Bson, Document, doc, to_bson};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::models::{AttendanceResponse, AttendanceStatus, Event, Participant, UpdateEvent};
use crate::query::EventQuery;
use crate::repository::{EventRepository, ResponseRepository, UpsertOutcome};

pub const EVENTS_COLLECTION: &str = "events";
pub const RESPONSES_COLLECTION: &str = "event_responses";

fn id_filter(id: Uuid) -> Document {
    doc! { "_id": uuid_bson(id) }
}

fn participant_document(participant: &Participant) -> Document {
    doc! {
        "user_id": uuid_bson(participant.user_id),
        "role": participant.role.to_string(),
    }
}

/// MongoDB-based event repository
#[derive(Clone)]
pub struct MongoEventRepository {
    collection: Collection<Event>,
}

impl MongoEventRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(EVENTS_COLLECTION),
        }
    }

    /// Create indexes for membership lookups and date ordering
    pub async fn create_indexes(&self) -> EventResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "participants.user_id": 1 })
                .build(),
            IndexModel::builder().keys(doc! { "date": 1 }).build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    fn set_document(update: &UpdateEvent, updated_at: DateTime<Utc>) -> EventResult<Document> {
        let mut set = doc! { "updated_at": to_bson(&updated_at)? };

        let fields = [
            ("title", &update.title),
            ("description", &update.description),
            ("date", &update.date),
            ("time", &update.time),
            ("location", &update.location),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                set.insert(key, value.as_str());
            }
        }

        Ok(set)
    }

    /// Matches the event only while none of `participants` is on it yet.
    fn invite_filter(id: Uuid, participants: &[Participant]) -> Document {
        let user_ids: Vec<Bson> = participants.iter().map(|p| uuid_bson(p.user_id)).collect();
        doc! {
            "_id": uuid_bson(id),
            "participants.user_id": { "$nin": user_ids },
        }
    }

    fn invite_update(
        participants: &[Participant],
        updated_at: DateTime<Utc>,
    ) -> EventResult<Document> {
        let entries: Vec<Document> = participants.iter().map(participant_document).collect();
        Ok(doc! {
            "$push": { "participants": { "$each": entries } },
            "$set": { "updated_at": to_bson(&updated_at)? },
        })
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn insert(&self, event: Event) -> EventResult<Event> {
        self.collection.insert_one(&event).await?;
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        Ok(self.collection.find_one(id_filter(id)).await?)
    }

    #[instrument(skip(self))]
    async fn find(&self, query: &EventQuery) -> EventResult<Vec<Event>> {
        let cursor = self
            .collection
            .find(query.to_document()?)
            .sort(doc! { "date": 1, "_id": 1 })
            .limit(i64::from(query.limit))
            .await?;

        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self, update))]
    async fn update_fields(
        &self,
        id: Uuid,
        update: &UpdateEvent,
        updated_at: DateTime<Utc>,
    ) -> EventResult<Option<Event>> {
        let change = doc! { "$set": Self::set_document(update, updated_at)? };

        Ok(self
            .collection
            .find_one_and_update(id_filter(id), change)
            .return_document(ReturnDocument::After)
            .await?)
    }

    #[instrument(skip(self, participants), fields(count = participants.len()))]
    async fn add_participants(
        &self,
        id: Uuid,
        participants: &[Participant],
        updated_at: DateTime<Utc>,
    ) -> EventResult<bool> {
        let filter = Self::invite_filter(id, participants);
        let change = Self::invite_update(participants, updated_at)?;

        let result = self.collection.update_one(filter, change).await?;
        Ok(result.matched_count == 1)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        let result = self
            .collection
            .delete_one(id_filter(id))
            .await?;
        Ok(result.deleted_count > 0)
    }
}

/// MongoDB-based attendance response repository
#[derive(Clone)]
pub struct MongoResponseRepository {
    collection: Collection<AttendanceResponse>,
}

impl MongoResponseRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(RESPONSES_COLLECTION),
        }
    }

    /// Create the unique (event, user) index the upsert relies on
    pub async fn create_indexes(&self) -> EventResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "event_id": 1, "user_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    fn pair_filter(event_id: Uuid, user_id: Uuid) -> Document {
        doc! {
            "event_id": uuid_bson(event_id),
            "user_id": uuid_bson(user_id),
        }
    }

    /// Status always; id and creation time only when the upsert inserts.
    fn upsert_update(
        status: AttendanceStatus,
        new_id: Uuid,
        now: DateTime<Utc>,
    ) -> EventResult<Document> {
        Ok(doc! {
            "$set": {
                "status": to_bson(&status)?,
                "updated_at": to_bson(&now)?,
            },
            "$setOnInsert": {
                "_id": uuid_bson(new_id),
                "created_at": to_bson(&now)?,
            },
        })
    }
}

#[async_trait]
impl ResponseRepository for MongoResponseRepository {
    #[instrument(skip(self))]
    async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> EventResult<UpsertOutcome> {
        // Two concurrent first writes race on the unique index; the loser
        // retries and lands on the winner's document as an update.
        let mut attempt = 0;
        loop {
            attempt += 1;
            let new_id = Uuid::now_v7();
            let change = Self::upsert_update(status, new_id, now)?;

            let result = self
                .collection
                .find_one_and_update(Self::pair_filter(event_id, user_id), change)
                .upsert(true)
                .return_document(ReturnDocument::After)
                .await;

            match result {
                Ok(Some(response)) => {
                    let created = response.id == new_id;
                    return Ok(UpsertOutcome { response, created });
                }
                Ok(None) => {
                    return Err(EventError::Internal(
                        "Upsert returned no document".to_string(),
                    ));
                }
                Err(e) if attempt == 1 && is_duplicate_key(&e) => {
                    tracing::debug!(%event_id, %user_id, "Concurrent response insert, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_one(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> EventResult<Option<AttendanceResponse>> {
        Ok(self
            .collection
            .find_one(Self::pair_filter(event_id, user_id))
            .await?)
    }

    #[instrument(skip(self))]
    async fn list_for_event(
        &self,
        event_id: Uuid,
        status: Option<AttendanceStatus>,
    ) -> EventResult<Vec<AttendanceResponse>> {
        let mut filter = doc! { "event_id": uuid_bson(event_id) };
        if let Some(status) = status {
            filter.insert("status", to_bson(&status)?);
        }

        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn delete_for_event(&self, event_id: Uuid) -> EventResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "event_id": uuid_bson(event_id) })
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateEvent;
    use mongodb::bson::to_raw_document_buf;

    /// Document as the driver writes it on insert.
    fn stored<T: serde::Serialize>(value: &T) -> Document {
        to_raw_document_buf(value).unwrap().to_document().unwrap()
    }

    fn event(owner: Uuid) -> Event {
        Event::new(
            owner,
            CreateEvent {
                title: "Quarterly planning".to_string(),
                description: "Roadmap review with the whole team".to_string(),
                date: "2030-03-01".to_string(),
                time: "14:00".to_string(),
                location: "Room 4".to_string(),
            },
        )
    }

    #[test]
    fn test_stored_event_ids_match_filters() {
        let owner = Uuid::now_v7();
        let event = event(owner);
        let written = stored(&event);

        assert_eq!(written.get("_id"), id_filter(event.id).get("_id"));

        let participants = written.get_array("participants").unwrap();
        let organizer = participants[0].as_document().unwrap();
        assert_eq!(organizer.get("user_id"), Some(&uuid_bson(owner)));
        assert_eq!(organizer.get_str("role").unwrap(), "organizer");

        let query = EventQuery::for_member(owner).to_document().unwrap();
        let member = query
            .get_document("participants")
            .and_then(|p| p.get_document("$elemMatch"))
            .unwrap();
        assert_eq!(member.get("user_id"), organizer.get("user_id"));
    }

    #[test]
    fn test_invite_filter_excludes_existing_members() {
        let (event_id, a, b) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let filter = MongoEventRepository::invite_filter(
            event_id,
            &[Participant::attendee(a), Participant::attendee(b)],
        );

        assert_eq!(
            filter,
            doc! {
                "_id": uuid_bson(event_id),
                "participants.user_id": { "$nin": [uuid_bson(a), uuid_bson(b)] },
            }
        );
    }

    #[test]
    fn test_invite_update_pushes_entries_as_stored() {
        let guest = Participant::attendee(Uuid::now_v7());
        let change = MongoEventRepository::invite_update(&[guest], Utc::now()).unwrap();

        let pushed = change
            .get_document("$push")
            .and_then(|p| p.get_document("participants"))
            .and_then(|p| p.get_array("$each"))
            .unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].as_document().unwrap(), &stored(&guest));

        assert!(change.get_document("$set").unwrap().contains_key("updated_at"));
    }

    #[test]
    fn test_upsert_update_sets_identity_only_on_insert() {
        let new_id = Uuid::now_v7();
        let change =
            MongoResponseRepository::upsert_update(AttendanceStatus::NotGoing, new_id, Utc::now())
                .unwrap();

        let set = change.get_document("$set").unwrap();
        assert_eq!(set.get_str("status").unwrap(), "not_going");
        assert!(set.contains_key("updated_at"));
        assert!(!set.contains_key("_id"));
        assert!(!set.contains_key("created_at"));

        let on_insert = change.get_document("$setOnInsert").unwrap();
        assert_eq!(on_insert.get("_id"), Some(&uuid_bson(new_id)));
        assert!(on_insert.contains_key("created_at"));
    }

    #[test]
    fn test_stored_response_matches_pair_filter() {
        let now = Utc::now();
        let response = AttendanceResponse {
            id: Uuid::now_v7(),
            event_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            status: AttendanceStatus::Going,
            created_at: now,
            updated_at: now,
        };
        let written = stored(&response);

        for (key, value) in MongoResponseRepository::pair_filter(response.event_id, response.user_id) {
            assert_eq!(written.get(&key), Some(&value), "{key}");
        }
        assert_eq!(written.get("_id"), Some(&uuid_bson(response.id)));
    }

    #[test]
    fn test_set_document_only_present_fields() {
        let now = Utc::now();
        let set = MongoEventRepository::set_document(
            &UpdateEvent {
                title: Some("Renamed".to_string()),
                location: Some("Main hall".to_string()),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        assert_eq!(set.get_str("title").unwrap(), "Renamed");
        assert_eq!(set.get_str("location").unwrap(), "Main hall");
        assert!(set.contains_key("updated_at"));
        assert!(!set.contains_key("description"));
        assert!(!set.contains_key("date"));
    }

    #[test]
    fn test_empty_update_still_bumps_timestamp() {
        let set = MongoEventRepository::set_document(&UpdateEvent::default(), Utc::now()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("updated_at"));
    }
}
