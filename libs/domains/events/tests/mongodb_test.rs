//! MongoDB repository tests
//!
//! Need a running MongoDB (`MONGODB_URL`, default `mongodb://localhost:27017`).
//! Each test works in its own throwaway database.

use chrono::Utc;
use domain_events::*;
use mongodb::{Client, Database};
use uuid::Uuid;

async fn database() -> Database {
    let url =
        std::env::var("MONGODB_URL").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let client = Client::with_uri_str(&url).await.unwrap();
    client.database(&format!("scheduler_test_{}", Uuid::now_v7().simple()))
}

fn create_input(title: &str, date: &str, location: &str) -> CreateEvent {
    CreateEvent {
        title: title.to_string(),
        description: "Integration run against a live store".to_string(),
        date: date.to_string(),
        time: "11:00".to_string(),
        location: location.to_string(),
    }
}

#[tokio::test]
#[ignore] // Requires a running MongoDB
async fn test_event_roundtrip_and_membership_queries() {
    let db = database().await;
    let repo = MongoEventRepository::new(&db);
    repo.create_indexes().await.unwrap();

    let (owner, guest) = (Uuid::now_v7(), Uuid::now_v7());
    let later = repo
        .insert(Event::new(owner, create_input("Offsite", "2030-09-01", "Lake house")))
        .await
        .unwrap();
    let sooner = repo
        .insert(Event::new(owner, create_input("Standup", "2030-08-01", "Room 1, HQ")))
        .await
        .unwrap();

    let stored = repo.get_by_id(later.id).await.unwrap().unwrap();
    assert_eq!(stored.participants, vec![Participant::organizer(owner)]);

    assert!(
        repo.add_participants(sooner.id, &[Participant::attendee(guest)], Utc::now())
            .await
            .unwrap()
    );
    assert!(
        !repo
            .add_participants(sooner.id, &[Participant::attendee(guest)], Utc::now())
            .await
            .unwrap()
    );

    let organized = repo
        .find(&EventQuery::for_member(owner).with_role(ParticipantRole::Organizer))
        .await
        .unwrap();
    let ids: Vec<_> = organized.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    let invited = repo
        .find(&EventQuery::for_member(guest).with_role(ParticipantRole::Attendee))
        .await
        .unwrap();
    assert_eq!(invited.len(), 1);

    let by_keyword = repo
        .find(&EventQuery::for_member(owner).with_keyword("OFFSITE"))
        .await
        .unwrap();
    assert_eq!(by_keyword.len(), 1);
    assert_eq!(by_keyword[0].id, later.id);

    let updated = repo
        .update_fields(
            later.id,
            &UpdateEvent {
                location: Some("Mountain lodge".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.location, "Mountain lodge");
    assert_eq!(updated.title, "Offsite");

    assert!(repo.delete(later.id).await.unwrap());
    assert!(repo.get_by_id(later.id).await.unwrap().is_none());

    db.drop().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires a running MongoDB
async fn test_response_upsert_is_one_per_pair() {
    let db = database().await;
    let repo = MongoResponseRepository::new(&db);
    repo.create_indexes().await.unwrap();

    let (event, a, b) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

    let first = repo
        .upsert(event, a, AttendanceStatus::Maybe, Utc::now())
        .await
        .unwrap();
    let second = repo
        .upsert(event, a, AttendanceStatus::Going, Utc::now())
        .await
        .unwrap();
    assert!(first.created);
    assert!(!second.created);
    assert_eq!(second.response.id, first.response.id);
    assert_eq!(second.response.status, AttendanceStatus::Going);

    repo.upsert(event, b, AttendanceStatus::NotGoing, Utc::now())
        .await
        .unwrap();

    let listed: Vec<_> = repo
        .list_for_event(event, None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.user_id)
        .collect();
    assert_eq!(listed, vec![a, b]);

    let going = repo
        .list_for_event(event, Some(AttendanceStatus::Going))
        .await
        .unwrap();
    assert_eq!(going.len(), 1);

    assert_eq!(repo.delete_for_event(event).await.unwrap(), 2);
    assert!(repo.find_one(event, a).await.unwrap().is_none());

    db.drop().await.unwrap();
}
