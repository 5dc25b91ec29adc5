//! Declarative event queries.
//!
//! [`EventQuery`] always restricts to events the caller participates in and
//! adds optional predicates. It renders to a MongoDB filter with
//! [`EventQuery::to_document`] and evaluates in memory with
//! [`EventQuery::matches`]. Text predicates use the same escaped `(?i)`
//! pattern in both; case folding outside ASCII follows each regex engine.

use database::mongodb::uuid_bson;
use mongodb::bson::{Bson, Document, doc};
use regex::Regex;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::models::{Event, EventSearch, ParticipantRole};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub member: Uuid,
    pub role: Option<ParticipantRole>,
    pub keyword: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub location: Option<String>,
    pub limit: u32,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn ignore_case_pattern(needle: &str) -> String {
    format!("(?i){}", regex::escape(needle))
}

fn ignore_case_regex(needle: &str) -> Bson {
    Bson::String(ignore_case_pattern(needle))
}

/// A pattern over the regex size limit matches nothing.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    Regex::new(&ignore_case_pattern(needle)).is_ok_and(|re| re.is_match(haystack))
}

impl EventQuery {
    /// Every event `user_id` participates in, any role.
    pub fn for_member(user_id: Uuid) -> Self {
        Self {
            member: user_id,
            role: None,
            keyword: None,
            date_from: None,
            date_to: None,
            location: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_role(mut self, role: ParticipantRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_date_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Build from user-supplied criteria; blank strings count as absent.
    pub fn from_search(user_id: Uuid, search: &EventSearch) -> EventResult<Self> {
        let role = present(&search.role)
            .map(|role| {
                ParticipantRole::from_str(&role).map_err(|_| {
                    EventError::Validation(format!(
                        "Invalid role '{}', expected organizer or attendee",
                        role
                    ))
                })
            })
            .transpose()?;

        let limit = match search.limit {
            None => DEFAULT_LIMIT,
            Some(0) => {
                return Err(EventError::Validation(
                    "Limit must be at least 1".to_string(),
                ));
            }
            Some(n) => n.min(MAX_LIMIT),
        };

        Ok(Self {
            member: user_id,
            role,
            keyword: present(&search.keyword),
            date_from: present(&search.start_date),
            date_to: present(&search.end_date),
            location: present(&search.location),
            limit,
        })
    }

    /// Criteria as applied, for echoing back to the caller.
    pub fn to_search(&self) -> EventSearch {
        EventSearch {
            keyword: self.keyword.clone(),
            start_date: self.date_from.clone(),
            end_date: self.date_to.clone(),
            role: self.role.map(|r| r.to_string()),
            location: self.location.clone(),
            limit: Some(self.limit),
        }
    }

    /// MongoDB filter for the `events` collection.
    pub fn to_document(&self) -> EventResult<Document> {
        let mut member = doc! { "user_id": uuid_bson(self.member) };
        if let Some(role) = self.role {
            member.insert("role", role.to_string());
        }

        let mut filter = doc! { "participants": { "$elemMatch": member } };

        if let Some(keyword) = &self.keyword {
            let pattern = ignore_case_regex(keyword);
            filter.insert(
                "$or",
                vec![
                    Bson::Document(doc! { "title": { "$regex": pattern.clone() } }),
                    Bson::Document(doc! { "description": { "$regex": pattern } }),
                ],
            );
        }

        // Lexicographic; equals chronological for zero-padded YYYY-MM-DD
        let mut date = Document::new();
        if let Some(from) = &self.date_from {
            date.insert("$gte", from.as_str());
        }
        if let Some(to) = &self.date_to {
            date.insert("$lte", to.as_str());
        }
        if !date.is_empty() {
            filter.insert("date", date);
        }

        if let Some(location) = &self.location {
            filter.insert("location", doc! { "$regex": ignore_case_regex(location) });
        }

        Ok(filter)
    }

    /// In-memory evaluation of the same predicate.
    pub fn matches(&self, event: &Event) -> bool {
        let is_member = event
            .participants
            .iter()
            .any(|p| p.user_id == self.member && self.role.is_none_or(|role| p.role == role));
        if !is_member {
            return false;
        }

        if let Some(keyword) = &self.keyword {
            if !contains_ignore_case(&event.title, keyword)
                && !contains_ignore_case(&event.description, keyword)
            {
                return false;
            }
        }

        if let Some(from) = &self.date_from {
            if event.date.as_str() < from.as_str() {
                return false;
            }
        }

        if let Some(to) = &self.date_to {
            if event.date.as_str() > to.as_str() {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if !contains_ignore_case(&event.location, location) {
                return false;
            }
        }

        true
    }
}
