//! MongoDB client setup, readiness checks and shared encodings

mod config;
mod connector;
mod errors;
mod health;
mod ids;

pub use config::MongoConfig;
pub use connector::{connect, connect_with_retry};
pub use errors::{DUPLICATE_KEY, is_duplicate_key};
pub use health::check_health;
pub use ids::{uuid_as_binary, uuid_bson};

pub use mongodb::{Client, Collection, Database};
