//! Users Domain
//!
//! Identity for the scheduler: registration, login, profile lookups and
//! user search. Also resolves profiles for the events domain through
//! [`domain_events::UserDirectory`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /auth/* (public), /users/* (authenticated)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Argon2 hashing, JWT issuing, validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← MongoDB or in-memory
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_users::{InMemoryUserRepository, UserService, handlers};
//!
//! let jwt = JwtAuth::new(&JwtConfig::new("a-secret-of-at-least-32-characters!").unwrap());
//! let service = UserService::new(InMemoryUserRepository::new(), jwt);
//!
//! let public = handlers::auth_router(service.clone(), false);
//! let protected = handlers::router(service);
//! ```

mod directory;
pub mod error;
pub mod handlers;
pub mod models;
mod mongodb;
pub mod repository;
pub mod service;

pub use crate::mongodb::{MongoUserRepository, USERS_COLLECTION};
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse, UserSearch};
pub use repository::{InMemoryUserRepository, SEARCH_LIMIT, UserRepository};
pub use service::UserService;
