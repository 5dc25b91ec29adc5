use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum_helpers::JwtAuth;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{
    AuthResponse, LoginRequest, RegisterRequest, User, UserResponse, normalize_email,
};
use crate::repository::{SEARCH_LIMIT, UserRepository};

/// Service layer for registration, login and user lookups
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    jwt: JwtAuth,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            jwt: self.jwt.clone(),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, jwt: JwtAuth) -> Self {
        Self {
            repository: Arc::new(repository),
            jwt,
        }
    }

    /// Lifetime of issued tokens, in seconds
    pub fn token_ttl_secs(&self) -> i64 {
        self.jwt.ttl_secs()
    }

    /// Create an account and sign the new user in
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterRequest) -> UserResult<AuthResponse> {
        input.validate()?;

        let email = normalize_email(&input.email);
        if self.repository.get_by_email(&email).await?.is_some() {
            return Err(UserError::DuplicateEmail(email));
        }

        let password_hash = self.hash_password(&input.password)?;
        let user = self
            .repository
            .create(User::new(&email, input.name.trim().to_string(), password_hash))
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.issue(user)
    }

    /// Check credentials and issue a token
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<AuthResponse> {
        input.validate()?;

        let user = self
            .repository
            .get_by_email(&normalize_email(&input.email))
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !self.verify_password(&input.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Login rejected");
            return Err(UserError::InvalidCredentials);
        }

        self.issue(user)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> UserResult<UserResponse> {
        self.repository
            .get_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(UserError::NotFound(id))
    }

    /// Batch profile lookup; unknown IDs are skipped
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_many(&self, ids: &[Uuid]) -> UserResult<Vec<UserResponse>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.repository.get_many(ids).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Users matching `term` by name or email, never the caller.
    ///
    /// A blank term matches nobody.
    #[instrument(skip(self))]
    pub async fn search(&self, caller: Uuid, term: &str) -> UserResult<Vec<UserResponse>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.repository.search(term, caller, SEARCH_LIMIT).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    fn issue(&self, user: User) -> UserResult<AuthResponse> {
        let token = self
            .jwt
            .create_token(user.id, &user.email, &user.name)
            .map_err(|e| UserError::Token(e.to_string()))?;

        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    // Password helpers

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
