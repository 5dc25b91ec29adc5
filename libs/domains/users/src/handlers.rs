use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use axum_helpers::{
    CurrentUser, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse, UserSearch};
use crate::repository::UserRepository;
use crate::service::UserService;

const AUTH_TAG: &str = "auth";
const USERS_TAG: &str = "users";

/// OpenAPI documentation for the auth and users API
#[derive(OpenApi)]
#[openapi(
    paths(register, login, me, search_users),
    components(
        schemas(AuthResponse, LoginRequest, RegisterRequest, UserResponse),
        responses(
            BadRequestValidationResponse,
            ConflictResponse,
            UnauthorizedResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = AUTH_TAG, description = "Registration and login"),
        (name = USERS_TAG, description = "User profiles and search")
    )
)]
pub struct ApiDoc;

/// Handler state: the service plus cookie settings
pub struct AuthState<R: UserRepository> {
    pub service: UserService<R>,
    /// Mark the token cookie `Secure` (production)
    pub secure_cookie: bool,
}

/// Public routes: `/auth/register`, `/auth/login`
pub fn auth_router<R: UserRepository + 'static>(
    service: UserService<R>,
    secure_cookie: bool,
) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(Arc::new(AuthState {
            service,
            secure_cookie,
        }))
}

/// Routes for authenticated callers: `/users/me`, `/users/search`
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    Router::new()
        .route("/users/me", get(me))
        .route("/users/search", get(search_users))
        .with_state(Arc::new(service))
}

/// `access_token` cookie mirroring the bearer token
fn token_cookie(token: &str, max_age: i64, secure: bool) -> UserResult<HeaderValue> {
    let secure_flag = if secure { " Secure;" } else { "" };
    let cookie = format!(
        "access_token={}; HttpOnly;{} SameSite=Strict; Path=/; Max-Age={}",
        token, secure_flag, max_age
    );
    HeaderValue::from_str(&cookie)
        .map_err(|e| UserError::Internal(format!("Failed to create cookie: {}", e)))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = AUTH_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn register<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> UserResult<impl IntoResponse> {
    let auth = state.service.register(input).await?;
    let cookie = token_cookie(
        &auth.token,
        state.service.token_ttl_secs(),
        state.secure_cookie,
    )?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(auth),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = AUTH_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn login<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<impl IntoResponse> {
    let auth = state.service.login(input).await?;
    let cookie = token_cookie(
        &auth.token,
        state.service.token_ttl_secs(),
        state.secure_cookie,
    )?;

    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(auth)))
}

/// The caller's profile
#[utoipa::path(
    get,
    path = "/users/me",
    tag = USERS_TAG,
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn me<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    CurrentUser(caller): CurrentUser,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.get(caller).await?))
}

/// Search other users by name or email (at most 20)
#[utoipa::path(
    get,
    path = "/users/search",
    tag = USERS_TAG,
    params(UserSearch),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn search_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    CurrentUser(caller): CurrentUser,
    Query(search): Query<UserSearch>,
) -> UserResult<Json<Vec<UserResponse>>> {
    let term = search.q.unwrap_or_default();
    Ok(Json(service.search(caller, &term).await?))
}
