use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    CurrentUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        ServiceUnavailableResponse, UnauthorizedResponse,
    },
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};

use crate::error::{EventError, EventResult};
use crate::models::{
    AttendanceResponse, AttendanceStatus, AttendeeStatus, CreateEvent, DeleteResult, Event,
    EventSearch, InviteResult, InviteUsers, OwnResponse, Participant, ParticipantRole,
    ResponseFilter, SearchResults, SubmitResponse, UpdateEvent,
};
use crate::repository::{EventRepository, ResponseRepository};
use crate::service::EventService;
use crate::summary::{AttendeeEntry, AttendeeSummary};

const EVENTS_TAG: &str = "events";
const SEARCH_TAG: &str = "search";

/// OpenAPI documentation for the events and search API
#[derive(OpenApi)]
#[openapi(
    paths(
        create_event,
        organized_events,
        invited_events,
        get_event,
        update_event,
        delete_event,
        invite_users,
        submit_response,
        get_own_response,
        list_responses,
        get_summary,
        search_events,
        search_events_body,
        search_by_keyword,
        search_by_date,
        search_by_role,
    ),
    components(
        schemas(
            Event, Participant, ParticipantRole, CreateEvent, UpdateEvent, InviteUsers,
            InviteResult, DeleteResult, AttendanceStatus, AttendeeStatus, AttendanceResponse,
            SubmitResponse, OwnResponse, AttendeeSummary, AttendeeEntry, EventSearch,
            SearchResults
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = EVENTS_TAG, description = "Events, invitations and attendance responses"),
        (name = SEARCH_TAG, description = "Search across the caller's events")
    )
)]
pub struct ApiDoc;

/// Event and search routes; every route expects an authenticated caller.
pub fn router<E, R>(service: EventService<E, R>) -> Router
where
    E: EventRepository + 'static,
    R: ResponseRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/events", post(create_event))
        .route("/events/organized", get(organized_events))
        .route("/events/invited", get(invited_events))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{id}/invite", post(invite_users))
        .route(
            "/events/{id}/responses",
            get(list_responses).post(submit_response),
        )
        .route("/events/{id}/responses/me", get(get_own_response))
        .route("/events/{id}/summary", get(get_summary))
        .route("/search", get(search_events).post(search_events_body))
        .route("/search/keyword", get(search_by_keyword))
        .route("/search/date", get(search_by_date))
        .route("/search/role", get(search_by_role))
        .with_state(shared_service)
}

type SharedService<E, R> = State<Arc<EventService<E, R>>>;

/// Query string errors as 400 with the standard body.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> EventResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| EventError::Validation(rejection.body_text()))
}

/// JSON body without validation; the service validates after its role check.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> EventResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| EventError::Validation(rejection.body_text()))
}

fn required(value: Option<String>, name: &str) -> EventResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EventError::Validation(format!("Query parameter '{}' is required", name)))
}

/// Create an event organized by the caller
#[utoipa::path(
    post,
    path = "/events",
    tag = EVENTS_TAG,
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_event<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateEvent>,
) -> EventResult<impl IntoResponse> {
    let event = service.create(caller, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Events the caller organizes
#[utoipa::path(
    get,
    path = "/events/organized",
    tag = EVENTS_TAG,
    responses(
        (status = 200, description = "Organized events", body = Vec<Event>),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn organized_events<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
) -> EventResult<Json<Vec<Event>>> {
    Ok(Json(service.organized(caller).await?))
}

/// Events the caller is invited to
#[utoipa::path(
    get,
    path = "/events/invited",
    tag = EVENTS_TAG,
    responses(
        (status = 200, description = "Events the caller attends", body = Vec<Event>),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn invited_events<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
) -> EventResult<Json<Vec<Event>>> {
    Ok(Json(service.invited(caller).await?))
}

/// Get an event by ID
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_event<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    UuidPath(id): UuidPath,
) -> EventResult<Json<Event>> {
    Ok(Json(service.get(id).await?))
}

/// Update the present fields of an event
#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEvent,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_event<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    UuidPath(id): UuidPath,
    input: Result<Json<UpdateEvent>, JsonRejection>,
) -> EventResult<Json<Event>> {
    let input = json_body(input)?;
    Ok(Json(service.update(id, caller, input).await?))
}

/// Delete an event together with its responses
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = DeleteResult),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_event<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    UuidPath(id): UuidPath,
) -> EventResult<Json<DeleteResult>> {
    Ok(Json(service.delete(id, caller).await?))
}

/// Invite users as attendees
#[utoipa::path(
    post,
    path = "/events/{id}/invite",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = InviteUsers,
    responses(
        (status = 200, description = "Users invited", body = InviteResult),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn invite_users<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<InviteUsers>,
) -> EventResult<Json<InviteResult>> {
    Ok(Json(service.invite(id, caller, input).await?))
}

/// Submit or change the caller's attendance response
#[utoipa::path(
    post,
    path = "/events/{id}/responses",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = SubmitResponse,
    responses(
        (status = 201, description = "Response created", body = AttendanceResponse),
        (status = 200, description = "Response updated", body = AttendanceResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn submit_response<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<SubmitResponse>,
) -> EventResult<impl IntoResponse> {
    let (response, created) = service.submit_response(id, caller, input.status).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

/// The caller's own response
#[utoipa::path(
    get,
    path = "/events/{id}/responses/me",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Stored response or no_response", body = OwnResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_own_response<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    UuidPath(id): UuidPath,
) -> EventResult<Json<OwnResponse>> {
    Ok(Json(service.get_own_response(id, caller).await?))
}

/// All responses of an event, optionally filtered by status
#[utoipa::path(
    get,
    path = "/events/{id}/responses",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID"), ResponseFilter),
    responses(
        (status = 200, description = "Responses in submission order", body = Vec<AttendanceResponse>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_responses<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    UuidPath(id): UuidPath,
    filter: Result<Query<ResponseFilter>, QueryRejection>,
) -> EventResult<Json<Vec<AttendanceResponse>>> {
    let filter = query_params(filter)?;
    Ok(Json(service.list_responses(id, caller, filter.status).await?))
}

/// Attendance summary for the organizer
#[utoipa::path(
    get,
    path = "/events/{id}/summary",
    tag = EVENTS_TAG,
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Attendance counts and attendee list", body = AttendeeSummary),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_summary<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    UuidPath(id): UuidPath,
) -> EventResult<Json<AttendeeSummary>> {
    Ok(Json(service.summary(id, caller).await?))
}

/// Search the caller's events; no parameters returns all of them
#[utoipa::path(
    get,
    path = "/search",
    tag = SEARCH_TAG,
    params(EventSearch),
    responses(
        (status = 200, description = "Matching events", body = SearchResults),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn search_events<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    search: Result<Query<EventSearch>, QueryRejection>,
) -> EventResult<Json<SearchResults>> {
    let search = query_params(search)?;
    Ok(Json(service.search(caller, &search).await?))
}

/// Search the caller's events with criteria in the body
#[utoipa::path(
    post,
    path = "/search",
    tag = SEARCH_TAG,
    request_body = EventSearch,
    responses(
        (status = 200, description = "Matching events", body = SearchResults),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn search_events_body<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    ValidatedJson(search): ValidatedJson<EventSearch>,
) -> EventResult<Json<SearchResults>> {
    Ok(Json(service.search(caller, &search).await?))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct KeywordParams {
    /// Text matched against title and description
    q: Option<String>,
}

/// Search by keyword only
#[utoipa::path(
    get,
    path = "/search/keyword",
    tag = SEARCH_TAG,
    params(KeywordParams),
    responses(
        (status = 200, description = "Matching events", body = SearchResults),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn search_by_keyword<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    params: Result<Query<KeywordParams>, QueryRejection>,
) -> EventResult<Json<SearchResults>> {
    let keyword = required(query_params(params)?.q, "q")?;
    let search = EventSearch {
        keyword: Some(keyword),
        ..Default::default()
    };
    Ok(Json(service.search(caller, &search).await?))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct DateParams {
    /// Inclusive lower bound, `YYYY-MM-DD`
    start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    end_date: Option<String>,
}

/// Search by date range only
#[utoipa::path(
    get,
    path = "/search/date",
    tag = SEARCH_TAG,
    params(DateParams),
    responses(
        (status = 200, description = "Matching events", body = SearchResults),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn search_by_date<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    params: Result<Query<DateParams>, QueryRejection>,
) -> EventResult<Json<SearchResults>> {
    let params = query_params(params)?;
    let search = EventSearch {
        start_date: params.start_date,
        end_date: params.end_date,
        ..Default::default()
    };
    Ok(Json(service.search(caller, &search).await?))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct RoleParams {
    /// `organizer` or `attendee`
    role: Option<String>,
}

/// Search by the caller's role only
#[utoipa::path(
    get,
    path = "/search/role",
    tag = SEARCH_TAG,
    params(RoleParams),
    responses(
        (status = 200, description = "Matching events", body = SearchResults),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn search_by_role<E: EventRepository, R: ResponseRepository>(
    State(service): SharedService<E, R>,
    CurrentUser(caller): CurrentUser,
    params: Result<Query<RoleParams>, QueryRejection>,
) -> EventResult<Json<SearchResults>> {
    let role = required(query_params(params)?.role, "role")?;
    let search = EventSearch {
        role: Some(role),
        ..Default::default()
    };
    Ok(Json(service.search(caller, &search).await?))
}
