//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scheduler API",
        version = "0.1.0",
        description = "Event scheduling: events, invitations, attendance responses and search",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api", api = domain_users::ApiDoc),
        (path = "/api", api = domain_events::ApiDoc)
    )
)]
pub struct ApiDoc;
