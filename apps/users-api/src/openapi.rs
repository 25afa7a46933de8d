use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Declares the bearer token scheme referenced by the users endpoints
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(crate::api::public::status),
    components(
        schemas(axum_helpers::ErrorResponse, crate::api::public::PublicStatus)
    ),
    info(
        title = "Users API",
        version = "0.1.0",
        description = "User management with separate command and query paths"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/users", api = domain_users::ApiDoc)
    ),
    tags((name = "public", description = "Unauthenticated endpoints")),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;
