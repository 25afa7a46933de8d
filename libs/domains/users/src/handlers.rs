use axum::{
    Json, Router,
    extract::{FromRequestParts, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{
    AuditEvent, AuditOutcome, IdPath, Principal, TIME_ZONE_HEADER, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NotFoundResponse, ServiceUnavailableResponse, UnauthorizedResponse,
    },
};
use chrono_tz::Tz;
use core_config::locale::DisplayConfig;
use serde_json::json;

use crate::error::{UserError, UserResult};
use crate::models::{
    CountResponse, CreateUser, EmailQuery, NameQuery, Page, PageParams, RecentQuery,
    UpdateUserName, UserResponse,
};
use crate::repository::{UserCommandRepository, UserQueryRepository};
use crate::service::UserService;

const TAG: &str = "users";

/// OpenAPI documentation for the Users API
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        count_users,
        recent_users,
        search_users,
        find_by_email,
        get_user,
        update_user_name,
        delete_user,
    ),
    components(
        schemas(UserResponse, CreateUser, UpdateUserName, CountResponse),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse,
            ServiceUnavailableResponse
        )
    ),
    tags(
        (name = TAG, description = "User management endpoints")
    ),
    security(("bearer_auth" = []))
)]
pub struct ApiDoc;

/// Handler state: the service plus display defaults for rendering
pub struct UsersState<C, Q> {
    service: UserService<C, Q>,
    display: DisplayConfig,
}

impl<C, Q> Clone for UsersState<C, Q> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            display: self.display.clone(),
        }
    }
}

/// Time zone for rendering this response.
///
/// Taken from the `x-time-zone` header, else the configured default.
pub struct DisplayZone(pub Tz);

impl<C, Q> FromRequestParts<UsersState<C, Q>> for DisplayZone
where
    C: Send + Sync,
    Q: Send + Sync,
{
    type Rejection = UserError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &UsersState<C, Q>,
    ) -> Result<Self, Self::Rejection> {
        let requested = parts
            .headers
            .get(TIME_ZONE_HEADER)
            .and_then(|v| v.to_str().ok());

        state
            .display
            .resolve_zone(requested)
            .map(DisplayZone)
            .map_err(UserError::Validation)
    }
}

async fn content_language(State(language): State<HeaderValue>, mut response: Response) -> Response {
    response
        .headers_mut()
        .entry(header::CONTENT_LANGUAGE)
        .or_insert(language);
    response
}

/// Create the users router.
///
/// Expects the caller to add authentication in front of it; every handler
/// takes the authenticated [`Principal`].
pub fn router<C, Q>(service: UserService<C, Q>, display: DisplayConfig) -> Router
where
    C: UserCommandRepository + 'static,
    Q: UserQueryRepository + 'static,
{
    let language = HeaderValue::from_str(&display.locale)
        .unwrap_or_else(|_| HeaderValue::from_static(core_config::locale::DEFAULT_LOCALE));

    Router::new()
        .route("/", get(list_users::<C, Q>).post(create_user::<C, Q>))
        .route("/count", get(count_users::<C, Q>))
        .route("/recent", get(recent_users::<C, Q>))
        .route("/search", get(search_users::<C, Q>))
        .route("/by-email", get(find_by_email::<C, Q>))
        .route(
            "/{id}",
            get(get_user::<C, Q>)
                .patch(update_user_name::<C, Q>)
                .delete(delete_user::<C, Q>),
        )
        .layer(middleware::map_response_with_state(language, content_language))
        .with_state(UsersState { service, display })
}

/// List users, one page at a time
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(PageParams),
    responses(
        (status = 200, description = "Page of users", body = Page<UserResponse>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<C, Q>(
    State(state): State<UsersState<C, Q>>,
    DisplayZone(zone): DisplayZone,
    Query(params): Query<PageParams>,
) -> UserResult<Json<Page<UserResponse>>>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let page = state.service.list_users(params).await?;
    Ok(Json(page.map(|u| UserResponse::from_view(u, zone))))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn create_user<C, Q>(
    State(state): State<UsersState<C, Q>>,
    principal: Principal,
    headers: HeaderMap,
    DisplayZone(zone): DisplayZone,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let email = input.email.clone();

    let user = match state.service.create_user(input).await {
        Ok(user) => user,
        Err(err) => {
            AuditEvent::new(&principal, "user.create", AuditOutcome::Failure)
                .with_headers(&headers)
                .with_details(json!({ "email": email, "reason": err.to_string() }))
                .log();
            return Err(err);
        }
    };

    AuditEvent::new(&principal, "user.create", AuditOutcome::Success)
        .with_resource(format!("user:{}", user.id))
        .with_headers(&headers)
        .with_details(json!({ "email": user.email }))
        .log();

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(user, zone))))
}

/// Number of users
#[utoipa::path(
    get,
    path = "/count",
    tag = TAG,
    responses(
        (status = 200, description = "Total number of users", body = CountResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn count_users<C, Q>(State(state): State<UsersState<C, Q>>) -> UserResult<Json<CountResponse>>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let count = state.service.count_users().await?;
    Ok(Json(CountResponse { count }))
}

/// Most recently created users, newest first
#[utoipa::path(
    get,
    path = "/recent",
    tag = TAG,
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent users", body = Vec<UserResponse>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn recent_users<C, Q>(
    State(state): State<UsersState<C, Q>>,
    DisplayZone(zone): DisplayZone,
    Query(query): Query<RecentQuery>,
) -> UserResult<Json<Vec<UserResponse>>>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let users = state.service.get_recent_users(query.limit).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| UserResponse::from_view(u, zone))
            .collect(),
    ))
}

/// Users whose name contains the given text (case-sensitive)
#[utoipa::path(
    get,
    path = "/search",
    tag = TAG,
    params(NameQuery),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_users<C, Q>(
    State(state): State<UsersState<C, Q>>,
    DisplayZone(zone): DisplayZone,
    Query(query): Query<NameQuery>,
) -> UserResult<Json<Vec<UserResponse>>>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let users = state.service.search_users_by_name(&query.name).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| UserResponse::from_view(u, zone))
            .collect(),
    ))
}

/// Find a user by email
#[utoipa::path(
    get,
    path = "/by-email",
    tag = TAG,
    params(EmailQuery),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn find_by_email<C, Q>(
    State(state): State<UsersState<C, Q>>,
    DisplayZone(zone): DisplayZone,
    Query(query): Query<EmailQuery>,
) -> UserResult<Json<UserResponse>>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let user = state.service.find_user_by_email(&query.email).await?;
    Ok(Json(UserResponse::from_view(user, zone)))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<C, Q>(
    State(state): State<UsersState<C, Q>>,
    DisplayZone(zone): DisplayZone,
    IdPath(id): IdPath,
) -> UserResult<Json<UserResponse>>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let user = state.service.find_user_by_id(id).await?;
    Ok(Json(UserResponse::from_view(user, zone)))
}

/// Rename a user
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = UpdateUserName,
    responses(
        (status = 200, description = "User renamed", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user_name<C, Q>(
    State(state): State<UsersState<C, Q>>,
    principal: Principal,
    headers: HeaderMap,
    DisplayZone(zone): DisplayZone,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateUserName>,
) -> UserResult<Json<UserResponse>>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let result = state.service.update_user_name(id, input.name).await;

    let outcome = match &result {
        Ok(_) => AuditOutcome::Success,
        Err(_) => AuditOutcome::Failure,
    };
    let mut event = AuditEvent::new(&principal, "user.update", outcome)
        .with_resource(format!("user:{}", id))
        .with_headers(&headers);
    if let Err(err) = &result {
        event = event.with_details(json!({ "reason": err.to_string() }));
    }
    event.log();

    Ok(Json(UserResponse::from_user(result?, zone)))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<C, Q>(
    State(state): State<UsersState<C, Q>>,
    principal: Principal,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> UserResult<StatusCode>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    let result = state.service.delete_user(id).await;

    let outcome = if result.is_ok() {
        AuditOutcome::Success
    } else {
        AuditOutcome::Failure
    };
    AuditEvent::new(&principal, "user.delete", outcome)
        .with_resource(format!("user:{}", id))
        .with_headers(&headers)
        .log();

    result?;
    Ok(StatusCode::NO_CONTENT)
}
