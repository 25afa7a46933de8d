use chrono::{DateTime, Duration, FixedOffset, SubsecRound, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Current time at the store's precision (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// User as seen by the write path, including its optimistic-lock version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl User {
    /// Change the name and bump `updated_at`.
    ///
    /// `updated_at` always moves forward, even when the clock has not.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = now().max(self.updated_at + Duration::microseconds(1));
    }
}

/// A user that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = now();
        Self {
            name: name.into(),
            email: email.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Read-side projection; carries no version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// User response DTO; timestamps are rendered in the caller's display zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Ana García")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(value_type = String, format = DateTime, example = "2024-05-01T10:15:30+02:00")]
    pub created_at: DateTime<FixedOffset>,
    #[schema(value_type = String, format = DateTime, example = "2024-05-01T10:15:30+02:00")]
    pub updated_at: DateTime<FixedOffset>,
    /// Only present on write responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl UserResponse {
    pub fn from_user(user: User, zone: Tz) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at.with_timezone(&zone).fixed_offset(),
            updated_at: user.updated_at.with_timezone(&zone).fixed_offset(),
            version: Some(user.version),
        }
    }

    pub fn from_view(view: UserView, zone: Tz) -> Self {
        Self {
            id: view.id,
            name: view.name,
            email: view.email,
            created_at: view.created_at.with_timezone(&zone).fixed_offset(),
            updated_at: view.updated_at.with_timezone(&zone).fixed_offset(),
            version: None,
        }
    }
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    #[schema(example = "Ana García")]
    pub name: String,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    #[schema(example = "ana@example.com")]
    pub email: String,
}

/// DTO for renaming a user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserName {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    #[schema(example = "Ana María García")]
    pub name: String,
}

fn default_page_size() -> u64 {
    20
}

/// Zero-based page request
#[derive(Debug, Clone, Copy, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_page_offset"))]
pub struct PageParams {
    /// Page index, starting at 0
    #[serde(default)]
    pub page: u64,
    /// Page size, 1-100
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "size must be between 1 and 100"))]
    pub size: u64,
}

// The row offset is `page * size` and must fit a SQL BIGINT
fn validate_page_offset(params: &PageParams) -> Result<(), ValidationError> {
    match params.page.checked_mul(params.size) {
        Some(offset) if offset <= i64::MAX as u64 => Ok(()),
        _ => Err(ValidationError::new("page_offset").with_message("page is out of range".into())),
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
        }
    }
}

/// One page of results with total-count metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: u64, size: u64, total_elements: u64) -> Self {
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages: total_elements.div_ceil(size.max(1)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NameQuery {
    /// Case-sensitive substring
    pub name: String,
}

fn default_recent_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Maximum number of users, must be positive
    #[serde(default = "default_recent_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> User {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        User {
            id: 7,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            created_at: created,
            updated_at: created,
            version: 3,
        }
    }

    #[test]
    fn test_rename_moves_updated_at_forward() {
        let mut user = sample_user();
        // A clock behind the stored value must not move updated_at backwards
        user.updated_at = now() + Duration::hours(1);
        let before = user.updated_at;

        user.rename("Ana María");

        assert_eq!(user.name, "Ana María");
        assert!(user.updated_at > before);
        assert_eq!(user.version, 3);
    }

    #[test]
    fn test_new_user_timestamps_match() {
        let user = NewUser::new("Ana", "ana@example.com");
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_user_json_round_trip() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();
        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn test_response_renders_in_display_zone() {
        let response = UserResponse::from_user(sample_user(), chrono_tz::Europe::Madrid);
        let json = serde_json::to_value(&response).unwrap();

        // 09:30 UTC in January is 10:30 in Madrid (CET, +01:00)
        assert_eq!(json["createdAt"], "2024-01-15T10:30:00+01:00");
        assert_eq!(json["version"], 3);
    }

    #[test]
    fn test_view_response_omits_version() {
        let view = UserView::from(sample_user());
        let response = UserResponse::from_view(view, chrono_tz::UTC);
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("version").is_none());
        assert_eq!(json["updatedAt"], "2024-01-15T09:30:00+00:00");

        let parsed: UserResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_create_user_validation() {
        let valid = CreateUser {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateUser {
            name: "Ana".to_string(),
            email: "not-an-email".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let long_name = CreateUser {
            name: "x".repeat(101),
            email: "ana@example.com".to_string(),
        };
        assert!(long_name.validate().is_err());
    }

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec![1, 2], 0, 2, 5);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 0, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_page_params_defaults() {
        let params: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 0);
        assert_eq!(params.size, 20);

        let too_big = PageParams { page: 0, size: 500 };
        assert!(too_big.validate().is_err());
    }

    #[test]
    fn test_page_params_rejects_offset_past_bigint() {
        let last = PageParams {
            page: i64::MAX as u64 / 20,
            size: 20,
        };
        assert!(last.validate().is_ok());

        let overflowing = PageParams {
            page: i64::MAX as u64,
            size: 20,
        };
        assert!(overflowing.validate().is_err());

        let wrapping = PageParams {
            page: u64::MAX / 2,
            size: 20,
        };
        assert!(wrapping.validate().is_err());
    }
}
