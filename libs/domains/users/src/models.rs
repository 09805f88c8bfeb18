use axum_helpers::JsonBody;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{UserError, UserResult};
use crate::messages;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 5;

/// Largest skip the store accepts (a signed 64-bit count).
const MAX_SKIP: u64 = i64::MAX as u64;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::new("email").with_message(messages::EMAIL_INVALID.into()));
    }
    Ok(())
}

/// User entity as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Store-assigned id (24-char hex ObjectId)
    #[serde(rename = "_id")]
    #[schema(example = "65f1c0a2e4b0a1b2c3d4e5f6")]
    pub id: String,
    #[schema(example = "Ann")]
    pub name: String,
    #[schema(example = 30)]
    pub age: i64,
    #[schema(example = "ann@example.com")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl User {
    pub fn new(id: String, input: NewUser) -> Self {
        Self {
            id,
            name: input.name,
            age: input.age,
            email: input.email,
            address: input.address,
        }
    }
}

/// Request body for create and update.
///
/// Every field is optional at the type level so a missing field is reported
/// by validation with its own message instead of failing deserialization.
/// An empty `name` or `email` counts as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserInput {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(
        required(message = "Tên không được để trống"),
        length(min = 2, message = "Tên phải có ít nhất 2 ký tự")
    )]
    #[schema(example = "Ann")]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "Tuổi không được để trống"),
        range(min = 0, message = "Tuổi phải >= 0")
    )]
    #[schema(example = 30)]
    pub age: Option<i64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(
        required(message = "Email không được để trống"),
        custom(function = "validate_email")
    )]
    #[schema(example = "ann@example.com")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Hanoi")]
    pub address: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// A `UserInput` that passed validation; the only shape repositories write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub age: i64,
    pub email: String,
    pub address: Option<String>,
}

impl TryFrom<UserInput> for NewUser {
    type Error = ValidationErrors;

    fn try_from(input: UserInput) -> Result<Self, Self::Error> {
        input.validate()?;

        match (input.name, input.age, input.email) {
            (Some(name), Some(age), Some(email)) => Ok(NewUser {
                name,
                age,
                email,
                address: input.address,
            }),
            // `required` rules above reject every other combination
            _ => Err(ValidationErrors::new()),
        }
    }
}

/// POST body: a single user, or an array of users for bulk create.
///
/// Array elements are decoded one by one so a record of the wrong shape is
/// carried as an error and skipped later instead of failing the batch.
#[derive(Debug)]
pub enum CreateUsers {
    One(UserInput),
    Many(Vec<UserResult<UserInput>>),
}

impl TryFrom<Value> for CreateUsers {
    type Error = UserError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        match body {
            Value::Array(records) => Ok(CreateUsers::Many(records.iter().map(decode_input).collect())),
            other => decode_input(&other).map(CreateUsers::One),
        }
    }
}

fn decode_input(value: &Value) -> UserResult<UserInput> {
    let JsonBody(input) = JsonBody::<UserInput>::from_value(value)?;
    Ok(input)
}

/// Raw list query string.
///
/// Kept as text so malformed numbers fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number, starting at 1 (default 1)
    pub page: Option<String>,
    /// Page size (default 5)
    pub limit: Option<String>,
    /// Case-insensitive substring matched against name, email and address
    pub search: Option<String>,
}

/// Normalized list filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilter {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
}

impl UserFilter {
    /// Records before this page, capped at what the store accepts; a page
    /// that far out is simply empty.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(MAX_SKIP)
    }
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
        }
    }
}

impl From<ListQuery> for UserFilter {
    fn from(query: ListQuery) -> Self {
        Self {
            page: positive_or(query.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(query.limit.as_deref(), DEFAULT_LIMIT),
            search: query.search.filter(|s| !s.is_empty()),
        }
    }
}

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(default)
}

/// One page of users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub data: Vec<User>,
}

impl UserPage {
    pub fn new(filter: &UserFilter, total: u64, data: Vec<User>) -> Self {
        Self {
            page: filter.page,
            limit: filter.limit,
            total,
            total_pages: total.div_ceil(filter.limit.max(1)),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "Tạo người dùng thành công")]
    pub message: String,
    pub data: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsersCreatedResponse {
    #[schema(example = "Tạo nhiều người dùng thành công")]
    pub message: String,
    pub count: usize,
    pub data: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Xóa người dùng thành công")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_helpers::errors::validation_summary;
    use serde_json::json;

    fn input(value: serde_json::Value) -> UserInput {
        serde_json::from_value(value).unwrap()
    }

    fn summary_of(value: serde_json::Value) -> String {
        let errors = NewUser::try_from(input(value)).unwrap_err();
        validation_summary(&errors)
    }

    #[test]
    fn test_valid_input_converts() {
        let new_user = NewUser::try_from(input(json!({
            "name": "Ann",
            "age": 0,
            "email": "ann@example.com"
        })))
        .unwrap();

        assert_eq!(new_user.name, "Ann");
        assert_eq!(new_user.age, 0);
        assert_eq!(new_user.address, None);
    }

    #[test]
    fn test_missing_fields_report_required_messages() {
        assert_eq!(
            summary_of(json!({})),
            format!(
                "Validation failed: age: {}, email: {}, name: {}",
                messages::AGE_REQUIRED,
                messages::EMAIL_REQUIRED,
                messages::NAME_REQUIRED
            )
        );
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let parsed = input(json!({ "name": "", "email": "", "age": 1 }));
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.email, None);
    }

    #[test]
    fn test_rule_messages() {
        assert_eq!(
            summary_of(json!({ "name": "A", "age": 1, "email": "a@b.co" })),
            format!("Validation failed: name: {}", messages::NAME_TOO_SHORT)
        );
        assert_eq!(
            summary_of(json!({ "name": "Ann", "age": -1, "email": "a@b.co" })),
            format!("Validation failed: age: {}", messages::AGE_NEGATIVE)
        );
        assert_eq!(
            summary_of(json!({ "name": "Ann", "age": 1, "email": "not an email" })),
            format!("Validation failed: email: {}", messages::EMAIL_INVALID)
        );
    }

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL_PATTERN.is_match("x@y.z"));
        assert!(!EMAIL_PATTERN.is_match("x@y"));
        assert!(!EMAIL_PATTERN.is_match("x y@z.com"));
    }

    #[test]
    fn test_create_users_object_or_array() {
        let one = CreateUsers::try_from(json!({ "name": "Ann" })).unwrap();
        assert!(matches!(one, CreateUsers::One(ref u) if u.name.as_deref() == Some("Ann")));

        let many = CreateUsers::try_from(json!([{ "name": "Ann" }, {}])).unwrap();
        assert!(matches!(many, CreateUsers::Many(ref v) if v.len() == 2 && v.iter().all(Result::is_ok)));
    }

    #[test]
    fn test_create_users_mistyped_single_names_the_field() {
        let err = CreateUsers::try_from(json!({ "name": "Ann", "age": "abc" })).unwrap_err();
        let UserError::InvalidBody(message) = err else {
            panic!("expected invalid body, got {err:?}");
        };
        assert!(message.contains("age"), "unexpected message: {message}");
    }

    #[test]
    fn test_create_users_keeps_mistyped_records_in_batch() {
        let body = json!([
            { "name": "Ann", "age": 30, "email": "ann@x.com" },
            { "name": "Bob", "age": "abc", "email": "bob@x.com" }
        ]);
        let CreateUsers::Many(records) = CreateUsers::try_from(body).unwrap() else {
            panic!("expected bulk body");
        };
        assert!(records[0].is_ok());
        assert!(matches!(records[1], Err(UserError::InvalidBody(ref m)) if m.contains("age")));
    }

    #[test]
    fn test_create_users_positional_array_is_bulk() {
        let body = json!(["Ann", 30, "ann@x.com"]);
        let CreateUsers::Many(records) = CreateUsers::try_from(body).unwrap() else {
            panic!("expected bulk body");
        };
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(Result::is_err));
    }

    #[test]
    fn test_filter_defaults_and_lenient_parsing() {
        let filter = UserFilter::from(ListQuery::default());
        assert_eq!(filter, UserFilter::default());

        let filter = UserFilter::from(ListQuery {
            page: Some("0".into()),
            limit: Some("abc".into()),
            search: Some(String::new()),
        });
        assert_eq!(filter, UserFilter::default());

        let filter = UserFilter::from(ListQuery {
            page: Some("3".into()),
            limit: Some(" 10 ".into()),
            search: Some("ann".into()),
        });
        assert_eq!(filter.page, 3);
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.skip(), 20);
        assert_eq!(filter.search.as_deref(), Some("ann"));
    }

    #[test]
    fn test_skip_is_capped_for_far_pages() {
        let filter = UserFilter {
            page: u64::MAX,
            limit: 1_000,
            search: None,
        };
        assert_eq!(filter.skip(), i64::MAX as u64);
        assert!(i64::try_from(filter.skip()).is_ok());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let filter = UserFilter::default();
        assert_eq!(UserPage::new(&filter, 0, vec![]).total_pages, 0);
        assert_eq!(UserPage::new(&filter, 5, vec![]).total_pages, 1);
        assert_eq!(UserPage::new(&filter, 6, vec![]).total_pages, 2);
    }

    #[test]
    fn test_user_json_shape() {
        let user = User {
            id: "65f1c0a2e4b0a1b2c3d4e5f6".into(),
            name: "Ann".into(),
            age: 30,
            email: "ann@example.com".into(),
            address: None,
        };
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "_id": "65f1c0a2e4b0a1b2c3d4e5f6",
                "name": "Ann",
                "age": 30,
                "email": "ann@example.com"
            })
        );

        let page = UserPage::new(&UserFilter::default(), 1, vec![user]);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["totalPages"], 1);
    }
}
