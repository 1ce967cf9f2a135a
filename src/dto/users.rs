use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::auth::validate_username, entity::sea_orm_active_enums::Role, models::User};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 50, message = "Username must be between 1 and 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(
        email(message = "Email is not a valid address"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 100, message = "Password must be between 6 and 100 characters"))]
    pub password: String,
    /// Defaults to `User`.
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 50, message = "Username must be between 1 and 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,
    #[validate(
        email(message = "Email is not a valid address"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 100, message = "Password must be between 6 and 100 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}
