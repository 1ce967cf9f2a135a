use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::User;

/// Usernames share the login field with email addresses, so they may not look like one.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.contains('@') {
        return Err(ValidationError::new("username_at_sign")
            .with_message("Username must not contain '@'".into()));
    }
    Ok(())
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
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
}

/// `email` also accepts a username.
#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    /// Session handle; send as `Authorization: Bearer <token>` when cookies are not used.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_may_not_contain_at_sign() {
        let request = RegisterRequest {
            username: "alice@example.com".into(),
            email: "someone@example.com".into(),
            password: "secret123".into(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        let request = RegisterRequest {
            username: "alice".into(),
            ..request
        };
        assert!(request.validate().is_ok());
    }
}
