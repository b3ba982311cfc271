use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{Role, UserEntity},
    dto::validation::validate_not_blank,
    state::Session,
};

/// Payload used to create an account.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub display_name: String,
}

/// Credentials exchanged for a bearer token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignInRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Start the password reset flow for an account.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

/// Finish the password reset flow with the mailed token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PasswordResetConfirm {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Account role as exposed by the API.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Admin,
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => UserRole::Student,
            Role::Admin => UserRole::Admin,
        }
    }
}

/// Public view of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

impl From<&UserEntity> for UserProfile {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role.into(),
        }
    }
}

impl From<&Session> for UserProfile {
    fn from(session: &Session) -> Self {
        Self {
            id: session.user_id,
            email: session.email.clone(),
            display_name: session.display_name.clone(),
            role: session.role.into(),
        }
    }
}

/// Returned on sign-up and sign-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Opaque bearer token for the `Authorization` header.
    pub token: String,
    pub user: UserProfile,
}

/// Generic acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
