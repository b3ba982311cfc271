use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        document::Query,
        models::{Role, UserEntity, to_unix_ms},
    },
    dto::auth::{
        AuthResponse, PasswordResetConfirm, PasswordResetRequest, SignInRequest, SignUpRequest,
        UserProfile,
    },
    error::ServiceError,
    services::mailer::OutgoingMail,
    state::{Session, SharedState},
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

#[derive(Serialize)]
struct PasswordPatch<'a> {
    password_hash: &'a str,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account key derived from the normalized email, so one email maps to one record.
fn user_id(email: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{email}").as_bytes())
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Corrupted(format!("password hashing failed: {err}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| ServiceError::Corrupted(format!("stored password hash is invalid: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

async fn find_by_email(
    state: &SharedState,
    email: &str,
) -> Result<Option<UserEntity>, ServiceError> {
    let users = state.repository::<UserEntity>().await?;
    Ok(users
        .find_one(Query::new().where_eq("email", email))
        .await?)
}

fn open_session(state: &SharedState, user: &UserEntity) -> AuthResponse {
    let session = state.sessions().open(
        user.id,
        user.email.clone(),
        user.display_name.clone(),
        user.role,
        state.clock().now(),
    );
    AuthResponse {
        token: session.token,
        user: UserProfile::from(user),
    }
}

/// Register an account and sign it in.
pub async fn sign_up(
    state: &SharedState,
    request: SignUpRequest,
) -> Result<AuthResponse, ServiceError> {
    let email = normalize_email(&request.email);
    let role = if state.config().is_admin_email(&email) {
        Role::Admin
    } else {
        Role::Student
    };
    let user = UserEntity {
        id: user_id(&email),
        email,
        display_name: request.display_name.trim().to_string(),
        password_hash: hash_password(&request.password)?,
        role,
        created_at_ms: to_unix_ms(state.clock().now()),
    };
    if !state.repository::<UserEntity>().await?.insert(&user).await? {
        return Err(ServiceError::Conflict(format!(
            "an account already exists for {}",
            user.email
        )));
    }
    info!(user_id = %user.id, role = ?user.role, "account created");

    Ok(open_session(state, &user))
}

/// Exchange credentials for a bearer token.
pub async fn sign_in(
    state: &SharedState,
    request: SignInRequest,
) -> Result<AuthResponse, ServiceError> {
    let email = normalize_email(&request.email);
    let Some(user) = find_by_email(state, &email).await? else {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    };
    if !verify_password(&request.password, &user.password_hash)? {
        warn!(user_id = %user.id, "rejected sign-in with wrong password");
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    info!(user_id = %user.id, "signed in");
    Ok(open_session(state, &user))
}

/// Invalidate the session's token.
pub fn sign_out(state: &SharedState, session: &Session) {
    state.sessions().close(&session.token);
    info!(user_id = %session.user_id, "signed out");
}

/// Resolve a bearer token into its live session.
pub fn authenticate(state: &SharedState, token: &str) -> Result<Session, ServiceError> {
    state
        .sessions()
        .resolve(token)
        .ok_or_else(|| ServiceError::Unauthorized("unknown or expired session".into()))
}

/// Fail with [`ServiceError::Forbidden`] unless the session belongs to an administrator.
pub fn require_admin(session: &Session) -> Result<(), ServiceError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("administrator role required".into()))
    }
}

/// Mail a reset token when the email belongs to an account.
///
/// Unknown emails succeed silently so callers cannot discover which accounts exist.
pub async fn request_password_reset(
    state: &SharedState,
    request: PasswordResetRequest,
) -> Result<(), ServiceError> {
    let email = normalize_email(&request.email);
    let Some(user) = find_by_email(state, &email).await? else {
        info!("password reset requested for unknown email");
        return Ok(());
    };

    let token = state.sessions().issue_reset(user.id);
    state
        .mailer()
        .send(OutgoingMail {
            to: user.email.clone(),
            subject: "Reset your Exam Hall password".into(),
            body: format!(
                "Hello {},\n\nUse this code to choose a new password within the next hour:\n\n{token}\n",
                user.display_name
            ),
            reply_to: None,
        })
        .await?;
    info!(user_id = %user.id, "password reset mailed");
    Ok(())
}

/// Set a new password using a mailed reset token. Every open session of the
/// account is closed.
pub async fn confirm_password_reset(
    state: &SharedState,
    request: PasswordResetConfirm,
) -> Result<(), ServiceError> {
    let Some(user_id) = state.sessions().redeem_reset(&request.token) else {
        return Err(ServiceError::InvalidInput(
            "invalid or expired reset token".into(),
        ));
    };

    let password_hash = hash_password(&request.new_password)?;
    let users = state.repository::<UserEntity>().await?;
    let id = user_id.to_string();
    if !users
        .update(
            &id,
            &PasswordPatch {
                password_hash: &password_hash,
            },
        )
        .await?
    {
        return Err(ServiceError::NotFound(format!("user {id} not found")));
    }

    state.sessions().close_all_for(user_id);
    info!(%user_id, "password reset completed");
    Ok(())
}
