//! Account lifecycle: signup, login, email verification and password reset.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::auth::{create_token, hash_password, hash_token, verify_password, IssuedToken};
use crate::config::Config;
use crate::error::SliceError;
use crate::mailer::{EmailTemplate, Mailer};
use crate::models::user::{self, Entity as User, Role};

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: user::Model,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_length(config: &Config, password: &str) -> Result<(), SliceError> {
    let min = config.security.min_password_length;
    if password.chars().count() < min {
        return Err(SliceError::Validation(format!(
            "Password must be at least {} characters",
            min
        )));
    }
    Ok(())
}

fn action_link(config: &Config, route: &str, raw_token: &str) -> String {
    format!(
        "{}/{}/{}",
        config.frontend_url.trim_end_matches('/'),
        route,
        raw_token
    )
}

async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, SliceError> {
    Ok(User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?)
}

async fn send_verification(
    config: &Config,
    mailer: &dyn Mailer,
    user: &user::Model,
    raw_token: &str,
) {
    let template = EmailTemplate::Verification {
        username: user.username.clone(),
        link: action_link(config, "verify-email", raw_token),
        expires_in_secs: config.security.email_verification_expiry_secs,
    };
    if let Err(e) = mailer.send(&user.email, template).await {
        tracing::warn!(user_id = user.id, error = %e, "verification email failed");
    }
}

/// Register a new customer account.
pub async fn signup(
    db: &DatabaseConnection,
    config: &Config,
    mailer: &dyn Mailer,
    username: &str,
    email: &str,
    password: &str,
) -> Result<user::Model, SliceError> {
    let username = username.trim();
    let email = normalize_email(email);
    check_password_length(config, password)?;

    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(email.as_str()))
                .add(user::Column::Username.eq(username)),
        )
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(SliceError::Conflict(
            "User already exists with this email or username".to_string(),
        ));
    }

    let require_verification = config.security.require_email_verification;
    let token = require_verification
        .then(|| IssuedToken::new(config.security.email_verification_expiry_secs));

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email),
        password_hash: Set(hash_password(password)?),
        role: Set(Role::Customer),
        email_verified: Set(!require_verification),
        verification_token_hash: Set(token.as_ref().map(|t| t.hash.clone())),
        verification_token_expires_at: Set(token.as_ref().map(|t| t.expires_at)),
        reset_token_hash: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "new user registered");

    if let Some(token) = token {
        send_verification(config, mailer, &user, &token.raw).await;
    }

    Ok(user)
}

/// Check credentials and issue a session token.
pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, SliceError> {
    let user = find_by_email(db, email)
        .await?
        .ok_or_else(|| SliceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(SliceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    if config.security.require_email_verification && !user.email_verified {
        return Err(SliceError::Forbidden(
            "Please verify your email before logging in".to_string(),
        ));
    }

    let token = create_token(&user, &config.jwt_secret, config.jwt_expiry_hours)?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok(LoginOutcome { token, user })
}

/// Consume a verification token.
pub async fn verify_email(db: &DatabaseConnection, raw_token: &str) -> Result<(), SliceError> {
    let now = Utc::now().naive_utc();
    let user = User::find()
        .filter(user::Column::VerificationTokenHash.eq(hash_token(raw_token)))
        .filter(user::Column::VerificationTokenExpiresAt.gt(now))
        .one(db)
        .await?
        .ok_or_else(|| {
            SliceError::Validation("Invalid or expired verification token".to_string())
        })?;

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.email_verified = Set(true);
    active.verification_token_hash = Set(None);
    active.verification_token_expires_at = Set(None);
    active.updated_at = Set(now);
    active.update(db).await?;

    tracing::info!(user_id, "email verified");
    Ok(())
}

/// Issue and mail a fresh verification token, replacing any earlier one.
pub async fn resend_verification(
    db: &DatabaseConnection,
    config: &Config,
    mailer: &dyn Mailer,
    email: &str,
) -> Result<(), SliceError> {
    if email.trim().is_empty() {
        return Err(SliceError::Validation("Email is required".to_string()));
    }
    let user = find_by_email(db, email)
        .await?
        .ok_or_else(|| SliceError::NotFound("User not found with this email".to_string()))?;

    if user.email_verified {
        return Err(SliceError::Validation(
            "Email is already verified".to_string(),
        ));
    }

    let token = IssuedToken::new(config.security.email_verification_expiry_secs);
    let mut active: user::ActiveModel = user.into();
    active.verification_token_hash = Set(Some(token.hash.clone()));
    active.verification_token_expires_at = Set(Some(token.expires_at));
    active.updated_at = Set(Utc::now().naive_utc());
    let user = active.update(db).await?;

    send_verification(config, mailer, &user, &token.raw).await;
    tracing::info!(user_id = user.id, "verification email resent");
    Ok(())
}

/// Start a password reset. Unknown addresses succeed silently.
pub async fn forgot_password(
    db: &DatabaseConnection,
    config: &Config,
    mailer: &dyn Mailer,
    email: &str,
) -> Result<(), SliceError> {
    if email.trim().is_empty() {
        return Err(SliceError::Validation("Email is required".to_string()));
    }
    let Some(user) = find_by_email(db, email).await? else {
        tracing::debug!("password reset requested for unknown email");
        return Ok(());
    };

    let token = IssuedToken::new(config.security.password_reset_expiry_secs);
    let mut active: user::ActiveModel = user.into();
    active.reset_token_hash = Set(Some(token.hash.clone()));
    active.reset_token_expires_at = Set(Some(token.expires_at));
    active.updated_at = Set(Utc::now().naive_utc());
    let user = active.update(db).await?;

    let template = EmailTemplate::PasswordReset {
        username: user.username.clone(),
        link: action_link(config, "reset-password", &token.raw),
        expires_in_secs: config.security.password_reset_expiry_secs,
    };
    if let Err(e) = mailer.send(&user.email, template).await {
        tracing::warn!(user_id = user.id, error = %e, "password reset email failed");
    }
    tracing::info!(user_id = user.id, "password reset requested");
    Ok(())
}

/// Consume a reset token and set a new password.
pub async fn reset_password(
    db: &DatabaseConnection,
    config: &Config,
    raw_token: &str,
    new_password: &str,
) -> Result<(), SliceError> {
    if new_password.is_empty() {
        return Err(SliceError::Validation(
            "New password is required".to_string(),
        ));
    }
    check_password_length(config, new_password)?;

    let now = Utc::now().naive_utc();
    let user = User::find()
        .filter(user::Column::ResetTokenHash.eq(hash_token(raw_token)))
        .filter(user::Column::ResetTokenExpiresAt.gt(now))
        .one(db)
        .await?
        .ok_or_else(|| SliceError::Validation("Invalid or expired reset token".to_string()))?;

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.reset_token_hash = Set(None);
    active.reset_token_expires_at = Set(None);
    active.updated_at = Set(now);
    active.update(db).await?;

    tracing::info!(user_id, "password reset");
    Ok(())
}

/// Grant the admin role. Used by the CLI.
pub async fn promote_to_admin(
    db: &DatabaseConnection,
    email: &str,
) -> Result<user::Model, SliceError> {
    let user = find_by_email(db, email)
        .await?
        .ok_or_else(|| SliceError::NotFound("User not found with this email".to_string()))?;
    let mut active: user::ActiveModel = user.into();
    active.role = Set(Role::Admin);
    active.updated_at = Set(Utc::now().naive_utc());
    Ok(active.update(db).await?)
}
