use sqlx::PgPool;
use validator::Validate;

use crate::auth::{
    hash_password, verify_password, LoginRequest, RegisterRequest, TokenService,
    UpdateDetailsRequest, UpdatePasswordRequest,
};
use crate::error::AppError;
use crate::models::{NewUser, User};

/// Creates an account and returns it with a fresh token.
pub async fn register(
    pool: &PgPool,
    tokens: &TokenService,
    request: &RegisterRequest,
) -> Result<(User, String), AppError> {
    let (name, email, password) = request.validated()?;

    if User::find_by_email(pool, email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let user = User::create(
        pool,
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role: request.role.unwrap_or_default(),
        },
    )
    .await?;
    log::info!("Registered user {}", user.id);

    let token = tokens.issue(user.id)?;
    Ok((user, token))
}

/// Unknown email and wrong password produce the same error.
pub async fn login(
    pool: &PgPool,
    tokens: &TokenService,
    request: &LoginRequest,
) -> Result<(User, String), AppError> {
    let (email, password) = request.credentials()?;
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let user = User::find_by_email(pool, email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password_hash)? {
        log::debug!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = tokens.issue(user.id)?;
    Ok((user, token))
}

pub async fn update_details(
    pool: &PgPool,
    user: &User,
    request: UpdateDetailsRequest,
) -> Result<User, AppError> {
    let request = request.normalized();
    request.validate()?;

    let updated = User::update_details(
        pool,
        user.id,
        request.name.as_deref(),
        request.email.as_deref(),
    )
    .await?;
    Ok(updated)
}

/// Replaces the password and returns a new token.
pub async fn update_password(
    pool: &PgPool,
    tokens: &TokenService,
    user: &User,
    request: &UpdatePasswordRequest,
) -> Result<String, AppError> {
    let (current, new) = request.validated()?;

    if !verify_password(current, &user.password_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    User::update_password_hash(pool, user.id, &hash_password(new)?).await?;
    log::info!("Password changed for user {}", user.id);

    tokens.issue(user.id)
}
