use actix_web::{get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

use super::envelope;
use crate::{
    auth::{
        AuthResponse, CurrentUser, LoginRequest, RegisterRequest, TokenService,
        UpdateDetailsRequest, UpdatePasswordRequest,
    },
    error::AppError,
    models::UserProfile,
    services::accounts,
};

/// Register a new user
///
/// Creates a new user account and returns it with an authentication token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let (user, token) = accounts::register(&pool, &tokens, &body).await?;

    Ok(HttpResponse::Created().json(envelope(
        Some("User registered successfully"),
        json!(AuthResponse {
            user: UserProfile::from(&user),
            token,
        }),
    )))
}

/// Login user
///
/// Authenticates a user and returns an authentication token.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (user, token) = accounts::login(&pool, &tokens, &body).await?;

    Ok(HttpResponse::Ok().json(envelope(
        Some("Login successful"),
        json!(AuthResponse {
            user: UserProfile::from(&user),
            token,
        }),
    )))
}

/// The profile of the token holder.
#[get("/me")]
pub async fn me(current: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(envelope(
        None,
        json!({ "user": UserProfile::from(&current.0) }),
    )))
}

/// Changes name and/or email. Role and password are not touched here.
#[put("/update-details")]
pub async fn update_details(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    body: web::Json<UpdateDetailsRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts::update_details(&pool, &current.0, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(envelope(
        Some("User details updated successfully"),
        json!({ "user": UserProfile::from(&user) }),
    )))
}

#[put("/update-password")]
pub async fn update_password(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    current: CurrentUser,
    body: web::Json<UpdatePasswordRequest>,
) -> Result<impl Responder, AppError> {
    let token = accounts::update_password(&pool, &tokens, &current.0, &body).await?;

    Ok(HttpResponse::Ok().json(envelope(
        Some("Password updated successfully"),
        json!({ "token": token }),
    )))
}
