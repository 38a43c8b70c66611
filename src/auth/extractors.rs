use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;

use crate::auth::Claims;
use crate::error::AppError;
use crate::models::User;
use crate::policy::Actor;

/// The authenticated user, loaded fresh from the store on every request.
///
/// Tokens only carry the user id; the role used for authorization is always the
/// stored one. Routes using this extractor must be wrapped by `AuthMiddleware`,
/// which verifies the token and leaves its claims in the request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }
}

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let pool = req.app_data::<web::Data<PgPool>>().cloned();

        Box::pin(async move {
            let claims = claims.ok_or_else(|| {
                AppError::Unauthorized("Not authorized to access this route".into())
            })?;
            let pool =
                pool.ok_or_else(|| AppError::Internal("Database pool is not configured".into()))?;

            match User::find_by_id(pool.get_ref(), claims.sub).await {
                Ok(Some(user)) => Ok(CurrentUser(user)),
                Ok(None) => Err(AppError::Unauthorized(
                    "The user belonging to this token no longer exists".into(),
                )
                .into()),
                Err(e) => Err(AppError::from(e).into()),
            }
        })
    }
}
