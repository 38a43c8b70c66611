pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::{Role, UserProfile};

// Re-export necessary items
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

/// Returns the trimmed value, or `None` when it is absent or blank.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Represents the payload for a new user registration request.
///
/// Fields are optional at the wire level so that a missing field produces the
/// same "all required fields" message as a blank one.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, 1 to 50 characters.
    #[validate(length(min = 1, max = 50, message = "Name cannot be more than 50 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    /// Must be at least 6 characters long.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    /// Defaults to `user` when omitted.
    pub role: Option<Role>,
}

impl RegisterRequest {
    /// Checks presence first, then field rules.
    pub fn validated(&self) -> Result<(&str, &str, &str), AppError> {
        let (Some(name), Some(email), Some(password)) = (
            present(&self.name),
            present(&self.email),
            self.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::BadRequest(
                "Please provide all required fields".into(),
            ));
        };
        self.validate()?;
        Ok((name, email, password))
    }
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn credentials(&self) -> Result<(&str, &str), AppError> {
        match (
            present(&self.email),
            self.password.as_deref().filter(|p| !p.is_empty()),
        ) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(AppError::BadRequest(
                "Please provide email and password".into(),
            )),
        }
    }
}

/// Payload for `PUT /api/auth/update-details`. Anything but name and email is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDetailsRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
}

impl UpdateDetailsRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self.email = self.email.map(|email| email.trim().to_string());
        self
    }
}

/// Payload for `PUT /api/auth/update-password`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

impl UpdatePasswordRequest {
    pub fn validated(&self) -> Result<(&str, &str), AppError> {
        let (Some(current), Some(new)) = (
            self.current_password.as_deref().filter(|p| !p.is_empty()),
            self.new_password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::BadRequest(
                "Please provide current and new password".into(),
            ));
        };
        self.validate()?;
        Ok((current, new))
    }
}

/// Body of the register and login responses (under `data`).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    /// The JWT for session authentication.
    pub token: String,
}
