use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Role, UserProfile};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthData {
    pub user: UserProfile,
    /// `Bearer `-prefixed, usable as an `Authorization` header value as-is.
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Email of the authenticated user.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}
