use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::members::repo::{Disclosure, Member};

/// Request body for member registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub nickname: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub member: PublicMember,
}

#[derive(Debug, Serialize)]
pub struct PublicMember {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub nickname: String,
    pub disclosure: Disclosure,
}

impl From<Member> for PublicMember {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            login: m.login,
            email: m.email,
            nickname: m.nickname,
            disclosure: m.disclosure,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DisclosureResponse {
    pub disclosure: Disclosure,
}
