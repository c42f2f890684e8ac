use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::members::dto::{LoginRequest, RegisterRequest};
use crate::members::repo::{Disclosure, Member};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// At least 8 characters including one non-alphanumeric.
pub(crate) fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8 && password.chars().any(|c| !c.is_alphanumeric())
}

pub async fn register(db: &PgPool, req: &RegisterRequest) -> Result<Member, AppError> {
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput("invalid email format".into()));
    }
    if !is_valid_password(&req.password) {
        return Err(AppError::InvalidInput(
            "password must be at least 8 characters and contain a special character".into(),
        ));
    }
    if req.login.trim().is_empty() || req.nickname.trim().is_empty() {
        return Err(AppError::InvalidInput("login and nickname are required".into()));
    }

    if Member::find_by_login(db, &req.login).await?.is_some() {
        return Err(AppError::Conflict("login already in use".into()));
    }
    if Member::find_by_email(db, &email).await?.is_some() {
        return Err(AppError::Conflict("email already in use".into()));
    }
    if Member::find_by_nickname(db, &req.nickname).await?.is_some() {
        return Err(AppError::Conflict("nickname already in use".into()));
    }

    let hash = hash_password(&req.password)?;
    let member = Member::create(db, &req.login, &email, &req.nickname, &hash).await?;
    info!(member_id = %member.id, "member registered");
    Ok(member)
}

pub async fn login(db: &PgPool, req: &LoginRequest) -> Result<Member, AppError> {
    let member = Member::find_by_login(db, &req.login)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;

    if !verify_password(&req.password, &member.password_hash)? {
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }
    Ok(member)
}

pub async fn member_info(db: &PgPool, member_id: Uuid) -> Result<Member, AppError> {
    Member::find_by_id(db, member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("member not found".into()))
}

pub async fn toggle_disclosure(db: &PgPool, member_id: Uuid) -> Result<Disclosure, AppError> {
    let member = member_info(db, member_id).await?;
    let next = member.disclosure.toggled();
    Member::set_disclosure(db, member.id, next).await?;
    info!(member_id = %member.id, disclosure = ?next, "disclosure changed");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn password_needs_length_and_special_char() {
        assert!(is_valid_password("longen0ugh!"));
        assert!(!is_valid_password("short!"));
        assert!(!is_valid_password("nospecialchar1"));
    }
}
