use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Whether a member's entries show up in the "all public users" aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "disclosure", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Disclosure {
    Public,
    Private,
}

impl Disclosure {
    pub fn toggled(self) -> Disclosure {
        match self {
            Disclosure::Public => Disclosure::Private,
            Disclosure::Private => Disclosure::Public,
        }
    }
}

/// Plain data record; authentication claims are mapped separately in
/// `auth::claims`.
#[derive(Debug, Clone, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub disclosure: Disclosure,
    pub created_at: OffsetDateTime,
}

const MEMBER_COLUMNS: &str = "id, login, email, nickname, password_hash, disclosure, created_at";

impl Member {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_login(db: &PgPool, login: &str) -> sqlx::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE login = $1"
        ))
        .bind(login)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_nickname(db: &PgPool, nickname: &str) -> sqlx::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE nickname = $1"
        ))
        .bind(nickname)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn create(
        db: &PgPool,
        login: &str,
        email: &str,
        nickname: &str,
        password_hash: &str,
    ) -> sqlx::Result<Member> {
        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            INSERT INTO members (login, email, nickname, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(login)
        .bind(email)
        .bind(nickname)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(member)
    }

    pub async fn set_disclosure(
        db: &PgPool,
        id: Uuid,
        disclosure: Disclosure,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE members SET disclosure = $2 WHERE id = $1")
            .bind(id)
            .bind(disclosure)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Read-only member directory feeding the public aggregates.
    pub async fn find_public(db: &PgPool) -> sqlx::Result<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE disclosure = 'PUBLIC' ORDER BY nickname"
        ))
        .fetch_all(db)
        .await?;
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disclosure_toggles_both_ways() {
        assert_eq!(Disclosure::Public.toggled(), Disclosure::Private);
        assert_eq!(Disclosure::Private.toggled(), Disclosure::Public);
    }
}
