use uuid::Uuid;

use crate::error::AppError;

/// Implemented by every record that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// Must be called before any update/delete/status transition. Read-only
/// window queries are already scoped by the requesting user's own id and skip
/// this; the public aggregate path filters on member visibility instead.
pub fn authorize<T: Owned>(entry: &T, acting_user: Uuid) -> Result<(), AppError> {
    if entry.owner_id() == acting_user {
        Ok(())
    } else {
        Err(AppError::AccessDenied(
            "no permission to modify this entry".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        user_id: Uuid,
    }

    impl Owned for Row {
        fn owner_id(&self) -> Uuid {
            self.user_id
        }
    }

    #[test]
    fn owner_passes() {
        let user = Uuid::new_v4();
        let row = Row { user_id: user };
        assert!(authorize(&row, user).is_ok());
    }

    #[test]
    fn non_owner_is_denied() {
        let row = Row {
            user_id: Uuid::new_v4(),
        };
        let err = authorize(&row, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
    }
}
