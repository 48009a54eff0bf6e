/// Database row types

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl Chirp {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chirp_ownership() {
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: "hello".to_string(),
            user_id: owner,
        };

        assert!(chirp.is_owned_by(owner));
        assert!(!chirp.is_owned_by(Uuid::new_v4()));
    }
}
