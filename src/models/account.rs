use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's coin account.
///
/// The balance is only ever mutated through ledger operations and always
/// equals the sum of the user's completed ledger entry deltas. Accounts are
/// deactivated, never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub user_id: Uuid,
    pub balance: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Whether a debit of `amount` can currently be covered
    pub fn can_cover(&self, amount: i64) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_cover_is_inclusive() {
        let ts = chrono::Utc::now().naive_utc();
        let account = Account {
            user_id: Uuid::new_v4(),
            balance: 50,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        };

        assert!(account.can_cover(50));
        assert!(!account.can_cover(51));
    }
}
