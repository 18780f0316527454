//! Ledger entry model and the kind/status vocabularies

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Transaction kinds for coin movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Bonus,
    Referral,
    Purchase,
    StreamDebit,
    DailyBonus,
    Refund,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bonus => "bonus",
            Self::Referral => "referral",
            Self::Purchase => "purchase",
            Self::StreamDebit => "stream_debit",
            Self::DailyBonus => "daily_bonus",
            Self::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bonus" => Some(Self::Bonus),
            "referral" => Some(Self::Referral),
            "purchase" => Some(Self::Purchase),
            "stream_debit" => Some(Self::StreamDebit),
            "daily_bonus" => Some(Self::DailyBonus),
            "refund" => Some(Self::Refund),
            _ => None,
        }
    }
}

/// Entry statuses; a pending entry may move to completed or failed, never back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One immutable record of a balance change.
///
/// Ids are assigned monotonically in creation order. Only completed entries
/// count toward the account balance.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: String,
    pub delta: i64,
    pub status: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl LedgerEntry {
    pub fn entry_kind(&self) -> Option<EntryKind> {
        EntryKind::from_str(&self.kind)
    }

    pub fn entry_status(&self) -> Option<EntryStatus> {
        EntryStatus::from_str(&self.status)
    }

    pub fn is_completed(&self) -> bool {
        self.status == EntryStatus::Completed.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_conversion() {
        assert_eq!(EntryKind::StreamDebit.as_str(), "stream_debit");
        assert_eq!(EntryKind::from_str("daily_bonus"), Some(EntryKind::DailyBonus));
        assert_eq!(EntryKind::from_str("jackpot"), None);
    }

    #[test]
    fn test_entry_status_conversion() {
        assert_eq!(EntryStatus::Pending.as_str(), "pending");
        assert_eq!(EntryStatus::from_str("failed"), Some(EntryStatus::Failed));
        assert_eq!(EntryStatus::from_str("reversed"), None);
    }
}
