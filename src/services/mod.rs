pub mod ledger;

pub use ledger::{AccountSummary, DailyBonusGrant, LedgerService, ReferralOutcome};
