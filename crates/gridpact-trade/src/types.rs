use serde::{Deserialize, Serialize};
use std::fmt;

/// Negotiation state of a compact.
///
/// Serialized with the historical names already on the ledger, including the
/// `"Biding"` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompactState {
    /// Open for bids from plants.
    Committing,
    /// A plant has bid; the consumer decides.
    #[serde(rename = "Biding")]
    Biding,
    /// The consumer accepted the bid; awaiting ratification.
    Accepted,
    /// Ratified by an admin; awaiting settlement.
    Deal,
    /// Withdrawn by the consumer before any accepted bid.
    CancelCommit,
    /// Settled.
    Done,
}

impl CompactState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompactState::Committing => "Committing",
            CompactState::Biding => "Biding",
            CompactState::Accepted => "Accepted",
            CompactState::Deal => "Deal",
            CompactState::CancelCommit => "CancelCommit",
            CompactState::Done => "Done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CompactState::CancelCommit | CompactState::Done)
    }

    pub fn can_transition_to(&self, next: &CompactState) -> bool {
        use CompactState::*;
        matches!(
            (self, next),
            (Committing, Biding)
                | (Committing, CancelCommit)
                | (Biding, Committing)
                | (Biding, Accepted)
                | (Accepted, Deal)
                | (Deal, Done)
        )
    }
}

impl fmt::Display for CompactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bilateral energy-trade record.
///
/// `transaction` is the committed volume; `power_plant_name` and
/// `admin_name` are empty until a bid lands and the deal is ratified.
/// `start_time`/`end_time` are advisory window metadata, ordered at creation
/// and never enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compact {
    pub compact_id: String,
    pub state: CompactState,
    pub power_plant_name: String,
    pub power_user_name: String,
    pub admin_name: String,
    pub transaction: i64,
    pub price: f64,
    pub start_time: String,
    pub end_time: String,
}
