use crate::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The community's governable tunables.
///
/// Persisted as a singleton ledger record so every replica observes enacted
/// changes; a missing record means genesis defaults. Mutated only through a
/// passed change-variable proposal. Field names match the variable names
/// accepted by those proposals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variables {
    #[serde(rename = "InitCredit")]
    pub init_credit: i64,
    #[serde(rename = "CreditBorder")]
    pub credit_border: i64,
    #[serde(rename = "TxAwardCredit")]
    pub tx_award_credit: i64,
    #[serde(rename = "PowerBorder")]
    pub power_border: i64,
    #[serde(rename = "BallotAwardCredit")]
    pub ballot_award_credit: i64,
    #[serde(rename = "CommitteeMemberNumber")]
    pub committee_member_number: i64,
}

impl Default for Variables {
    fn default() -> Self {
        Self {
            init_credit: 100,
            credit_border: 50,
            tx_award_credit: 5,
            power_border: 50,
            ballot_award_credit: 6,
            committee_member_number: 5,
        }
    }
}

impl Variables {
    /// Tiered settlement reward for a delivered/consumed volume.
    ///
    /// One extra `tx_award_credit` per full `power_border` of volume, with a
    /// floor of one tier. Integer division, truncating toward zero.
    pub fn award_credit(&self, power: i64) -> i64 {
        (power / self.power_border + 1) * self.tx_award_credit
    }
}

/// Whitelist of variable names a change proposal may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKey {
    InitCredit,
    CreditBorder,
    TxAwardCredit,
    PowerBorder,
    BallotAwardCredit,
    CommitteeMemberNumber,
}

impl VariableKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKey::InitCredit => "InitCredit",
            VariableKey::CreditBorder => "CreditBorder",
            VariableKey::TxAwardCredit => "TxAwardCredit",
            VariableKey::PowerBorder => "PowerBorder",
            VariableKey::BallotAwardCredit => "BallotAwardCredit",
            VariableKey::CommitteeMemberNumber => "CommitteeMemberNumber",
        }
    }

    /// Validate a proposed value for this variable.
    ///
    /// `PowerBorder` is a divisor in the reward tiers and must stay >= 1;
    /// `CommitteeMemberNumber` is a selection count and must stay >= 0.
    /// The credit variables are unconstrained signed values.
    pub fn validate(&self, value: i64) -> Result<()> {
        match self {
            VariableKey::PowerBorder if value < 1 => Err(GridError::InvalidInput(format!(
                "PowerBorder must be >= 1, got {}",
                value
            ))),
            VariableKey::CommitteeMemberNumber if value < 0 => {
                Err(GridError::InvalidInput(format!(
                    "CommitteeMemberNumber must be >= 0, got {}",
                    value
                )))
            }
            _ => Ok(()),
        }
    }

    /// Write `value` into the named slot of `vars`.
    pub fn apply(&self, vars: &mut Variables, value: i64) {
        match self {
            VariableKey::InitCredit => vars.init_credit = value,
            VariableKey::CreditBorder => vars.credit_border = value,
            VariableKey::TxAwardCredit => vars.tx_award_credit = value,
            VariableKey::PowerBorder => vars.power_border = value,
            VariableKey::BallotAwardCredit => vars.ballot_award_credit = value,
            VariableKey::CommitteeMemberNumber => vars.committee_member_number = value,
        }
    }
}

impl FromStr for VariableKey {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "InitCredit" => Ok(VariableKey::InitCredit),
            "CreditBorder" => Ok(VariableKey::CreditBorder),
            "TxAwardCredit" => Ok(VariableKey::TxAwardCredit),
            "PowerBorder" => Ok(VariableKey::PowerBorder),
            "BallotAwardCredit" => Ok(VariableKey::BallotAwardCredit),
            "CommitteeMemberNumber" => Ok(VariableKey::CommitteeMemberNumber),
            other => Err(GridError::InvalidInput(format!(
                "unknown variable: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_genesis_values() {
        let vars = Variables::default();
        assert_eq!(vars.init_credit, 100);
        assert_eq!(vars.credit_border, 50);
        assert_eq!(vars.tx_award_credit, 5);
        assert_eq!(vars.power_border, 50);
        assert_eq!(vars.ballot_award_credit, 6);
        assert_eq!(vars.committee_member_number, 5);
    }

    #[test]
    fn award_credit_tiers() {
        let vars = Variables::default();

        // Below one border: base tier only
        assert_eq!(vars.award_credit(0), 5);
        assert_eq!(vars.award_credit(49), 5);
        // One extra tier per full border
        assert_eq!(vars.award_credit(50), 10);
        assert_eq!(vars.award_credit(80), 10);
        assert_eq!(vars.award_credit(100), 15);
    }

    #[test]
    fn every_key_parses_and_applies() {
        let mut vars = Variables::default();

        for (name, read) in [
            ("InitCredit", (|v: &Variables| v.init_credit) as fn(&Variables) -> i64),
            ("CreditBorder", |v| v.credit_border),
            ("TxAwardCredit", |v| v.tx_award_credit),
            ("PowerBorder", |v| v.power_border),
            ("BallotAwardCredit", |v| v.ballot_award_credit),
            ("CommitteeMemberNumber", |v| v.committee_member_number),
        ] {
            let key: VariableKey = name.parse().unwrap();
            assert_eq!(key.as_str(), name);
            key.apply(&mut vars, 77);
            assert_eq!(read(&vars), 77);
        }
    }

    #[test]
    fn unknown_variable_is_rejected() {
        assert!(matches!(
            "MaxVoltage".parse::<VariableKey>(),
            Err(GridError::InvalidInput(_))
        ));
    }

    #[test]
    fn divisor_and_count_values_are_validated() {
        assert!(VariableKey::PowerBorder.validate(1).is_ok());
        assert!(VariableKey::PowerBorder.validate(0).is_err());
        assert!(VariableKey::CommitteeMemberNumber.validate(0).is_ok());
        assert!(VariableKey::CommitteeMemberNumber.validate(-1).is_err());
        // Credit variables may go negative
        assert!(VariableKey::InitCredit.validate(-100).is_ok());
    }
}
