use gridpact_types::{GridError, Result, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Who is eligible to vote on a ballot proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every registered user at creation time.
    Public,
    /// The committee membership at creation time.
    League,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Public => "Public",
            Scope::League => "League",
        }
    }
}

impl FromStr for Scope {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Public" => Ok(Scope::Public),
            "League" => Ok(Scope::League),
            other => Err(GridError::InvalidInput(format!(
                "unknown proposal scope: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposal lifecycle. `Done` is terminal; checking is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Voting,
    Done,
}

impl ProposalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalState::Voting => "Voting",
            ProposalState::Done => "Done",
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voter snapshot captured at proposal creation.
///
/// `user_credit` is the voting weight for this proposal regardless of any
/// later credit changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    pub voter_name: String,
    pub user_credit: i64,
    pub power: i64,
    pub voted: bool,
}

impl Voter {
    pub fn snapshot(user: &User) -> Self {
        Self {
            voter_name: user.user_name.clone(),
            user_credit: user.user_credit,
            power: user.power,
            voted: false,
        }
    }
}

/// Candidate snapshot for an election, tallying received votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_name: String,
    pub user_credit: i64,
    pub power: i64,
    pub votes: i64,
}

impl Candidate {
    pub fn nominate(user: &User) -> Self {
        Self {
            candidate_name: user.user_name.clone(),
            user_credit: user.user_credit,
            power: user.power,
            votes: 0,
        }
    }
}

/// An up/down proposal with credit-weighted tallies.
///
/// `variable`/`value` carry the change-variable payload; `variable` is empty
/// for plain ballots. Maps are ordered so serialized records are identical
/// across replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotProposal {
    pub ballot_proposal_name: String,
    pub proposer_name: String,
    pub proposal_type: Scope,
    pub voter_map: BTreeMap<String, Voter>,
    pub up_votes: i64,
    pub negative_votes: i64,
    pub number_of_voter: i64,
    pub number_of_voted: i64,
    pub state: ProposalState,
    pub start_time: String,
    pub end_time: String,
    pub variable: String,
    pub value: i64,
    pub result: bool,
}

/// An election proposal ranking candidates for committee seats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionProposal {
    pub election_proposal_name: String,
    pub proposer_name: String,
    pub candidate_map: BTreeMap<String, Candidate>,
    pub voter_map: BTreeMap<String, Voter>,
    pub state: ProposalState,
    pub start_time: String,
    pub end_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpact_types::Role;

    #[test]
    fn scope_parses_its_wire_names() {
        assert_eq!("Public".parse::<Scope>().unwrap(), Scope::Public);
        assert_eq!("League".parse::<Scope>().unwrap(), Scope::League);
        assert!(matches!(
            "Private".parse::<Scope>(),
            Err(GridError::InvalidInput(_))
        ));
    }

    #[test]
    fn proposal_state_terminality() {
        assert!(!ProposalState::Voting.is_terminal());
        assert!(ProposalState::Done.is_terminal());
    }

    #[test]
    fn voter_snapshot_freezes_credit() {
        let mut user = User {
            user_name: "alice".to_string(),
            user_role: Role::PowerUser,
            user_credit: 100,
            power: 10,
        };
        let voter = Voter::snapshot(&user);

        user.user_credit = 999;
        assert_eq!(voter.user_credit, 100);
        assert!(!voter.voted);
    }

    #[test]
    fn ballot_serializes_with_ledger_field_names() {
        let proposal = BallotProposal {
            ballot_proposal_name: "p1".to_string(),
            proposer_name: "alice".to_string(),
            proposal_type: Scope::Public,
            voter_map: BTreeMap::new(),
            up_votes: 0,
            negative_votes: 0,
            number_of_voter: 0,
            number_of_voted: 0,
            state: ProposalState::Voting,
            start_time: "2024-01-01 00:00:00".to_string(),
            end_time: "2024-01-02 00:00:00".to_string(),
            variable: String::new(),
            value: 0,
            result: false,
        };

        let json = serde_json::to_value(&proposal).unwrap();
        assert_eq!(json["ballot_proposal_name"], "p1");
        assert_eq!(json["proposal_type"], "Public");
        assert_eq!(json["negative_votes"], 0);
        assert_eq!(json["number_of_voter"], 0);
        assert_eq!(json["state"], "Voting");
        assert_eq!(json["variable"], "");
    }
}
