use crate::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor role in the community.
///
/// Serialized with the historical lowercase names so existing ledger records
/// deserialize unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "powerPlant")]
    PowerPlant,
    #[serde(rename = "powerUser")]
    PowerUser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::PowerPlant => "powerPlant",
            Role::PowerUser => "powerUser",
        }
    }
}

impl FromStr for Role {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "powerPlant" => Ok(Role::PowerPlant),
            "powerUser" => Ok(Role::PowerUser),
            other => Err(GridError::InvalidInput(format!(
                "unknown role: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered community member.
///
/// `user_credit` is the reputation score that gates participation and serves
/// as voting weight; `power` is the signed cumulative throughput counter.
/// Both are additive and unbounded — credit may go negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_name: String,
    pub user_role: Role,
    pub user_credit: i64,
    pub power: i64,
}

/// Insertion-ordered index of every registered user name.
///
/// Stored under a singleton key; the order is the registration order and is
/// the canonical iteration order for voter snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserList {
    #[serde(rename = "Users")]
    pub users: Vec<String>,
}

/// The elected committee, ranked best-first.
///
/// Overwritten wholesale on each election check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Committee {
    #[serde(rename = "Users")]
    pub users: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_historical_names() {
        for (role, name) in [
            (Role::Admin, "admin"),
            (Role::PowerPlant, "powerPlant"),
            (Role::PowerUser, "powerUser"),
        ] {
            assert_eq!(role.as_str(), name);
            assert_eq!(name.parse::<Role>().unwrap(), role);
            assert_eq!(
                serde_json::to_string(&role).unwrap(),
                format!("\"{}\"", name)
            );
        }
    }

    #[test]
    fn unknown_role_is_invalid_input() {
        let err = "operator".parse::<Role>().unwrap_err();
        assert!(matches!(err, GridError::InvalidInput(_)));
    }

    #[test]
    fn user_serializes_with_ledger_field_names() {
        let user = User {
            user_name: "alice".to_string(),
            user_role: Role::PowerUser,
            user_credit: 100,
            power: 0,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_name"], "alice");
        assert_eq!(json["user_role"], "powerUser");
        assert_eq!(json["user_credit"], 100);
        assert_eq!(json["power"], 0);
    }

    #[test]
    fn user_list_uses_capitalized_users_field() {
        let list = UserList {
            users: vec!["alice".to_string()],
        };
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["Users"][0], "alice");
    }
}
