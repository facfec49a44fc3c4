/*!
# Gridpact Types

Shared primitives for the gridpact community-energy core:

- **user**: identity records (`User`, `Role`) and the singleton index /
  committee lists
- **variables**: the community's governable tunables (`Variables`) and the
  settlement reward tiers
- **timestamp**: opaque ordering strings attached to proposals and compacts
- **error**: the error taxonomy shared by every engine

Everything here is plain data. All records serialize with the exact JSON
field names used on the ledger, so a record written by one replica (or by the
previous deployment) reads back identically on any other.
*/

pub mod error;
pub mod timestamp;
pub mod user;
pub mod variables;

pub use error::{GridError, Result};
pub use user::{Committee, Role, User, UserList};
pub use variables::{Variables, VariableKey};
