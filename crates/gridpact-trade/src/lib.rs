/*!
# Gridpact Trade

Bilateral energy-trade negotiation: a consumer opens a compact for a volume
at an asking price, a plant bids, the consumer haggles or accepts, an admin
ratifies the deal, and settlement rewards both sides by delivered volume and
records throughput for all three parties.

The negotiation is a strict state machine — each operation names the exact
state it acts on and fails `InvalidState` without mutation otherwise — and
every transition is a deterministic function of the stored compact and the
caller's input.
*/

pub mod engine;
pub mod types;

pub use engine::TradeEngine;
pub use types::{Compact, CompactState};
