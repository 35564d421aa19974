//! Order/position management: the per-bar state machine.
//!
//! **Key Design Principles:**
//! 1. The manager emits **intents** ([`ManagerAction`]), never fills
//! 2. **Ratchet invariant**: stops may tighten, never loosen
//! 3. The execution engine is the source of truth for fills; the manager
//!    resynchronises from its snapshot before every decision
//!
//! **Module Structure:**
//! - `action`: intents, coarse state, run counters
//! - `config`: structural-stop and cancel-threshold parameters
//! - `machine`: the `OrderPositionManager` itself
//! - `ratchet`: ratchet state enforcement
//! - `structural`: structural stop levels from recent extremes

pub mod action;
pub mod config;
pub mod machine;
pub mod ratchet;
pub mod structural;

pub use action::{ManagerAction, ManagerState, ManagerStats};
pub use config::{CancelThresholdMode, ManagerConfig};
pub use machine::OrderPositionManager;
pub use ratchet::RatchetState;
pub use structural::StructuralLevels;
