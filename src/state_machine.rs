//! Brewing session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod action;
mod effect;
pub mod render;
pub mod state;
pub(crate) mod transition;


pub use action::{Action, Control};
pub use effect::Effect;
pub use render::{Button, Keyboard, Notification};
pub use state::{ChatContext, SessionPhase, Snapshot};
pub use transition::{transition, TransitionResult};
