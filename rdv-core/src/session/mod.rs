//! Session lifecycle: status state machine and the controller that owns
//! the frame pump.

pub mod controller;
pub mod state;

pub use controller::{SessionController, StopOutcome};
pub use state::{Credentials, SessionMode, SessionStatus};
