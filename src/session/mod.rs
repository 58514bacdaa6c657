pub mod controller;
pub mod error;
pub mod state;

pub use controller::{SessionController, SessionSnapshot};
pub use error::{InvalidTagError, RejectionReason};
pub use state::{SessionMode, SessionState, SessionTimers, SessionView};
