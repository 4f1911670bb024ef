//! Temporary storage for phone-verified signups.
//!
//! Partially completed registrations live in memory, keyed by phone
//! number, until the verification code is confirmed or the entry
//! expires. Nothing is persisted; a restart drops every pending signup.

mod clock;
mod config;
mod error;
mod phone;
mod signup;
mod store;
mod sweeper;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SignupConfig, StoreConfig, MAX_CODE_LENGTH, MIN_CODE_LENGTH};
pub use error::{SignupError, VerifyError};
pub use phone::normalize_phone_number;
pub use signup::{generate_code, SignupFlow, SmsSender, StartedSignup, UserRepository};
pub use store::TempSessionStore;
pub use sweeper::{spawn_sweeper, SessionSweeper, SweeperHandle, MIN_SWEEP_INTERVAL};
pub use types::*;
