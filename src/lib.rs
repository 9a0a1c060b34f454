pub mod handler;
pub mod keepalive;
pub mod roster;
pub mod signup;

pub use handler::Handler;
pub use roster::{decode, encode, Roster, RosterEntry};
pub use signup::{apply_signup, SignupError};
