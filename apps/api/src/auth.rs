mod session;
mod signup;

pub use session::{logout_handler, me_handler, session_handler};
pub use signup::signup_handler;

pub const SESSION_USER_KEY: &str = "fleetgate.session_user";
pub const SESSION_CREATED_AT_KEY: &str = "fleetgate.session_created_at";
