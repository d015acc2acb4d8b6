//! Account session handling
//!
//! [`SessionGuard`] decides where a starting process lands; [`AuthService`]
//! runs the sign-up, OTP login, password reset and logout flows.

pub mod flow;
pub mod guard;

pub use flow::{AuthService, DEFAULT_USERNAME};
pub use guard::{EntryRoute, SessionGuard};
