//! Request-level policies
//!
//! Decision logic the execution engine consults between exchanges: whether
//! to follow a redirect, and whether (and how long) to wait before retrying.

pub mod redirect;
pub mod retry;

pub use redirect::{Hop, RedirectResolver};
pub use retry::RetryPolicy;
