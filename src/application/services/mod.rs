//! Application services - Sessions and their built-in behavior

pub mod defaults;
pub mod session;
pub mod typing;

pub use defaults::{standard_session, SessionOptions};
pub use session::{Session, SessionBuilder, SessionHandler};
pub use typing::TypingTracker;
