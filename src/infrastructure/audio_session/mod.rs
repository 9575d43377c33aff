//! Audio session adapters
//!
//! cpal has no session object, so "configuring the session" means resolving
//! which devices capture, playback and monitoring should use. The result is
//! kept in an [`AudioRoute`] shared by the adapters.

mod cpal_session;
mod permission;
mod route;

pub use cpal_session::CpalAudioSession;
pub use permission::CpalPermission;
pub use route::{AudioRoute, SharedRoute};
