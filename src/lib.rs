pub mod attributes;
pub mod egl;
pub mod error;
pub mod platform;

pub use attributes::{ContextFlags, ContextProfile, GlAttributes};
pub use error::{Error, Result};
pub use platform::PlatformProfile;
