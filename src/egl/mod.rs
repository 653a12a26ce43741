//! Dynamic EGL: library loading, display sessions, configuration
//! selection, contexts and surfaces.

pub mod context;
pub mod dump;
pub mod info;
pub mod loader;
pub mod select;
pub mod session;
pub mod surface;

pub use context::{context_attributes, ContextSupport};
pub use dump::{ConfigAttribute, ConfigDump};
pub use info::{EglVersion, Extensions};
pub use select::{choose_config, ConfigRequest, ConfigTarget, SelectError, SelectionPolicy};
pub use session::Session;
pub use surface::{window_surface_attributes, SurfaceSupport};
