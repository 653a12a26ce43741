//! Wayland plumbing for the `present` command.

mod connection;
mod surface;

pub use connection::WaylandConnection;
pub use surface::ProbeSurface;
