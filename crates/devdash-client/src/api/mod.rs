//! API endpoint implementations.

mod health;
mod workspaces;

pub use health::HealthApi;
pub use workspaces::WorkspacesApi;
