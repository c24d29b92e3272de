//! Typed HTTP client for the developer workspace dashboard API.
//!
//! # Example
//!
//! ```no_run
//! use devdash_client::{DevdashClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = DevdashClient::builder()
//!     .base_url("https://che.example.com")
//!     .auth_token("secret")
//!     .build()?;
//!
//! let list = client.workspaces().list("alice-che").await?;
//! for ws in &list.items {
//!     println!("{} {}", ws.name(), ws.phase());
//! }
//!
//! client.workspaces().start("alice-che", "my-project").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::{HealthApi, WorkspacesApi};
pub use client::{ClientBuilder, DevdashClient};
pub use error::{Error, Result};
pub use types::*;
