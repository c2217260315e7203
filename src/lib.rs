//! Blocking client for the Gopher protocol (RFC 1436).
//!
//! ```no_run
//! use gopher_client::{Gopher, Response};
//!
//! let client = Gopher::default();
//! if let Response::DirectoryListing(items) = client.fetch("gopher.floodgap.com")? {
//!     for item in &items {
//!         println!("{item}");
//!     }
//! }
//! # Ok::<(), gopher_client::GopherError>(())
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod gopher;
pub mod item;
pub mod locator;
pub mod types;

pub use config::{ClientConfig, ConfigError};
pub use encoding::Encoding;
pub use error::GopherError;
pub use gopher::{Gopher, Response};
pub use item::Item;
pub use locator::Locator;
