//! The backend REST API as seen by the client.
//!
//! [`Backend`] is the seam every component talks through. [`HttpBackend`] is the real
//! implementation; [`mock::MockBackend`] scripts responses for tests.

pub mod backend;
pub mod error;
pub mod http;
pub mod mock;

pub use backend::*;
pub use error::*;
pub use http::HttpBackend;
