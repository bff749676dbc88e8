mod attendance;
mod auth;
pub mod client;
pub mod documents;
mod early_departure;
pub mod error;
pub mod resources;
pub mod transport;
pub mod types;

pub use client::*;
pub use documents::{DocumentUpload, UploadSource, MAX_DOCUMENT_BYTES, PDF_MIME};
pub use error::*;
pub use resources::{Resource, Writable};
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use types::*;

#[cfg(test)]
pub mod test_support;
