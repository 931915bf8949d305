pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use api::{Endpoint, Params, Request, SendAmount, Shift};
pub use client::Client;
pub use error::{Error, Result, TransportError, ValidationError};
pub use transport::{HttpTransport, Transport};
