//! # fast_service
//!
//! An embeddable HTTP/1.1 service built for predictable latency: a fixed pool
//! of workers shares one listener on a single-threaded reactor, each worker
//! serves exactly one request per connection with preallocated state, and
//! every connection is closed after the response.
//!
//! The embedding program describes its routes, constructs a [`Service`] and
//! hands it the thread:
//!
//! ```no_run
//! use fast_service::{EndpointTable, Method, NetParams, Service, StatusCode};
//!
//! fn main() -> Result<(), fast_service::Error> {
//!     let table = EndpointTable::builder()
//!         .route("/", Method::Get, |_req, resp| {
//!             resp.status(StatusCode::Ok)
//!                 .header("content-type", "application/json")
//!                 .body(r#"{"status": "OK"}"#);
//!         })
//!         .build()?;
//!
//!     Service::new(NetParams::new(9831), table)?.run();
//!     Ok(())
//! }
//! ```
//!
//! ## Design constraints
//!
//! - One request per connection. Responses always carry `connection: close`.
//! - Exact routing: `(path, method)` equality after stripping the query
//!   string. A miss yields `400` with a fixed JSON body.
//! - A request that cannot be read (malformed head, oversized body, broken
//!   socket) gets no reply at all; the connection is simply closed.
//! - A connection is closed 60 seconds after accept if no response has been
//!   written by then.
//! - Handlers run on the reactor thread and must not block.

mod arena;
mod endpoint;
mod errors;
mod log;

mod http {
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}

mod server {
    pub(crate) mod service;
    pub(crate) mod worker;
}

pub use endpoint::{EndpointKey, EndpointTable, EndpointTableBuilder, Handler};
pub use errors::Error;
pub use http::request::Request;
pub use http::response::Response;
pub use http::types::{Header, Method, StatusCode};
pub use server::service::{IpVersion, NetParams, Service};
