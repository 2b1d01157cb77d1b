//! Static routing: the immutable (path, method) -> handler table shared by
//! all workers.

use crate::{
    errors::Error,
    http::{request::Request, response::Response, types::Method},
};
use std::cmp::Ordering;

/// A route implementation.
///
/// Handlers take the parsed request and fill in the response; they cannot
/// signal failure to the server. A handler that fails must produce a valid
/// response itself (e.g. a 500). Handlers are invoked from many workers in
/// interleaved fashion but never in parallel: the whole service runs on one
/// reactor thread, so they may assume serialised execution. A handler must
/// not block; blocking stalls every worker on the reactor.
pub type Handler = Box<dyn Fn(&Request, &mut Response) + Send>;

/// Identifies one route: an exact path and a method.
///
/// Equality is exact. There is no trailing-slash normalisation and no case
/// folding: `/users` and `/users/` are different endpoints. The path is
/// copied at registration, so the caller's string does not need to outlive
/// the service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointKey {
    // Field order matters: the derived ordering is (method, path).
    method: Method,
    path: String,
}

impl EndpointKey {
    #[inline]
    pub fn new<P: Into<String>>(path: P, method: Method) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }
}

/// The immutable routing table.
///
/// Built once before the service starts and shared read-only by every worker;
/// lookup is a binary search over the sorted route list, so the hot path
/// allocates nothing.
///
/// # Examples
///
/// ```
/// use fast_service::{EndpointTable, Method, StatusCode};
///
/// let table = EndpointTable::builder()
///     .route("/", Method::Get, |_req, resp| {
///         resp.status(StatusCode::Ok).body(r#"{"status": "OK"}"#);
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(table.len(), 1);
/// ```
pub struct EndpointTable {
    routes: Vec<(EndpointKey, Handler)>,
}

impl EndpointTable {
    /// Builds the table from (key, handler) pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEndpoint`] when two pairs share a key.
    /// Rejecting duplicates keeps registration deterministic; there is no
    /// last-wins mode.
    pub fn new(mut routes: Vec<(EndpointKey, Handler)>) -> Result<Self, Error> {
        routes.sort_by(|(a, _), (b, _)| a.cmp(b));

        for window in routes.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(Error::DuplicateEndpoint {
                    path: window[0].0.path.clone(),
                    method: window[0].0.method,
                });
            }
        }

        Ok(Self { routes })
    }

    /// Creates a builder for fluent route registration.
    #[inline]
    pub fn builder() -> EndpointTableBuilder {
        EndpointTableBuilder { routes: Vec::new() }
    }

    /// Exact (path, method) lookup. The caller strips the query string.
    #[inline]
    pub(crate) fn find(&self, path: &str, method: Method) -> Option<&Handler> {
        self.routes
            .binary_search_by(|(key, _)| {
                match key.method.cmp(&method) {
                    Ordering::Equal => key.path.as_str().cmp(path),
                    other => other,
                }
            })
            .ok()
            .map(|index| &self.routes[index].1)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for EndpointTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|(key, _)| key))
            .finish()
    }
}

/// Fluent construction for [`EndpointTable`].
///
/// # Examples
///
/// ```
/// use fast_service::{EndpointTable, Method, StatusCode};
///
/// let table = EndpointTable::builder()
///     .route("/health", Method::Get, |_req, resp| {
///         resp.status(StatusCode::Ok).body(r#"{"healthy": true}"#);
///     })
///     .route("/orders", Method::Post, |req, resp| {
///         resp.status(StatusCode::Created)
///             .body(format!(r#"{{"received": {}}}"#, req.body().len()));
///     })
///     .build()
///     .unwrap();
/// ```
pub struct EndpointTableBuilder {
    routes: Vec<(EndpointKey, Handler)>,
}

impl EndpointTableBuilder {
    /// Registers a handler for the exact (path, method) pair.
    #[inline]
    pub fn route<P, F>(mut self, path: P, method: Method, handler: F) -> Self
    where
        P: Into<String>,
        F: Fn(&Request, &mut Response) + Send + 'static,
    {
        self.routes
            .push((EndpointKey::new(path, method), Box::new(handler)));
        self
    }

    /// Finalises the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEndpoint`] when a (path, method) pair was
    /// registered twice.
    #[inline]
    pub fn build(self) -> Result<EndpointTable, Error> {
        EndpointTable::new(self.routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Box::new(|_, _| {})
    }

    #[test]
    fn lookup_is_exact() {
        let table = EndpointTable::new(vec![
            (EndpointKey::new("/", Method::Get), noop()),
            (EndpointKey::new("/users", Method::Get), noop()),
            (EndpointKey::new("/users", Method::Post), noop()),
        ])
        .unwrap();

        assert!(table.find("/", Method::Get).is_some());
        assert!(table.find("/users", Method::Get).is_some());
        assert!(table.find("/users", Method::Post).is_some());

        // Method mismatch, unknown path, no normalisation.
        assert!(table.find("/", Method::Post).is_none());
        assert!(table.find("/missing", Method::Get).is_none());
        assert!(table.find("/users/", Method::Get).is_none());
        assert!(table.find("/USERS", Method::Get).is_none());
    }

    #[test]
    fn registration_order_is_irrelevant() {
        let table = EndpointTable::new(vec![
            (EndpointKey::new("/z", Method::Options), noop()),
            (EndpointKey::new("/a", Method::Get), noop()),
            (EndpointKey::new("/m", Method::Delete), noop()),
        ])
        .unwrap();

        assert!(table.find("/a", Method::Get).is_some());
        assert!(table.find("/m", Method::Delete).is_some());
        assert!(table.find("/z", Method::Options).is_some());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn duplicates_are_rejected() {
        let result = EndpointTable::new(vec![
            (EndpointKey::new("/dup", Method::Get), noop()),
            (EndpointKey::new("/dup", Method::Get), noop()),
        ]);

        match result {
            Err(Error::DuplicateEndpoint { path, method }) => {
                assert_eq!(path, "/dup");
                assert_eq!(method, Method::Get);
            }
            _ => panic!("expected DuplicateEndpoint"),
        }
    }

    #[test]
    fn same_path_different_method_is_not_a_duplicate() {
        let table = EndpointTable::builder()
            .route("/dup", Method::Get, |_, _| {})
            .route("/dup", Method::Post, |_, _| {})
            .build()
            .unwrap();

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn empty_table() {
        let table = EndpointTable::new(Vec::new()).unwrap();

        assert!(table.is_empty());
        assert!(table.find("/", Method::Get).is_none());
    }
}
