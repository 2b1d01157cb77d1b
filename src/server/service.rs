//! Service construction: runtime, listener and the worker pool.

use crate::{endpoint::EndpointTable, errors::Error, server::worker::Worker};
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    rc::Rc,
};
use tokio::{net::TcpListener, runtime, task::LocalSet};

/// Number of workers sharing the listener. Each worker serves one connection
/// at a time, so this is also the concurrent-connection capacity.
pub(crate) const WORKER_COUNT: usize = 512;

const LISTEN_BACKLOG: i32 = 1024;

/// Which address family the listener binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// Bind `0.0.0.0:<port>`.
    V4,
    /// Bind `[::]:<port>`.
    V6,
}

/// Network parameters for a [`Service`].
#[derive(Debug, Clone, Copy)]
pub struct NetParams {
    pub port: u16,
    pub ip_version: IpVersion,
}

impl NetParams {
    /// IPv4 on the given port. Port `0` asks the OS for a free port; read it
    /// back with [`Service::local_addr`].
    #[inline]
    pub const fn new(port: u16) -> Self {
        Self {
            port,
            ip_version: IpVersion::V4,
        }
    }
}

/// An embeddable HTTP/1.1 service.
///
/// Construction binds the listener and builds the reactor, so configuration
/// mistakes (port already taken, missing privileges) surface as an `Err`
/// before any traffic is accepted. [`run`](Service::run) then blocks the
/// calling thread for the lifetime of the process.
///
/// # Examples
///
/// ```no_run
/// use fast_service::{EndpointTable, Method, NetParams, Service, StatusCode};
///
/// let table = EndpointTable::builder()
///     .route("/", Method::Get, |_req, resp| {
///         resp.status(StatusCode::Ok).body(r#"{"status": "OK"}"#);
///     })
///     .build()?;
///
/// Service::new(NetParams::new(9831), table)?.run();
/// # Ok::<(), fast_service::Error>(())
/// ```
pub struct Service {
    runtime: runtime::Runtime,
    listener: TcpListener,
    table: EndpointTable,
    local_addr: SocketAddr,
}

impl Service {
    /// Builds the reactor and binds the listener.
    ///
    /// # Errors
    ///
    /// [`Error::Runtime`] when the reactor cannot be created and
    /// [`Error::Bind`] when the listener cannot be bound.
    pub fn new(params: NetParams, table: EndpointTable) -> Result<Self, Error> {
        // Everything runs on one reactor thread; workers are cooperative
        // tasks, not OS threads.
        let runtime = runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(Error::Runtime)?;

        let listener = Self::bind_listener(&runtime, params)?;
        let local_addr = listener.local_addr().map_err(Error::Bind)?;

        Ok(Self {
            runtime,
            listener,
            table,
            local_addr,
        })
    }

    /// The address the listener actually bound. Useful with port `0`.
    #[inline(always)]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the service, blocking the calling thread indefinitely.
    ///
    /// Spawns the full worker pool onto the reactor; every worker loops on
    /// accept-serve-close forever. There is no shutdown path: the service
    /// lives until the process exits.
    pub fn run(self) {
        let Service {
            runtime,
            listener,
            table,
            ..
        } = self;

        let listener = Rc::new(listener);
        let table = Rc::new(table);

        let local = LocalSet::new();
        for _ in 0..WORKER_COUNT {
            local.spawn_local(Worker::new(Rc::clone(&listener), Rc::clone(&table)).run());
        }

        runtime.block_on(local);
    }

    fn bind_listener(runtime: &runtime::Runtime, params: NetParams) -> Result<TcpListener, Error> {
        let (domain, ip): (Domain, IpAddr) = match params.ip_version {
            IpVersion::V4 => (Domain::IPV4, Ipv4Addr::UNSPECIFIED.into()),
            IpVersion::V6 => (Domain::IPV6, Ipv6Addr::UNSPECIFIED.into()),
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(Error::Bind)?;
        socket.set_reuse_address(true).map_err(Error::Bind)?;
        socket
            .bind(&SocketAddr::new(ip, params.port).into())
            .map_err(Error::Bind)?;
        socket.listen(LISTEN_BACKLOG).map_err(Error::Bind)?;
        socket.set_nonblocking(true).map_err(Error::Bind)?;

        let std_listener: std::net::TcpListener = socket.into();

        // from_std registers with the reactor's I/O driver.
        let _guard = runtime.enter();
        TcpListener::from_std(std_listener).map_err(Error::Bind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::types::{Method, StatusCode};
    use std::{
        io::{Read, Write},
        net::TcpStream,
        thread,
    };

    fn routes() -> EndpointTable {
        EndpointTable::builder()
            .route("/", Method::Get, |_req, resp| {
                resp.status(StatusCode::Ok)
                    .header("content-type", "application/json")
                    .body(r#"{"status": "OK"}"#);
            })
            .route("/echo", Method::Post, |req, resp| {
                resp.body_mut()
                    .push_str(std::str::from_utf8(req.body()).unwrap_or(""));
            })
            .build()
            .unwrap()
    }

    fn start(table: EndpointTable) -> SocketAddr {
        let service = Service::new(NetParams::new(0), table).unwrap();
        let addr = service.local_addr();
        thread::spawn(move || service.run());
        addr
    }

    fn roundtrip(addr: SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(raw).unwrap();

        let mut reply = String::new();
        stream.read_to_string(&mut reply).unwrap();
        reply
    }

    #[test]
    fn end_to_end_roundtrip() {
        let addr = start(routes());

        let reply = roundtrip(addr, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(reply.contains("content-type: application/json\r\n"));
        assert!(reply.contains("connection: close\r\n"));
        assert!(reply.contains("content-length: 16\r\n"));
        assert!(reply.ends_with(r#"{"status": "OK"}"#));
    }

    #[test]
    fn body_is_delivered_to_the_handler() {
        let addr = start(routes());

        let reply = roundtrip(
            addr,
            b"POST /echo HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello there",
        );

        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(reply.ends_with("hello there"));
    }

    #[test]
    fn unknown_url_is_400() {
        let addr = start(routes());

        let reply = roundtrip(addr, b"GET /nope HTTP/1.1\r\n\r\n");

        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(reply.ends_with(r#"{ "error": "url cannot be resolved" }"#));
    }

    #[test]
    fn malformed_request_is_closed_without_reply() {
        let addr = start(routes());

        let reply = roundtrip(addr, b"NONSENSE\r\n\r\n");
        assert!(reply.is_empty());

        let reply = roundtrip(addr, b"POST /echo HTTP/1.1\r\nContent-Length: 9999999\r\n\r\n");
        assert!(reply.is_empty());
    }

    #[test]
    fn idle_connections_do_not_starve_live_ones() {
        let addr = start(routes());

        // Park connections that never send anything; each occupies one worker
        // inside its deadline window. A quarter of the pool: both ends of
        // every connection live in this process, so parking the full
        // WORKER_COUNT - 1 would double that against the default 1024-fd
        // soft limit.
        let idle: Vec<TcpStream> = (0..WORKER_COUNT / 4)
            .map(|_| TcpStream::connect(addr).unwrap())
            .collect();

        let reply = roundtrip(addr, b"GET / HTTP/1.1\r\n\r\n");
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));

        drop(idle);
    }

    #[test]
    fn sequential_requests_reuse_worker_state() {
        let addr = start(routes());

        for _ in 0..8 {
            let reply = roundtrip(addr, b"GET / HTTP/1.1\r\n\r\n");
            assert!(reply.ends_with(r#"{"status": "OK"}"#));
        }
    }

    #[test]
    fn bind_conflict_surfaces_as_error() {
        let held = Service::new(NetParams::new(0), EndpointTable::new(Vec::new()).unwrap())
            .unwrap();
        let taken = held.local_addr().port();

        let result = Service::new(NetParams::new(taken), EndpointTable::new(Vec::new()).unwrap());
        assert!(matches!(result, Err(Error::Bind(_))));
    }
}
