//! The per-worker connection state machine.

use crate::{
    arena::{FieldArena, BLOCK_SIZE},
    endpoint::EndpointTable,
    errors::ErrorKind,
    http::{
        request::{Parser, Request},
        response::{Response, Serializer},
        types::StatusCode,
    },
    log::{debug, warning},
};
use std::{
    cell::RefCell,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    time::{Duration, Instant},
};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    time::sleep,
};

/// A connection that has not produced a complete response within this window
/// is closed, whatever state it is in.
pub(crate) const REQUEST_DEADLINE: Duration = Duration::from_secs(60);

/// One worker: accepts a connection, serves exactly one request on it, closes
/// it and goes back to accepting.
///
/// All of its state (parser buffer, request, response, serializer, field
/// arena) is allocated once at startup and recycled between connections, so a
/// warm worker serves requests without touching the allocator. Many workers
/// share the same listener; whichever is parked in `accept` gets the next
/// connection.
pub(crate) struct Worker {
    listener: Rc<TcpListener>,
    table: Rc<EndpointTable>,
    arena: Rc<RefCell<FieldArena>>,
    parser: Parser,
    request: Request,
    response: Response,
    serializer: Serializer,
}

impl Worker {
    pub(crate) fn new(listener: Rc<TcpListener>, table: Rc<EndpointTable>) -> Self {
        let arena = Rc::new(RefCell::new(FieldArena::new(BLOCK_SIZE)));

        Self {
            listener,
            table,
            response: Response::new(Rc::clone(&arena)),
            arena,
            parser: Parser::new(),
            request: Request::new(),
            serializer: Serializer::new(),
        }
    }

    /// The accept loop. Never returns; a worker lives as long as the service.
    pub(crate) async fn run(mut self) {
        loop {
            let accepted = self.listener.accept().await;
            let mut stream = match accepted {
                Ok((stream, _)) => stream,
                Err(err) => {
                    // Transient (EMFILE, aborted handshake); keep accepting.
                    warning!("accept failed: {err}");
                    continue;
                }
            };

            tokio::select! {
                biased;
                _ = self.serve(&mut stream) => {}
                _ = sleep(REQUEST_DEADLINE) => {
                    debug!("request deadline expired, closing connection");
                }
            }

            drop(stream);
            self.teardown();
        }
    }

    /// Serves one request: read, dispatch, write, shutdown. A failed read
    /// closes the connection without writing anything.
    async fn serve<S>(&mut self, stream: &mut S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if let Err(err) = self.read(stream).await {
            debug!("closing connection without reply: {err}");
            return;
        }

        let started = Instant::now();
        self.dispatch();
        println!("[PCD]: {}", started.elapsed().as_secs_f64());

        let wire = self.serializer.serialize(&self.response);
        if let Err(err) = stream.write_all(wire).await {
            debug!("response write failed: {err}");
            return;
        }
        let _ = stream.shutdown().await;
    }

    async fn read<S>(&mut self, stream: &mut S) -> Result<(), ErrorKind>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let head_end = self.parser.fill(stream).await?;

        {
            let mut arena = self.arena.borrow_mut();
            self.parser.parse(&mut arena, &mut self.request, head_end)?;
        }

        self.parser
            .read_body(stream, &mut self.request, head_end)
            .await
    }

    /// Routes the parsed request. A miss produces the fixed 400 reply; a
    /// panicking handler is trapped and produces a 500 so the worker (and the
    /// reactor under it) survives.
    fn dispatch(&mut self) {
        let found = self
            .table
            .find(self.request.path(), self.request.method());

        match found {
            Some(handler) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    handler(&self.request, &mut self.response);
                }));

                if outcome.is_err() {
                    warning!(
                        "handler panicked: {} {}",
                        self.request.method(),
                        self.request.path()
                    );
                    self.response.reset();
                    self.response
                        .status(StatusCode::InternalServerError)
                        .header("content-type", "application/json")
                        .body(r#"{ "error": "internal server error" }"#);
                }
            }
            None => {
                debug!(
                    "no endpoint for {} {}",
                    self.request.method(),
                    self.request.path()
                );
                self.response
                    .status(StatusCode::BadRequest)
                    .header("content-type", "application/json")
                    .body(r#"{ "error": "url cannot be resolved" }"#);
            }
        }

        self.response.prepare_payload();
    }

    /// Recycles all per-connection state. Ordering is load-bearing: the
    /// request, response and serializer hold arena-backed references and must
    /// be cleared before the arena itself is reset.
    fn teardown(&mut self) {
        self.request.reset();
        self.response.reset();
        self.serializer.reset();
        self.parser.reset();
        self.arena.borrow_mut().reset();
    }
}
