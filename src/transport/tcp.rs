//! TCP transport.
//!
//! Client connections are created closed and opened with
//! [`Transport::open`]. Server connections come out of a [`TcpAcceptor`]
//! already open.

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ProtocolConfig;
use crate::error::{ProtocolError, Result};
use crate::protocol::codec::{encode_with, SfsCodec, BIG_HEADER_LEN, SHORT_HEADER_LEN};
use crate::protocol::Flags;
use crate::protocol::Message;
use crate::transport::Transport;
use crate::utils::metrics::{shared_metrics, Metrics, Timer};
use crate::utils::timeout::{with_timeout, with_timeout_error, DEFAULT_TIMEOUT, SHUTDOWN_TIMEOUT};

/// One TCP connection carrying SFS frames.
pub struct TcpTransport {
    addr: String,
    framed: Option<Framed<TcpStream, SfsCodec>>,
    peer: Option<SocketAddr>,
    codec: SfsCodec,
    connect_timeout: Duration,
    send_timeout: Duration,
    recv_timeout: Option<Duration>,
    metrics: Arc<Metrics>,
    slot: Option<ConnectionSlot>,
}

/// Holds one place in an acceptor's connection count until dropped.
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    fn acquire(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(active))
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("addr", &self.addr)
            .field("peer", &self.peer)
            .field("open", &self.is_open())
            .finish()
    }
}

impl TcpTransport {
    /// A closed client transport targeting `addr` (`host:port`).
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            framed: None,
            peer: None,
            codec: SfsCodec::default(),
            connect_timeout: DEFAULT_TIMEOUT,
            send_timeout: DEFAULT_TIMEOUT,
            recv_timeout: Some(DEFAULT_TIMEOUT),
            metrics: shared_metrics(),
            slot: None,
        }
    }

    /// A closed client transport built from the client and codec sections.
    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self::new(config.client.address.clone())
            .with_codec(SfsCodec::from_config(&config.codec))
            .with_timeouts(config.client.connection_timeout, config.client.response_timeout)
    }

    /// Wraps an accepted stream; the transport starts open.
    ///
    /// Receives wait indefinitely; sends time out after the server's
    /// `connection_timeout`.
    fn from_accepted(stream: TcpStream, peer: SocketAddr, ctx: &AcceptContext) -> Self {
        ctx.metrics.connection_established();
        Self {
            addr: peer.to_string(),
            framed: Some(Framed::new(stream, ctx.codec.clone())),
            peer: Some(peer),
            codec: ctx.codec.clone(),
            connect_timeout: DEFAULT_TIMEOUT,
            send_timeout: ctx.send_timeout,
            recv_timeout: None,
            metrics: Arc::clone(&ctx.metrics),
            slot: Some(ConnectionSlot::acquire(&ctx.active)),
        }
    }

    pub fn with_codec(mut self, codec: SfsCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Sets the connect/send timeout and the receive timeout.
    pub fn with_timeouts(mut self, connect: Duration, recv: Duration) -> Self {
        self.connect_timeout = connect;
        self.send_timeout = connect;
        self.recv_timeout = Some(recv);
        self
    }

    /// Lets `recv` wait for the peer indefinitely.
    pub fn without_recv_timeout(mut self) -> Self {
        self.recv_timeout = None;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Target address for clients, peer address for accepted connections.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn codec(&self) -> &SfsCodec {
        &self.codec
    }

    fn framed(&mut self) -> Result<&mut Framed<TcpStream, SfsCodec>> {
        self.framed.as_mut().ok_or(ProtocolError::ConnectionClosed)
    }

    /// Drops the connection after an error that desynchronized the stream.
    fn discard(&mut self, err: &ProtocolError) {
        if err.is_fatal_for_stream() {
            self.drop_connection(err);
        }
    }

    fn drop_connection(&mut self, err: &ProtocolError) {
        if self.framed.take().is_some() {
            warn!(addr = %self.addr, error = %err, "Dropping connection");
            self.metrics.connection_closed();
            self.slot = None;
        }
    }
}

impl Transport for TcpTransport {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&mut self) -> Result<()> {
        if self.framed.is_some() {
            return Ok(());
        }
        let _timer = Timer::start("tcp_connect");
        let stream = with_timeout_error(
            async { TcpStream::connect(&self.addr).await.map_err(ProtocolError::from) },
            self.connect_timeout,
        )
        .await
        .inspect_err(|_| self.metrics.connection_error())?;
        stream.set_nodelay(true)?;

        self.peer = stream.peer_addr().ok();
        self.framed = Some(Framed::new(stream, self.codec.clone()));
        self.metrics.connection_established();
        info!(peer = ?self.peer, "Connected");
        Ok(())
    }

    async fn send(&mut self, msg: &Message) -> Result<()> {
        let frame = encode_with(self.codec.registry(), msg)?;
        let header_len = if Flags::from_bits(frame[0]).contains(Flags::BIG_SIZE) {
            BIG_HEADER_LEN
        } else {
            SHORT_HEADER_LEN
        };
        let payload_len = frame.len() - header_len;
        if payload_len > self.codec.max_frame_size() {
            return Err(ProtocolError::OversizedPacket(payload_len));
        }
        self.send_raw(frame).await
    }

    async fn recv(&mut self) -> Result<Message> {
        let frame = self.recv_raw().await?;
        self.codec.decode_message(&frame).inspect_err(|e| {
            self.metrics.decode_error();
            warn!(error = %e, bytes = frame.len(), "Failed to decode frame");
        })
    }

    async fn send_raw(&mut self, frame: Bytes) -> Result<()> {
        let send_timeout = self.send_timeout;
        let len = frame.len();
        let framed = self.framed()?;
        let result = with_timeout_error(framed.send(frame), send_timeout).await;
        if let Err(e) = &result {
            // A failed or timed-out write may leave a partial frame on the wire.
            self.drop_connection(e);
            return result;
        }
        self.metrics.frame_sent(len as u64);
        debug!(bytes = len, "Frame sent");
        Ok(())
    }

    async fn recv_raw(&mut self) -> Result<Bytes> {
        let recv_timeout = self.recv_timeout;
        let framed = self.framed()?;
        let next = async {
            match framed.next().await {
                Some(frame) => frame,
                None => Err(ProtocolError::ConnectionClosed),
            }
        };
        let result = match recv_timeout {
            Some(limit) => with_timeout_error(next, limit).await,
            None => next.await,
        };

        match result {
            Ok(frame) => {
                self.metrics.frame_received(frame.len() as u64);
                debug!(bytes = frame.len(), "Frame received");
                Ok(frame)
            }
            Err(e) => {
                if matches!(e, ProtocolError::ConnectionClosed) {
                    info!(addr = %self.addr, "Peer closed connection");
                }
                self.discard(&e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn close(&mut self) -> Result<()> {
        let Some(framed) = self.framed.take() else {
            return Ok(());
        };
        self.metrics.connection_closed();
        let mut stream = framed.into_inner();
        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "Shutdown after peer reset");
        }
        drop(stream);
        self.slot = None;
        info!("Connection closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.framed.is_some()
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.framed.is_some() {
            self.metrics.connection_closed();
        }
    }
}

/// Stream of accepted connections.
pub struct Incoming {
    inner: ReceiverStream<TcpTransport>,
}

impl Stream for Incoming {
    type Item = TcpTransport;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Listening side of the TCP transport.
///
/// A background task accepts connections and pushes them into a bounded
/// channel; when the channel is full the task stops accepting until the
/// consumer catches up.
pub struct TcpAcceptor {
    local_addr: SocketAddr,
    incoming: Option<mpsc::Receiver<TcpTransport>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    active: Arc<AtomicUsize>,
}

/// Shared state the accept loop hands to every accepted connection.
struct AcceptContext {
    codec: SfsCodec,
    metrics: Arc<Metrics>,
    active: Arc<AtomicUsize>,
    max_connections: usize,
    send_timeout: Duration,
}

impl TcpAcceptor {
    /// Binds with default server options.
    pub async fn bind(addr: &str) -> Result<Self> {
        let config = ProtocolConfig::default();
        Self::bind_with(addr, &config).await
    }

    /// Binds `config.server.address` with the rest of `config`.
    pub async fn from_config(config: &ProtocolConfig) -> Result<Self> {
        Self::bind_with(&config.server.address, config).await
    }

    /// Binds `addr` with backlog, connection cap, send timeout and codec
    /// from `config`.
    #[instrument(skip(config))]
    pub async fn bind_with(addr: &str, config: &ProtocolConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "Listening");

        let (tx, rx) = mpsc::channel(config.server.accept_backlog.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let active = Arc::new(AtomicUsize::new(0));
        let ctx = AcceptContext {
            codec: SfsCodec::from_config(&config.codec),
            metrics: shared_metrics(),
            active: Arc::clone(&active),
            max_connections: config.server.max_connections,
            send_timeout: config.server.connection_timeout,
        };
        let task = tokio::spawn(accept_loop(listener, tx, shutdown_rx, ctx));

        Ok(Self {
            local_addr,
            incoming: Some(rx),
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
            active,
        })
    }

    /// Address actually bound, useful after binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Connections accepted here that are still open, including those not
    /// yet taken from [`TcpAcceptor::incoming`].
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Accepted connections. Only the first call receives them; later calls
    /// get a stream that ends immediately.
    pub fn incoming(&mut self) -> Incoming {
        let rx = self.incoming.take().unwrap_or_else(|| mpsc::channel(1).1);
        Incoming {
            inner: ReceiverStream::new(rx),
        }
    }

    /// Stops accepting. Connections already handed out stay open.
    #[instrument(skip(self), fields(address = %self.local_addr))]
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut task) = self.task.take() {
            if with_timeout(&mut task, SHUTDOWN_TIMEOUT).await.is_err() {
                warn!("Accept loop did not stop in time, aborting");
                task.abort();
            }
        }
        info!("Acceptor shut down");
        Ok(())
    }
}

impl Drop for TcpAcceptor {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::Sender<TcpTransport>,
    mut shutdown_rx: oneshot::Receiver<()>,
    ctx: AcceptContext,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("Accept loop received shutdown");
                break;
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        let active = ctx.active.load(Ordering::Acquire);
                        if active >= ctx.max_connections {
                            warn!(peer = %peer, active, "Connection limit reached, refusing");
                            continue;
                        }
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(error = %e, "Failed to set TCP_NODELAY");
                        }
                        info!(peer = %peer, "New connection established");
                        let conn = TcpTransport::from_accepted(stream, peer, &ctx);
                        if tx.send(conn).await.is_err() {
                            debug!("Incoming stream dropped, stopping accept loop");
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting connection");
                        ctx.metrics.connection_error();
                    }
                }
            }
        }
    }
}
