//! # Transport Worker
//!
//! Owns the WebSocket. Alternates between draining the outbound queue and a
//! short, timed read for inbound messages.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use tungstenite::client::{uri_mode, IntoClientRequest};
use tungstenite::error::UrlError;
use tungstenite::stream::{MaybeTlsStream, Mode};
use tungstenite::{HandshakeError, Message, WebSocket};

use crate::notifier::{FrameKind, NotifierState, RemoteConfig, SharedStatus};

/// Reads allowed for the peer to answer our close frame.
const CLOSE_READ_ATTEMPTS: usize = 10;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Command to the transport worker.
#[derive(Debug)]
pub(crate) enum TransportCommand {
    /// Write one serialized snapshot.
    Send(Vec<u8>),
    /// Close the socket and exit.
    Shutdown,
}

/// Spawns the worker thread.
pub(crate) fn spawn(
    config: RemoteConfig,
    commands: Receiver<TransportCommand>,
    status: Arc<SharedStatus>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("meshrelay-notifier".to_string())
        .spawn(move || run(&config, &commands, &status))
}

fn run(config: &RemoteConfig, commands: &Receiver<TransportCommand>, status: &SharedStatus) {
    status.set_state(NotifierState::Connecting);

    let mut socket = match open(config) {
        Ok(socket) => socket,
        Err(e) => {
            tracing::warn!("could not connect to {}: {e}", config.url);
            status.set_state(NotifierState::Disconnected);
            return;
        }
    };
    status.set_state(NotifierState::Connected);

    if serve(config, &mut socket, commands, status) {
        close(&mut socket);
    }
    status.set_state(NotifierState::Disconnected);
}

fn open(config: &RemoteConfig) -> tungstenite::Result<Socket> {
    let request = config.url.as_str().into_client_request()?;
    if matches!(uri_mode(request.uri())?, Mode::Tls) {
        return Err(tungstenite::Error::Url(UrlError::TlsFeatureNotEnabled));
    }
    let host = request.uri().host().ok_or(tungstenite::Error::Url(UrlError::NoHostName))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = request.uri().port_u16().unwrap_or(80);

    let timeout = config.connect_timeout();
    let stream = connect_any((host, port).to_socket_addrs()?, timeout)?;
    stream.set_nodelay(true)?;
    // Bounds the upgrade and every later write; reads drop to the poll
    // timeout once connected.
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let (mut socket, response) =
        tungstenite::client(request, MaybeTlsStream::Plain(stream)).map_err(|e| match e {
            HandshakeError::Failure(e) => e,
            HandshakeError::Interrupted(_) => tungstenite::Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no handshake response within {timeout:?}"),
            )),
        })?;
    tracing::info!("connected to {} (HTTP {})", config.url, response.status());

    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        stream.set_read_timeout(Some(config.read_poll()))?;
    }
    Ok(socket)
}

/// Tries each resolved address in turn, each bounded by `timeout`.
fn connect_any(addrs: impl Iterator<Item = SocketAddr>, timeout: Duration) -> io::Result<TcpStream> {
    let mut last = io::Error::new(io::ErrorKind::AddrNotAvailable, "host resolved to no address");
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("connect to {addr} failed: {e}");
                last = e;
            }
        }
    }
    Err(last)
}

/// Runs until shutdown or connection loss. Returns `true` when the socket
/// is still open and should be closed politely.
fn serve(
    config: &RemoteConfig,
    socket: &mut Socket,
    commands: &Receiver<TransportCommand>,
    status: &SharedStatus,
) -> bool {
    loop {
        // Outbound first so a cycle's snapshot leaves before we block on read.
        loop {
            match commands.try_recv() {
                Ok(TransportCommand::Send(payload)) => {
                    if !write(config.frame, socket, payload, status) {
                        return false;
                    }
                }
                Ok(TransportCommand::Shutdown) | Err(TryRecvError::Disconnected) => return true,
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                status.record_received();
                tracing::info!("remote: {text}");
            }
            Ok(Message::Binary(data)) => {
                status.record_received();
                tracing::info!("remote sent {} binary bytes", data.len());
            }
            Ok(Message::Close(frame)) => {
                tracing::info!("remote closing connection: {frame:?}");
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                tracing::info!("connection to {} closed by remote", config.url);
                return false;
            }
            Err(e) => {
                tracing::warn!("connection to {} lost: {e}", config.url);
                return false;
            }
        }
    }
}

/// Writes one frame. Returns `false` if the connection is unusable.
fn write(frame: FrameKind, socket: &mut Socket, payload: Vec<u8>, status: &SharedStatus) -> bool {
    let len = payload.len();
    let message = match frame {
        FrameKind::Binary => Message::Binary(payload),
        FrameKind::Text => match String::from_utf8(payload) {
            Ok(text) => Message::Text(text),
            Err(e) => {
                status.record_send_error();
                tracing::warn!("snapshot is not valid UTF-8, skipped: {e}");
                return true;
            }
        },
    };

    match socket.send(message) {
        Ok(()) => {
            status.record_sent(len);
            tracing::trace!("sent {len} byte snapshot");
            true
        }
        Err(e) => {
            status.record_send_error();
            tracing::warn!("failed to send snapshot: {e}");
            false
        }
    }
}

fn close(socket: &mut Socket) {
    if let Err(e) = socket.close(None) {
        tracing::debug!("close frame not sent: {e}");
        return;
    }
    for _ in 0..CLOSE_READ_ATTEMPTS {
        match socket.read() {
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => {}
            Err(_) => break,
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
