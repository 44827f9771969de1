//! WebSocket client thread: inbound perception messages into the [`Mailbox`], outbound
//! mode commands and camera frames out. Reconnects with a fixed delay until shut down.

use crate::cursor::AlgorithmMode;
use crate::feed::PerceptionMessage;
use crate::mailbox::{ConnectionStatus, Mailbox};
use anyhow::{bail, Context, Result};
use std::io::{self, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tungstenite::client::IntoClientRequest;
use tungstenite::error::UrlError;
use tungstenite::handshake::HandshakeError;
use tungstenite::{Message, WebSocket};

pub const DEFAULT_URL: &str = "ws://localhost:8000/ws";

/// Short tagged strings the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    SetMode(AlgorithmMode),
    Calibrate,
}

impl ControlCommand {
    pub fn wire_text(self) -> String {
        match self {
            ControlCommand::SetMode(mode) => format!("MODE:{}", mode.label()),
            ControlCommand::Calibrate => "MODE:CALIBRATE".to_string(),
        }
    }
}

/// Produces encoded camera frames for the backend.
pub trait FrameSource: Send {
    /// Next payload to stream, or `None` when there is nothing to send this tick.
    fn next_frame(&mut self) -> Option<String>;
}

/// No capture device: nothing is streamed and the rest of the client keeps running.
#[derive(Debug, Default)]
pub struct NoCamera;

impl FrameSource for NoCamera {
    fn next_frame(&mut self) -> Option<String> {
        None
    }
}

#[cfg(feature = "frame_stream")]
pub use still::{encode_data_url, StillImageSource};

#[cfg(feature = "frame_stream")]
mod still {
    use super::FrameSource;
    use anyhow::{Context, Result};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use std::path::Path;

    pub fn encode_data_url(jpeg: &[u8]) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
    }

    /// Streams one still image over and over, standing in for a camera.
    #[derive(Debug, Clone)]
    pub struct StillImageSource {
        payload: String,
    }

    impl StillImageSource {
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            let image = image::open(path).with_context(|| format!("Opening frame image {}", path.display()))?;
            let mut jpeg = Vec::new();
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
                .with_context(|| format!("Encoding frame image {} as JPEG", path.display()))?;
            Ok(Self { payload: encode_data_url(&jpeg) })
        }
    }

    impl FrameSource for StillImageSource {
        fn next_frame(&mut self) -> Option<String> {
            Some(self.payload.clone())
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub frame_interval: Duration,
    pub reconnect_delay: Duration,
    /// Socket read timeout; bounds how long outbound traffic and shutdown wait on reads.
    pub read_timeout: Duration,
    /// Bounds the TCP connect and both the opening and closing handshakes.
    pub connect_timeout: Duration,
    /// A write that cannot finish in time leaves its bytes queued and later frames dropped.
    pub write_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            frame_interval: Duration::from_millis(50),
            reconnect_delay: Duration::from_millis(1000),
            read_timeout: Duration::from_millis(5),
            connect_timeout: Duration::from_millis(2000),
            write_timeout: Duration::from_millis(250),
        }
    }
}

pub struct TransportHandle {
    commands: mpsc::Sender<ControlCommand>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TransportHandle {
    /// Queues a command; commands issued while disconnected are dropped.
    pub fn send(&self, command: ControlCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Stops the thread and waits for it to close the socket.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(target: "handsort::transport", "transport thread panicked");
            }
        }
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn spawn(config: TransportConfig, mailbox: Mailbox, frames: Box<dyn FrameSource>) -> Result<TransportHandle> {
    if !config.url.starts_with("ws://") {
        bail!("Unsupported perception url '{}'. Only plain ws:// connections are supported.", config.url);
    }
    let (commands, command_rx) = mpsc::channel();
    let shutdown = Arc::new(AtomicBool::new(false));
    let worker = Worker { config, mailbox, frames, commands: command_rx, shutdown: Arc::clone(&shutdown) };
    let thread = thread::Builder::new()
        .name("handsort-transport".to_string())
        .spawn(move || worker.run())
        .context("Spawning transport thread")?;
    Ok(TransportHandle { commands, shutdown, thread: Some(thread) })
}

type Socket = WebSocket<TcpStream>;

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// `Ok(false)` when the socket would block. tungstenite keeps the bytes queued and a
/// later flush sends them.
fn flushed(result: Result<(), tungstenite::Error>) -> Result<bool, tungstenite::Error> {
    match result {
        Ok(()) => Ok(true),
        Err(tungstenite::Error::Io(err)) if is_timeout(&err) => Ok(false),
        Err(err) => Err(err),
    }
}

fn open_stream(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = io::Error::new(ErrorKind::NotFound, format!("no address found for {host}"));
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = err,
        }
    }
    Err(last_err)
}

struct Worker {
    config: TransportConfig,
    mailbox: Mailbox,
    frames: Box<dyn FrameSource>,
    commands: mpsc::Receiver<ControlCommand>,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn run(mut self) {
        self.mailbox.set_status(ConnectionStatus::Connecting);
        let mut failures = 0u32;
        while !self.stopping() {
            match self.connect() {
                Ok(socket) => {
                    failures = 0;
                    info!(target: "handsort::transport", url = %self.config.url, "connected");
                    self.mailbox.set_status(ConnectionStatus::Connected);
                    let result = self.serve(socket);
                    self.mailbox.set_status(ConnectionStatus::Offline);
                    match result {
                        Ok(()) => info!(target: "handsort::transport", "connection closed"),
                        Err(err) => warn!(target: "handsort::transport", "connection lost: {err}"),
                    }
                }
                Err(err) => {
                    self.mailbox.set_status(ConnectionStatus::Offline);
                    if failures == 0 {
                        warn!(target: "handsort::transport", url = %self.config.url, "connect failed: {err}");
                    } else {
                        debug!(target: "handsort::transport", url = %self.config.url, failures, "connect failed: {err}");
                    }
                    failures = failures.saturating_add(1);
                }
            }
            self.discard_commands();
            self.wait(self.config.reconnect_delay);
        }
    }

    fn connect(&self) -> Result<Socket, tungstenite::Error> {
        let request = self.config.url.as_str().into_client_request()?;
        if request.uri().scheme_str() != Some("ws") {
            return Err(tungstenite::Error::Url(UrlError::UnsupportedUrlScheme));
        }
        let host = request
            .uri()
            .host()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
            .ok_or(tungstenite::Error::Url(UrlError::NoHostName))?;
        let port = request.uri().port_u16().unwrap_or(80);

        let timeout = self.config.connect_timeout.max(Duration::from_millis(1));
        let stream = open_stream(&host, port, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        let (socket, _response) = tungstenite::client(request, stream).map_err(|err| match err {
            HandshakeError::Failure(err) => err,
            HandshakeError::Interrupted(_) => tungstenite::Error::Io(io::Error::from(ErrorKind::TimedOut)),
        })?;
        socket.get_ref().set_read_timeout(Some(self.config.read_timeout.max(Duration::from_millis(1))))?;
        socket.get_ref().set_write_timeout(Some(self.config.write_timeout.max(Duration::from_millis(1))))?;
        Ok(socket)
    }

    fn serve(&mut self, mut socket: Socket) -> Result<(), tungstenite::Error> {
        let mut next_frame = Instant::now();
        // Set while queued bytes are still waiting for the peer to read.
        let mut backlogged = false;
        let mut dropped_frames = 0u64;
        loop {
            if self.stopping() {
                if dropped_frames > 0 {
                    debug!(target: "handsort::transport", dropped_frames, "frames dropped on a slow connection");
                }
                return self.close(socket);
            }
            if backlogged {
                backlogged = !flushed(socket.flush())?;
            }
            while let Ok(command) = self.commands.try_recv() {
                debug!(target: "handsort::transport", command = %command.wire_text(), "sending command");
                backlogged |= !flushed(socket.send(Message::Text(command.wire_text())))?;
            }
            let now = Instant::now();
            if now >= next_frame {
                if let Some(payload) = self.frames.next_frame() {
                    if backlogged {
                        dropped_frames += 1;
                    } else {
                        backlogged = !flushed(socket.send(Message::Text(payload)))?;
                    }
                }
                next_frame = now + self.config.frame_interval;
            }
            match socket.read() {
                Ok(Message::Text(text)) => match PerceptionMessage::decode(&text) {
                    Ok(message) => self.mailbox.post(message),
                    Err(err) => {
                        self.mailbox.reject();
                        debug!(target: "handsort::transport", "dropping malformed message: {err}");
                    }
                },
                Ok(Message::Close(_)) => return Ok(()),
                Ok(_) => {}
                Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {}
                Err(err) => return Err(err),
            }
        }
    }

    /// Starts the closing handshake and waits for it at most `connect_timeout`; the
    /// socket is dropped either way.
    fn close(&self, mut socket: Socket) -> Result<(), tungstenite::Error> {
        match socket.close(None) {
            Ok(()) => {}
            Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => return Ok(()),
            Err(err) => return Err(err),
        }
        let deadline = Instant::now() + self.config.connect_timeout;
        while Instant::now() < deadline {
            match socket.read() {
                Ok(_) => {}
                Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {}
                Err(_) => break,
            }
        }
        Ok(())
    }

    fn discard_commands(&self) {
        let dropped = self.commands.try_iter().count();
        if dropped > 0 {
            debug!(target: "handsort::transport", dropped, "dropped commands issued while offline");
        }
    }

    fn wait(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.stopping() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(20)));
        }
    }
}
