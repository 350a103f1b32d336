//! ---
//! gait_section: "02-messaging"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Length-prefixed TCP publish/subscribe channel."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! One producer binds a TCP listener and fans every published frame out to
//! all connected subscribers through a bounded broadcast queue. Each frame on
//! the wire is a big-endian `u32` length followed by the frame bytes.
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use gait_common::StreamConfig;
use gait_kinematics::TimestepRecord;
use gait_logging::{gait_debug, gait_info, gait_warn, LogContext};
use thiserror::Error;
use tokio::io::{self as tokio_io, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

use crate::codec::{self, DecodeError};
use crate::framing::{matches_prefix, FrameFormat};

/// Largest frame a subscriber accepts; longer frames are skipped and
/// reported as [`DecodeError::Oversized`].
pub const MAX_FRAME_LEN: usize = 64 * 1024;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind tcp://{address}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to tcp://{address}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// `host:port` form accepted by the tokio resolvers.
pub fn endpoint(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

#[derive(Debug, Clone)]
pub struct PublisherOptions {
    pub format: FrameFormat,
    pub queue_depth: usize,
}

impl PublisherOptions {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            format: FrameFormat::from_config(config),
            queue_depth: config.queue_depth,
        }
    }
}

impl Default for PublisherOptions {
    fn default() -> Self {
        Self::from_config(&StreamConfig::default())
    }
}

/// Producer side of the channel.
pub struct Publisher {
    address: SocketAddr,
    format: FrameFormat,
    tx: broadcast::Sender<Bytes>,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
    context: LogContext,
}

impl Publisher {
    pub async fn bind(
        address: &str,
        options: PublisherOptions,
        context: LogContext,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| TransportError::Bind {
                address: address.to_string(),
                source,
            })?;
        let local = listener.local_addr()?;
        let context = context.with_source(format!("tcp://{local}"));
        gait_info!(context = context, "publisher listening");

        let (tx, _) = broadcast::channel(options.queue_depth.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let accept_task = tokio::spawn(accept_loop(
            listener,
            tx.clone(),
            shutdown_rx,
            context.clone(),
        ));

        Ok(Self {
            address: local,
            format: options.format,
            tx,
            shutdown,
            accept_task,
            context,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Queue one already-framed message for every subscriber. Returns the
    /// number of subscribers reached; with none connected the frame is dropped.
    pub fn publish_frame(&self, frame: Bytes) -> usize {
        self.tx.send(frame).unwrap_or(0)
    }

    pub fn publish(&self, record: &TimestepRecord) -> usize {
        let frame = self.format.wrap(&codec::encode(record));
        self.publish_frame(frame)
    }

    /// Publish records one by one, sleeping `interval` after each. There is
    /// no catch-up: a slow iteration simply delays the rest of the stream.
    pub async fn stream<I>(&self, records: I, interval: Duration) -> u64
    where
        I: IntoIterator<Item = TimestepRecord>,
    {
        let mut sent = 0u64;
        for record in records {
            let reached = self.publish(&record);
            gait_debug!(
                context = self.context.clone().with_frame(sent),
                "published to {} subscriber(s)",
                reached
            );
            sent += 1;
            tokio::time::sleep(interval).await;
        }
        sent
    }

    /// Stop accepting and close every subscriber connection.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        drop(self.tx);
        if let Err(err) = self.accept_task.await {
            gait_warn!(context = self.context, "accept task ended abnormally: {}", err);
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    tx: broadcast::Sender<Bytes>,
    mut shutdown: watch::Receiver<bool>,
    context: LogContext,
) {
    let mut writers = Vec::new();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    gait_info!(context = context, "subscriber connected from {}", peer);
                    let rx = tx.subscribe();
                    writers.push(tokio::spawn(writer_loop(stream, rx, context.clone())));
                }
                Err(err) => gait_warn!(context = context, "accept failed: {}", err),
            },
        }
    }
    drop(tx);
    for mut writer in writers {
        // A peer that stopped reading must not hold the producer open.
        if tokio::time::timeout(DRAIN_TIMEOUT, &mut writer).await.is_err() {
            writer.abort();
        }
    }
}

async fn writer_loop(mut stream: TcpStream, mut rx: broadcast::Receiver<Bytes>, context: LogContext) {
    let _ = stream.set_nodelay(true);
    loop {
        match rx.recv().await {
            Ok(frame) => {
                if let Err(err) = write_frame(&mut stream, &frame).await {
                    gait_debug!(context = context, "subscriber went away: {}", err);
                    break;
                }
            }
            // Slow subscribers lose the oldest frames without notice to the peer.
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                gait_debug!(context = context, "subscriber lagged, {} frame(s) dropped", skipped);
            }
            // All senders gone: queued frames have been drained.
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    let _ = stream.shutdown().await;
}

async fn write_frame(stream: &mut TcpStream, frame: &[u8]) -> io::Result<()> {
    let len = u32::try_from(frame.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;
    stream.write_u32(len).await?;
    stream.write_all(frame).await?;
    stream.flush().await
}

#[derive(Debug, Clone)]
pub struct SubscriberOptions {
    pub format: FrameFormat,
    pub prefix: Bytes,
    pub recv_timeout: Duration,
}

impl SubscriberOptions {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            format: FrameFormat::from_config(config),
            prefix: Bytes::copy_from_slice(config.subscribe_prefix.as_bytes()),
            recv_timeout: config.recv_timeout,
        }
    }
}

impl Default for SubscriberOptions {
    fn default() -> Self {
        Self::from_config(&StreamConfig::default())
    }
}

/// Outcome of one bounded receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A payload with the framing already stripped.
    Payload(Bytes),
    /// A frame passed the prefix filter but its framing was wrong.
    Rejected(DecodeError),
    /// Nothing arrived within the receive timeout.
    TimedOut,
    /// The producer closed the connection.
    Closed,
}

/// Consumer side of the channel.
pub struct Subscriber {
    reader: BufReader<TcpStream>,
    options: SubscriberOptions,
    peer: String,
}

impl Subscriber {
    pub async fn connect(address: &str, options: SubscriberOptions) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| TransportError::Connect {
                address: address.to_string(),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        Ok(Self {
            reader: BufReader::new(stream),
            options,
            peer: format!("tcp://{address}"),
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn recv_timeout(&self) -> Duration {
        self.options.recv_timeout
    }

    /// Wait for the next frame matching the subscription prefix. Frames that
    /// fail the filter do not extend the wait. Oversized frames are skipped
    /// unread and rejected without a prefix check.
    pub async fn recv(&mut self) -> Result<Delivery, TransportError> {
        let deadline = Instant::now() + self.options.recv_timeout;
        loop {
            let frame = match timeout_at(deadline, read_frame(&mut self.reader)).await {
                Err(_) => return Ok(Delivery::TimedOut),
                Ok(Ok(ReadFrame::Frame(frame))) => frame,
                Ok(Ok(ReadFrame::Oversized(len))) => {
                    return Ok(Delivery::Rejected(DecodeError::Oversized {
                        len,
                        max: MAX_FRAME_LEN,
                    }))
                }
                Ok(Ok(ReadFrame::Eof)) => return Ok(Delivery::Closed),
                Ok(Err(err)) => return Err(err),
            };
            if !matches_prefix(&frame, &self.options.prefix) {
                continue;
            }
            return Ok(match self.options.format.unwrap(frame) {
                Ok(payload) => Delivery::Payload(payload),
                Err(err) => Delivery::Rejected(err),
            });
        }
    }
}

#[derive(Debug, PartialEq)]
enum ReadFrame {
    Frame(Bytes),
    /// Length of a frame that was consumed without being kept.
    Oversized(usize),
    /// The peer closed the connection, even mid-frame.
    Eof,
}

async fn read_frame<R>(reader: &mut R) -> Result<ReadFrame, TransportError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(ReadFrame::Eof),
        Err(err) => return Err(err.into()),
    };
    if len > MAX_FRAME_LEN {
        let skipped = tokio_io::copy(&mut (&mut *reader).take(len as u64), &mut tokio_io::sink()).await?;
        if skipped < len as u64 {
            return Ok(ReadFrame::Eof);
        }
        return Ok(ReadFrame::Oversized(len));
    }
    let mut buf = BytesMut::zeroed(len);
    match reader.read_exact(&mut buf).await {
        Ok(_) => Ok(ReadFrame::Frame(buf.freeze())),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(ReadFrame::Eof),
        Err(err) => Err(err.into()),
    }
}
