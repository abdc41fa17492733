//! One peer link: framed writes on the owned write half, and the background
//! receiver task that turns the read half into queue pushes.
//!
//! Each unordered actor pair shares a single TCP connection. The tick loop
//! owns the [`PeerLink`] (write side); the receiver task owns the read side
//! and forwards every decoded message to the inbound queue the instant it is
//! complete. The two never contend.

use crate::error::{Result, TransportError};
use crate::queue::QueueSender;
use codec::WireFrame;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use types::{ActorId, Message};

/// Write side of one established link.
#[derive(Debug)]
pub struct PeerLink {
    remote: ActorId,
    writer: OwnedWriteHalf,
}

impl PeerLink {
    pub fn new(remote: ActorId, writer: OwnedWriteHalf) -> Self {
        PeerLink { remote, writer }
    }

    pub fn remote(&self) -> ActorId {
        self.remote
    }

    /// Frame and write one message, flushing so it hits the wire
    /// immediately. Blocks only on transport backpressure; any write error
    /// means the link is broken.
    pub async fn send(&mut self, message: &Message) -> Result<()> {
        self.write_frame(&WireFrame::Event(*message)).await?;
        trace!(peer = %self.remote, clock = message.clock, "sent message");
        Ok(())
    }

    /// Write the one-time handshake frame identifying the local actor.
    pub async fn send_hello(&mut self, local: ActorId) -> Result<()> {
        self.write_frame(&WireFrame::Hello { actor: local }).await
    }

    async fn write_frame(&mut self, frame: &WireFrame) -> Result<()> {
        let bytes = codec::encode_frame(frame).map_err(|source| TransportError::Decode {
            peer: self.remote,
            source,
        })?;
        self.writer
            .write_all(&bytes)
            .await
            .map_err(|e| TransportError::link_broken(self.remote, format!("write failed: {e}")))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::link_broken(self.remote, format!("flush failed: {e}")))
    }

    /// Half-close the link. Called during STOPPING; the remote receiver
    /// observes a clean EOF.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(peer = %self.remote, error = %e, "link shutdown");
        }
    }
}

/// Read one length-prefixed frame payload.
///
/// `Ok(None)` is a clean EOF at a frame boundary. EOF mid-frame, an I/O
/// error, or an oversized length prefix are link failures.
pub async fn read_frame(reader: &mut OwnedReadHalf, peer: ActorId) -> Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; codec::LEN_PREFIX_BYTES];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => {
            return Err(TransportError::link_broken(
                peer,
                format!("read failed: {e}"),
            ))
        }
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    codec::check_frame_len(len).map_err(|source| TransportError::Decode { peer, source })?;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| {
        TransportError::link_broken(peer, format!("truncated frame ({len} bytes expected): {e}"))
    })?;
    Ok(Some(payload))
}

/// Spawn the background receiver for one link.
///
/// Decodes frames as they complete and pushes each message straight into the
/// inbound queue. Any failure while the shutdown flag is unset is reported on
/// `faults` and ends the task; once shutdown is signalled the task exits
/// quietly on the next wakeup.
pub fn spawn_receiver(
    remote: ActorId,
    mut reader: OwnedReadHalf,
    queue: QueueSender,
    faults: mpsc::UnboundedSender<TransportError>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender means the mesh is gone; stop either way.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                frame = read_frame(&mut reader, remote) => frame,
            };

            match frame {
                Ok(Some(payload)) => match codec::decode_payload(&payload) {
                    Ok(WireFrame::Event(message)) => queue.push(message),
                    Ok(WireFrame::Hello { actor }) => {
                        // A second handshake frame is a protocol violation.
                        report(
                            &faults,
                            TransportError::link_broken(
                                remote,
                                format!("unexpected Hello frame from actor {actor}"),
                            ),
                        );
                        break;
                    }
                    Err(source) => {
                        report(&faults, TransportError::Decode {
                            peer: remote,
                            source,
                        });
                        break;
                    }
                },
                Ok(None) => {
                    if !*shutdown.borrow() {
                        report(
                            &faults,
                            TransportError::link_broken(remote, "connection closed".to_string()),
                        );
                    }
                    break;
                }
                Err(error) => {
                    if !*shutdown.borrow() {
                        report(&faults, error);
                    }
                    break;
                }
            }
        }
        debug!(peer = %remote, "receiver task finished");
    })
}

fn report(faults: &mpsc::UnboundedSender<TransportError>, error: TransportError) {
    warn!(error = %error, "link fault");
    // The runtime may already be tearing down; a dropped fault is harmless.
    let _ = faults.send(error);
}
