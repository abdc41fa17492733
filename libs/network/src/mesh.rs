//! Full-mesh establishment.
//!
//! Every actor keeps one live connection to every other actor. To get
//! exactly one connection per unordered pair, the higher-id actor initiates
//! and the lower-id actor accepts; the initiator's first frame is a `Hello`
//! naming itself. An actor initiates all of its outbound connections first
//! and then drains its accept queue; the listener is bound before any actor
//! starts connecting, so pending peers simply wait in the accept backlog.
//!
//! Ticking must not begin on a partial mesh: `establish` only returns once
//! every expected link is live, or fails with the first establishment error.

use crate::error::{Result, TransportError};
use crate::peer::{read_frame, spawn_receiver, PeerLink};
use crate::queue::InboundQueue;
use codec::WireFrame;
use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};
use types::ActorId;

/// Knobs for link establishment. Defaults match the simulation's startup
/// contract: a handful of bounded connect attempts, never an indefinite
/// retry loop.
#[derive(Debug, Clone)]
pub struct MeshOptions {
    /// Connect attempts per peer before giving up.
    pub connect_attempts: u32,
    /// Pause between connect attempts.
    pub connect_backoff: Duration,
    /// Per-attempt connect timeout.
    pub connect_timeout: Duration,
    /// How long to wait for each inbound peer (connection plus its Hello).
    pub accept_timeout: Duration,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            connect_attempts: 5,
            connect_backoff: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(5),
            accept_timeout: Duration::from_secs(15),
        }
    }
}

/// The established full mesh for one actor: all peer links, the inbound
/// queue their receivers feed, and the fault channel they report on.
#[derive(Debug)]
pub struct Mesh {
    links: BTreeMap<ActorId, PeerLink>,
    queue: InboundQueue,
    faults: mpsc::UnboundedReceiver<TransportError>,
    receivers: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl Mesh {
    /// Establish links to the whole peer set. `listener` must already be
    /// bound to this actor's configured address. Returns only when the mesh
    /// is complete.
    pub async fn establish(
        local: ActorId,
        listener: TcpListener,
        peers: &[(ActorId, SocketAddr)],
        options: &MeshOptions,
    ) -> Result<Mesh> {
        let queue = InboundQueue::new();
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut links = BTreeMap::new();
        let mut receivers = Vec::new();

        // Outbound: initiate to every higher-id peer.
        for &(peer, addr) in peers.iter().filter(|(p, _)| *p > local) {
            let stream = connect_with_retry(peer, addr, options).await?;
            let (reader, writer) = stream.into_split();
            let mut link = PeerLink::new(peer, writer);
            link.send_hello(local).await?;
            receivers.push(spawn_receiver(
                peer,
                reader,
                queue.sender(),
                faults_tx.clone(),
                shutdown_rx.clone(),
            ));
            debug!(actor = %local, peer = %peer, %addr, "initiated link");
            links.insert(peer, link);
        }

        // Inbound: accept from every lower-id peer, in whatever order they
        // arrive.
        let mut expected: BTreeSet<ActorId> =
            peers.iter().map(|(p, _)| *p).filter(|p| *p < local).collect();
        while !expected.is_empty() {
            let (stream, remote_addr) = timeout(options.accept_timeout, listener.accept())
                .await
                .map_err(|_| {
                    TransportError::handshake(format!(
                        "timed out waiting for {} inbound peer(s): {:?}",
                        expected.len(),
                        expected
                    ))
                })?
                .map_err(|e| TransportError::io("accept failed", e))?;
            stream.set_nodelay(true).ok();

            let (mut reader, writer) = stream.into_split();
            let hello = timeout(options.accept_timeout, read_frame(&mut reader, local))
                .await
                .map_err(|_| TransportError::handshake("timed out waiting for Hello"))??;
            let peer = match hello.as_deref().map(codec::decode_payload) {
                Some(Ok(WireFrame::Hello { actor })) => actor,
                Some(Ok(frame)) => {
                    return Err(TransportError::handshake(format!(
                        "expected Hello from {remote_addr}, got {frame:?}"
                    )))
                }
                Some(Err(source)) => {
                    return Err(TransportError::handshake(format!(
                        "undecodable Hello from {remote_addr}: {source}"
                    )))
                }
                None => {
                    return Err(TransportError::handshake(format!(
                        "{remote_addr} closed before Hello"
                    )))
                }
            };

            if !expected.remove(&peer) {
                return Err(TransportError::handshake(format!(
                    "unexpected Hello from actor {peer} at {remote_addr}"
                )));
            }

            receivers.push(spawn_receiver(
                peer,
                reader,
                queue.sender(),
                faults_tx.clone(),
                shutdown_rx.clone(),
            ));
            debug!(actor = %local, peer = %peer, addr = %remote_addr, "accepted link");
            links.insert(peer, PeerLink::new(peer, writer));
        }

        info!(actor = %local, peers = links.len(), "full mesh established");
        Ok(Mesh {
            links,
            queue,
            faults: faults_rx,
            receivers,
            shutdown: shutdown_tx,
        })
    }

    /// Peer ids in ascending order; the basis for deterministic peer-slot
    /// selection.
    pub fn peer_ids(&self) -> Vec<ActorId> {
        self.links.keys().copied().collect()
    }

    pub fn link(&mut self, peer: ActorId) -> Option<&mut PeerLink> {
        self.links.get_mut(&peer)
    }

    pub fn queue(&self) -> &InboundQueue {
        &self.queue
    }

    /// Non-blocking check for a fault reported by any receiver task.
    pub fn try_fault(&mut self) -> Option<TransportError> {
        self.faults.try_recv().ok()
    }

    /// Cooperative teardown: signal receivers, half-close every link, then
    /// wait for the receiver tasks to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        for link in self.links.values_mut() {
            link.shutdown().await;
        }
        for receiver in self.receivers {
            let _ = receiver.await;
        }
    }
}

async fn connect_with_retry(
    peer: ActorId,
    addr: SocketAddr,
    options: &MeshOptions,
) -> Result<TcpStream> {
    let mut last_error = None;
    for attempt in 1..=options.connect_attempts {
        match timeout(options.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                stream.set_nodelay(true).ok();
                return Ok(stream);
            }
            Ok(Err(e)) => last_error = Some(e),
            Err(_) => {
                last_error = Some(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out"),
                ))
            }
        }
        debug!(peer = %peer, %addr, attempt, "connect attempt failed, backing off");
        if attempt < options.connect_attempts {
            tokio::time::sleep(options.connect_backoff).await;
        }
    }
    Err(TransportError::Establish {
        peer,
        attempts: options.connect_attempts,
        source: last_error
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "no attempts made")),
    })
}
