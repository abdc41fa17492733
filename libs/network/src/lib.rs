//! # Tickmesh Network Layer
//!
//! Reliable point-to-point plumbing between actors:
//!
//! - [`InboundQueue`]: unbounded FIFO filled by per-link receiver tasks and
//!   drained only by the owning actor's tick loop
//! - [`PeerLink`]: the write side of one established TCP connection to one
//!   peer, with length-prefixed framing
//! - [`Mesh`]: full-mesh establishment, initiating to higher ids, accepting from
//!   lower ids, one connection per unordered pair carrying both directions
//!
//! Channels are assumed reliable and order-preserving; a broken link or a
//! decode failure mid-run is therefore fatal to the simulation and is
//! reported on the mesh's fault channel rather than silently skipped.

pub mod error;
pub mod mesh;
pub mod peer;
pub mod queue;

pub use error::{Result, TransportError};
pub use mesh::{Mesh, MeshOptions};
pub use peer::{spawn_receiver, PeerLink};
pub use queue::{InboundQueue, QueueSender};
