//! Mesh establishment and link behavior against real TCP sockets.

use network::{Mesh, MeshOptions, TransportError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use types::{ActorId, Message};

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Poll an inbound queue until a message shows up or the deadline passes.
async fn wait_for_message(mesh: &Mesh) -> Message {
    for _ in 0..200 {
        if let Some(message) = mesh.queue().try_pop() {
            return message;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no message arrived within 2s");
}

fn fast_options() -> MeshOptions {
    MeshOptions {
        connect_attempts: 5,
        connect_backoff: Duration::from_millis(100),
        connect_timeout: Duration::from_secs(2),
        accept_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn two_actor_mesh_carries_traffic_both_ways() {
    let (l1, a1) = bind().await;
    let (l2, a2) = bind().await;
    let id1 = ActorId::new(1);
    let id2 = ActorId::new(2);
    let options = fast_options();

    let peers1 = [(id2, a2)];
    let peers2 = [(id1, a1)];
    let (m1, m2) = tokio::join!(
        Mesh::establish(id1, l1, &peers1, &options),
        Mesh::establish(id2, l2, &peers2, &options),
    );
    let mut m1 = m1.unwrap();
    let mut m2 = m2.unwrap();
    assert_eq!(m1.peer_ids(), vec![id2]);
    assert_eq!(m2.peer_ids(), vec![id1]);

    m1.link(id2).unwrap().send(&Message::new(id1, 7)).await.unwrap();
    m2.link(id1).unwrap().send(&Message::new(id2, 9)).await.unwrap();

    assert_eq!(wait_for_message(&m2).await, Message::new(id1, 7));
    assert_eq!(wait_for_message(&m1).await, Message::new(id2, 9));

    tokio::join!(m1.shutdown(), m2.shutdown());
}

#[tokio::test]
async fn three_actor_mesh_is_fully_connected() {
    let (l1, a1) = bind().await;
    let (l2, a2) = bind().await;
    let (l3, a3) = bind().await;
    let ids = [ActorId::new(1), ActorId::new(2), ActorId::new(3)];
    let addrs = [a1, a2, a3];
    let options = fast_options();

    let peers_of = |me: usize| -> Vec<(ActorId, SocketAddr)> {
        (0..3).filter(|i| *i != me).map(|i| (ids[i], addrs[i])).collect()
    };

    let (p1, p2, p3) = (peers_of(0), peers_of(1), peers_of(2));
    let (m1, m2, m3) = tokio::join!(
        Mesh::establish(ids[0], l1, &p1, &options),
        Mesh::establish(ids[1], l2, &p2, &options),
        Mesh::establish(ids[2], l3, &p3, &options),
    );
    let mut meshes = [m1.unwrap(), m2.unwrap(), m3.unwrap()];

    for mesh in &meshes {
        assert_eq!(mesh.peer_ids().len(), 2);
    }

    // Every actor sends one message on every link.
    for (i, mesh) in meshes.iter_mut().enumerate() {
        for peer in mesh.peer_ids() {
            let message = Message::new(ids[i], (i + 1) as u64);
            mesh.link(peer).unwrap().send(&message).await.unwrap();
        }
    }

    // Every actor hears from both peers.
    for (i, mesh) in meshes.iter().enumerate() {
        let mut senders = vec![
            wait_for_message(mesh).await.sender,
            wait_for_message(mesh).await.sender,
        ];
        senders.sort();
        let mut expected: Vec<ActorId> =
            (0..3).filter(|j| *j != i).map(|j| ids[j]).collect();
        expected.sort();
        assert_eq!(senders, expected);
    }

    let [m1, m2, m3] = meshes;
    tokio::join!(m1.shutdown(), m2.shutdown(), m3.shutdown());
}

#[tokio::test]
async fn initiator_retries_until_listener_appears() {
    let (l1, a1) = bind().await;
    // Reserve an address for actor 2, then release it so the first connect
    // attempts fail.
    let (l2, a2) = bind().await;
    drop(l2);

    let id1 = ActorId::new(1);
    let id2 = ActorId::new(2);
    let options = fast_options();

    let late_acceptor = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let listener = TcpListener::bind(a2).await.unwrap();
        Mesh::establish(id2, listener, &[(id1, a1)], &fast_options()).await
    });

    let m1 = Mesh::establish(id1, l1, &[(id2, a2)], &options).await.unwrap();
    let m2 = late_acceptor.await.unwrap().unwrap();

    tokio::join!(m1.shutdown(), m2.shutdown());
}

#[tokio::test]
async fn establishment_fails_after_bounded_attempts() {
    let (l1, _a1) = bind().await;
    // An address nobody ever listens on.
    let (dead, dead_addr) = bind().await;
    drop(dead);

    let options = MeshOptions {
        connect_attempts: 2,
        connect_backoff: Duration::from_millis(50),
        connect_timeout: Duration::from_millis(500),
        accept_timeout: Duration::from_secs(1),
    };

    let err = Mesh::establish(ActorId::new(1), l1, &[(ActorId::new(2), dead_addr)], &options)
        .await
        .unwrap_err();
    match err {
        TransportError::Establish { peer, attempts, .. } => {
            assert_eq!(peer, ActorId::new(2));
            assert_eq!(attempts, 2);
        }
        other => panic!("expected Establish error, got {other}"),
    }
}

#[tokio::test]
async fn acceptor_rejects_garbage_handshake() {
    let (l2, a2) = bind().await;
    let id2 = ActorId::new(2);

    // A "peer" that speaks nonsense instead of Hello.
    let intruder = tokio::spawn(async move {
        let mut stream = TcpStream::connect(a2).await.unwrap();
        stream.write_all(&[0, 0, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF]).await.unwrap();
        stream.flush().await.unwrap();
        // Hold the socket open so the acceptor sees the frame, not an EOF.
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let err = Mesh::establish(id2, l2, &[(ActorId::new(1), "127.0.0.1:1".parse().unwrap())], &fast_options())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Handshake { .. }), "got {err}");
    intruder.abort();
}

#[tokio::test]
async fn garbage_frame_on_established_link_raises_decode_fault() {
    let (l2, a2) = bind().await;
    let id1 = ActorId::new(1);
    let id2 = ActorId::new(2);

    // A peer that completes establishment normally, then emits a
    // well-framed payload that is not a WireFrame.
    let rogue_peer = tokio::spawn(async move {
        let (mut stream, _) = l2.accept().await.unwrap();
        let mut hello = [0u8; 64];
        let n = stream.read(&mut hello).await.unwrap();
        assert!(n > 0, "expected the initiator's Hello");
        stream.write_all(&[0, 0, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF]).await.unwrap();
        stream.flush().await.unwrap();
        // Hold the socket open so the fault comes from the decode, not EOF.
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let (l1, _a1) = bind().await;
    let mut m1 = Mesh::establish(id1, l1, &[(id2, a2)], &fast_options())
        .await
        .unwrap();

    let mut fault = None;
    for _ in 0..200 {
        if let Some(f) = m1.try_fault() {
            fault = Some(f);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    match fault.expect("no fault reported within 2s") {
        TransportError::Decode { peer, .. } => assert_eq!(peer, id2),
        other => panic!("expected Decode fault, got {other}"),
    }

    m1.shutdown().await;
    rogue_peer.abort();
}

#[tokio::test]
async fn peer_disappearing_mid_run_raises_fault() {
    let (l1, a1) = bind().await;
    let (l2, a2) = bind().await;
    let id1 = ActorId::new(1);
    let id2 = ActorId::new(2);
    let options = fast_options();

    let peers1 = [(id2, a2)];
    let peers2 = [(id1, a1)];
    let (m1, m2) = tokio::join!(
        Mesh::establish(id1, l1, &peers1, &options),
        Mesh::establish(id2, l2, &peers2, &options),
    );
    let mut m1 = m1.unwrap();
    let m2 = m2.unwrap();

    // Actor 2 vanishes without the cooperative shutdown handshake.
    drop(m2);

    let mut fault = None;
    for _ in 0..200 {
        if let Some(f) = m1.try_fault() {
            fault = Some(f);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let fault = fault.expect("no fault reported within 2s");
    assert_eq!(fault.peer(), Some(id2));

    m1.shutdown().await;
}
