/// Both TCP transports against each other over loopback, with one side
/// refusing to read for a while
use std::{
    net::{SocketAddr, TcpListener},
    thread,
    time::{Duration, Instant},
};

use pitlane_client::transport::{
    tcp::Socket as ClientTcpSocket, PacketReceiver as ClientReceiver,
    PacketSender as ClientSender, Socket as ClientSocket,
};
use pitlane_server::transport::{
    tcp::Socket as ServerTcpSocket, PacketReceiver as ServerReceiver,
    PacketSender as ServerSender, Socket as ServerSocket,
};
use pitlane_test::init_logging;

const FRAME_COUNT: usize = 50;
const FRAME_LEN: usize = 60_000;
const PATIENCE: Duration = Duration::from_secs(10);

struct Link {
    server_tx: Box<dyn ServerSender>,
    server_rx: Box<dyn ServerReceiver>,
    client_tx: Box<dyn ClientSender>,
    client_rx: Box<dyn ClientReceiver>,
    client_addr: SocketAddr,
}

fn free_port() -> SocketAddr {
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap()
}

fn payload(index: usize) -> Vec<u8> {
    let mut bytes = vec![(index % 251) as u8; FRAME_LEN];
    bytes[..8].copy_from_slice(&(index as u64).to_le_bytes());
    bytes
}

/// Connects both ends and waits until the server has seen the client's
/// first packet, which tells it the client's address.
fn link() -> Link {
    init_logging();
    let address = free_port();
    let (server_tx, mut server_rx) = Box::new(ServerTcpSocket::new(address))
        .listen()
        .unwrap();
    let (client_tx, client_rx) = Box::new(ClientTcpSocket::new(address, PATIENCE))
        .connect()
        .unwrap();
    client_tx.send(b"hello").unwrap();

    let started = Instant::now();
    loop {
        if let Some((client_addr, bytes)) = server_rx.receive().unwrap() {
            assert_eq!(bytes, b"hello");
            return Link {
                server_tx,
                server_rx,
                client_tx,
                client_rx,
                client_addr,
            };
        }
        assert!(started.elapsed() < PATIENCE, "hello never arrived");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn frames_survive_a_client_that_stops_reading() {
    let mut link = link();

    for index in 0..FRAME_COUNT {
        link.server_tx
            .send(&link.client_addr, &payload(index))
            .unwrap();
    }

    let mut received = Vec::new();
    let started = Instant::now();
    while received.len() < FRAME_COUNT {
        // polling the server is what pushes out its queued bytes
        assert!(link.server_rx.receive().unwrap().is_none());
        while let Some(bytes) = link.client_rx.receive().unwrap() {
            received.push(bytes.to_vec());
        }
        assert!(started.elapsed() < PATIENCE, "only {} frames arrived", received.len());
        thread::sleep(Duration::from_millis(1));
    }

    for (index, bytes) in received.iter().enumerate() {
        assert_eq!(bytes, &payload(index), "frame {} is damaged", index);
    }
}

#[test]
fn frames_survive_a_server_that_stops_reading() {
    let mut link = link();

    for index in 0..FRAME_COUNT {
        link.client_tx.send(&payload(index)).unwrap();
    }

    let mut received = Vec::new();
    let started = Instant::now();
    while received.len() < FRAME_COUNT {
        assert!(link.client_rx.receive().unwrap().is_none());
        while let Some((address, bytes)) = link.server_rx.receive().unwrap() {
            assert_eq!(address, link.client_addr);
            received.push(bytes.to_vec());
        }
        assert!(started.elapsed() < PATIENCE, "only {} frames arrived", received.len());
        thread::sleep(Duration::from_millis(1));
    }

    for (index, bytes) in received.iter().enumerate() {
        assert_eq!(bytes, &payload(index), "frame {} is damaged", index);
    }
}

#[test]
fn client_that_never_reads_is_dropped() {
    let mut link = link();

    let refused = (0..2_000).any(|index| {
        link.server_tx
            .send(&link.client_addr, &payload(index))
            .is_err()
    });
    assert!(refused);

    let started = Instant::now();
    loop {
        let _ = link.server_rx.receive();
        if link.server_rx.take_disconnections() == vec![link.client_addr] {
            break;
        }
        assert!(started.elapsed() < PATIENCE, "backlogged client was kept");
        thread::sleep(Duration::from_millis(1));
    }
}
