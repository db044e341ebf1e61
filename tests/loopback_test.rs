//! Loopback integration tests.
//!
//! Semua test memakai listener di 127.0.0.1 port 0 (ephemeral), satu
//! `Connection` per sisi dan per thread - sesuai kontrak satu peer per
//! connection.
//!
//! Usage:
//!   cargo test --test loopback_test

use std::thread;
use std::time::Duration;

use iris::{Connection, State, TransportError};

/// Listener siap pakai di port ephemeral.
fn listener_on_ephemeral() -> (Connection, u16) {
    let mut server = Connection::new().unwrap();
    server.listen("127.0.0.1", 0).unwrap();
    let port = server.local_addr().unwrap().port();
    (server, port)
}

#[test]
fn end_to_end_hello_and_large_reply() {
    let (mut server, port) = listener_on_ephemeral();

    let client_thread = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port).unwrap();
        assert_eq!(client.state(), State::Client);

        client.send(b"hello").unwrap();
        let reply = client.recv().unwrap().to_vec();

        client.close().unwrap();
        // Setelah close semua operasi gagal dengan kind yang jelas,
        // bukan panic.
        assert!(matches!(
            client.send(b"more"),
            Err(TransportError::InvalidState)
        ));
        assert!(matches!(client.recv(), Err(TransportError::InvalidState)));
        reply
    });

    let peer = server.accept().unwrap();
    assert!(peer.ip().is_loopback());
    assert_eq!(server.state(), State::Accepted);

    let msg = server.recv().unwrap().to_vec();
    assert_eq!(msg, b"hello");

    let reply: Vec<u8> = (0..10_000).map(|i| (i % 251) as u8).collect();
    server.send(&reply).unwrap();

    let received = client_thread.join().unwrap();
    assert_eq!(received, reply);

    server.close().unwrap();
    assert!(matches!(server.recv(), Err(TransportError::InvalidState)));
}

#[test]
fn round_trip_across_sizes_reuses_buffer() {
    let (mut server, port) = listener_on_ephemeral();
    let sizes: &[usize] = &[0, 1, 5, 1023, 1024, 1025, 4096];

    let client_thread = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port).unwrap();
        for &n in &[0usize, 1, 5, 1023, 1024, 1025, 4096] {
            let payload: Vec<u8> = (0..n).map(|i| (i % 253) as u8).collect();
            client.send(&payload).unwrap();
        }
        client.close().unwrap();
    });

    server.accept().unwrap();
    for &n in sizes {
        let expected: Vec<u8> = (0..n).map(|i| (i % 253) as u8).collect();
        let msg = server.recv().unwrap().to_vec();
        assert_eq!(msg.len(), n);
        assert_eq!(msg, expected);
    }

    client_thread.join().unwrap();
    server.close().unwrap();
}

#[test]
fn chunked_reassembly_over_socket() {
    let (mut server, port) = listener_on_ephemeral();

    // 5000 byte > READ_CHUNK, jadi pasti dirakit dari beberapa read.
    let payload: Vec<u8> = (0..5000).map(|i| ((i * 7 + 3) % 256) as u8).collect();
    let sent = payload.clone();

    let client_thread = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port).unwrap();
        client.send(&sent).unwrap();
        client.close().unwrap();
    });

    server.accept().unwrap();
    let msg = server.recv().unwrap().to_vec();
    assert_eq!(msg, payload);

    client_thread.join().unwrap();
    server.close().unwrap();
}

#[test]
fn sequential_accept_reuses_listener() {
    let (mut server, port) = listener_on_ephemeral();

    let client_thread = thread::spawn(move || {
        for round in 0..2u8 {
            let mut client = Connection::new().unwrap();
            client.connect("127.0.0.1", port).unwrap();
            client.send(&[round; 8]).unwrap();
            // Tunggu ack supaya connect berikutnya tidak balapan dengan
            // accept pertama.
            let ack = client.recv().unwrap().to_vec();
            assert_eq!(ack, vec![round]);
            client.close().unwrap();
        }
    });

    for round in 0..2u8 {
        server.accept().unwrap();
        let msg = server.recv().unwrap().to_vec();
        assert_eq!(msg, vec![round; 8]);
        server.send(&[round]).unwrap();
    }

    client_thread.join().unwrap();
    server.close().unwrap();
}

#[test]
fn peer_close_surfaces_connection_closed() {
    let (mut server, port) = listener_on_ephemeral();

    let client_thread = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port).unwrap();
        client.close().unwrap();
    });

    server.accept().unwrap();
    client_thread.join().unwrap();

    let err = server.recv().unwrap_err();
    assert!(matches!(err, TransportError::ConnectionClosed { .. }));
    server.close().unwrap();
}

#[test]
fn recv_timeout_when_peer_is_silent() {
    let (mut server, port) = listener_on_ephemeral();

    let client_thread = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port).unwrap();
        thread::sleep(Duration::from_millis(300));
        client.send(b"late").unwrap();
        client.close().unwrap();
    });

    server.accept().unwrap();
    let err = server
        .recv_timeout(Duration::from_millis(50))
        .err()
        .expect("silent peer should time out");
    assert!(matches!(err, TransportError::Timeout));

    // Timeout di antara frame tidak merusak stream - blocking recv
    // berikutnya tetap jalan.
    let msg = server.recv().unwrap().to_vec();
    assert_eq!(msg, b"late");

    client_thread.join().unwrap();
    server.close().unwrap();
}

#[test]
fn accept_timeout_without_client() {
    let (mut server, _port) = listener_on_ephemeral();
    let err = server
        .accept_timeout(Duration::from_millis(100))
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout));
    server.close().unwrap();
}

#[test]
fn accept_timeout_with_waiting_client() {
    let (mut server, port) = listener_on_ephemeral();

    let client_thread = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port).unwrap();
        client.send(b"ping").unwrap();
        client.close().unwrap();
    });

    let peer = server.accept_timeout(Duration::from_secs(5)).unwrap();
    assert!(peer.ip().is_loopback());
    let msg = server.recv().unwrap().to_vec();
    assert_eq!(msg, b"ping");

    client_thread.join().unwrap();
    server.close().unwrap();
}

#[test]
fn two_independent_connections_coexist() {
    // Satu instance per koneksi - dua pasang connection tidak boleh
    // saling ganggu.
    let (mut server_a, port_a) = listener_on_ephemeral();
    let (mut server_b, port_b) = listener_on_ephemeral();

    let thread_a = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port_a).unwrap();
        client.send(b"aaaa").unwrap();
        client.close().unwrap();
    });
    let thread_b = thread::spawn(move || {
        let mut client = Connection::new().unwrap();
        client.connect("127.0.0.1", port_b).unwrap();
        client.send(b"bb").unwrap();
        client.close().unwrap();
    });

    server_a.accept().unwrap();
    server_b.accept().unwrap();
    assert_eq!(server_a.recv().unwrap(), b"aaaa");
    assert_eq!(server_b.recv().unwrap(), b"bb");

    thread_a.join().unwrap();
    thread_b.join().unwrap();
    server_a.close().unwrap();
    server_b.close().unwrap();
}
