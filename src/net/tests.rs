//! Tests for connection establishment and supervision.

use std::{
    io::Read,
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::Duration,
};

use rstest::{fixture, rstest};

use crate::config::BackoffPolicy;

use super::{
    supervisor::ConnectionSupervisor,
    transport::{self, Endpoint, TlsOptions},
};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn plain_endpoint(addr: SocketAddr) -> Endpoint {
    Endpoint {
        host: addr.ip().to_string(),
        port: addr.port(),
        tls: None,
    }
}

/// An address that refuses connections: bind an ephemeral port, then drop
/// the listener before anyone connects.
fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    listener.local_addr().expect("listener has address")
}

fn test_policy() -> BackoffPolicy {
    BackoffPolicy {
        initial: Duration::from_millis(10),
        max: Duration::from_millis(80),
    }
}

#[rstest]
fn connects_over_plain_tcp(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let (bytes_tx, bytes_rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = tcp_listener.accept().expect("accept connection");
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).expect("read until close");
        bytes_tx.send(buf).expect("send bytes");
    });

    let mut conn =
        transport::connect(&plain_endpoint(addr), CONNECT_TIMEOUT).expect("connect to listener");
    conn.write_all(b"ping\n").expect("write line");
    conn.flush().expect("flush");
    drop(conn);

    let received = bytes_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("bytes received");
    assert_eq!(received, b"ping\n");
}

#[rstest]
fn connect_reports_refused_endpoint() {
    let endpoint = plain_endpoint(refused_addr());
    assert!(transport::connect(&endpoint, CONNECT_TIMEOUT).is_err());
}

#[rstest]
fn supervisor_caches_the_connection(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let (bytes_tx, bytes_rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = tcp_listener.accept().expect("accept connection");
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).expect("read until close");
        bytes_tx.send(buf).expect("send bytes");
    });

    let mut supervisor = ConnectionSupervisor::new(
        plain_endpoint(addr),
        CONNECT_TIMEOUT,
        WRITE_TIMEOUT,
        test_policy(),
    );
    assert!(!supervisor.established());

    supervisor
        .acquire()
        .expect("first acquire connects")
        .write_all(b"one\n")
        .expect("write first line");
    assert!(supervisor.established());

    // Second acquire reuses the cached connection; both lines land on the
    // single accepted stream.
    supervisor
        .acquire()
        .expect("second acquire reuses cache")
        .write_all(b"two\n")
        .expect("write second line");

    supervisor.teardown();
    let received = bytes_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("bytes received");
    assert_eq!(received, b"one\ntwo\n");
}

#[rstest]
fn supervisor_rebuilds_after_teardown(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let (count_tx, count_rx) = mpsc::channel();
    thread::spawn(move || {
        for n in 1..=2 {
            let (stream, _) = tcp_listener.accept().expect("accept connection");
            count_tx.send(n).expect("send accept count");
            drop(stream);
        }
    });

    let mut supervisor = ConnectionSupervisor::new(
        plain_endpoint(addr),
        CONNECT_TIMEOUT,
        WRITE_TIMEOUT,
        test_policy(),
    );

    supervisor.acquire().expect("first acquire connects");
    assert_eq!(count_rx.recv_timeout(Duration::from_secs(2)), Ok(1));

    assert!(supervisor.teardown());
    assert!(!supervisor.established());
    // Explicit teardown without a live connection is a no-op.
    assert!(!supervisor.teardown());

    supervisor.acquire().expect("acquire after teardown reconnects");
    assert_eq!(count_rx.recv_timeout(Duration::from_secs(2)), Ok(2));
}

#[rstest]
fn tls_handshake_respects_connect_timeout(tcp_listener: TcpListener) {
    use std::time::Instant;

    let addr = tcp_listener.local_addr().expect("listener has address");
    thread::spawn(move || {
        let (stream, _) = tcp_listener.accept().expect("accept connection");
        // Keep the TCP connection open without speaking TLS, simulating a
        // peer that stalls during the handshake.
        thread::sleep(Duration::from_secs(2));
        drop(stream);
    });

    let endpoint = Endpoint {
        host: addr.ip().to_string(),
        port: addr.port(),
        tls: Some(TlsOptions {
            domain: "localhost".into(),
            accept_invalid_certs: true,
        }),
    };
    let start = Instant::now();
    let result = transport::connect(&endpoint, Duration::from_millis(250));
    let elapsed = start.elapsed();

    assert!(result.is_err(), "handshake should fail for a stalled peer");
    assert!(
        elapsed < Duration::from_secs(2),
        "handshake should respect the connect timeout, elapsed {elapsed:?}",
    );
}

#[rstest]
fn failed_acquires_advance_the_backoff() {
    let mut supervisor = ConnectionSupervisor::new(
        plain_endpoint(refused_addr()),
        CONNECT_TIMEOUT,
        WRITE_TIMEOUT,
        test_policy(),
    );

    assert!(supervisor.acquire().is_err());
    let first = supervisor.retry_delay();
    assert!(supervisor.acquire().is_err());
    let second = supervisor.retry_delay();
    assert!(supervisor.acquire().is_err());
    let third = supervisor.retry_delay();

    assert_eq!(first, Duration::from_millis(10));
    assert!(second >= first);
    assert!(third >= second);
    assert!(third <= Duration::from_millis(80));
}
