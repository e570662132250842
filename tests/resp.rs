//! End-to-end RESP wire tests against a real `Server` bound to an
//! ephemeral port, exercising the public API the way an embedder would.

use respcore::{reply, Server, ServerConfig};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

fn start_echo_server() -> std::net::SocketAddr {
    let mut server = Server::new(ServerConfig::default());
    server.register(
        "PING",
        Arc::new(|conn, _argv, _dir| {
            reply::status(conn, "PONG");
        }),
    );
    server.register(
        "ECHO",
        Arc::new(|conn, argv, _dir| {
            reply::bulk(conn, &argv[1]);
        }),
    );
    server.start("127.0.0.1", 0).expect("start server")
}

fn connect(addr: std::net::SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

#[test]
fn ping_round_trip() {
    let addr = start_echo_server();
    let mut stream = connect(addr);
    stream.write_all(b"*1\r\n$4\r\nPING\r\n").unwrap();
    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"+PONG\r\n");
}

#[test]
fn unknown_command_error_is_verbatim_not_suport() {
    let addr = start_echo_server();
    let mut stream = connect(addr);
    stream.write_all(b"*1\r\n$7\r\nUNKNOWN\r\n").unwrap();
    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"-UNKNOWN not suport\r\n");
}

#[test]
fn two_pipelined_requests_reply_in_order() {
    let addr = start_echo_server();
    let mut stream = connect(addr);
    stream
        .write_all(b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n")
        .unwrap();
    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"+PONG\r\n$2\r\nhi\r\n");
}
