//! A small SET/GET/DEL embedder wired up purely for the test, exercising
//! `Server`/`Registry`/`ConnectionDirectory` together the way `respcored`
//! does in production.

use respcore::{reply, Server, ServerConfig};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn start_kv_server() -> std::net::SocketAddr {
    let store: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>> = Arc::new(Mutex::new(HashMap::new()));
    let mut server = Server::new(ServerConfig::default());

    let set_store = store.clone();
    server.register(
        "SET",
        Arc::new(move |conn, argv, _dir| {
            set_store.lock().unwrap().insert(argv[1].clone(), argv[2].clone());
            reply::status(conn, "OK");
        }),
    );

    let get_store = store.clone();
    server.register(
        "GET",
        Arc::new(move |conn, argv, _dir| match get_store.lock().unwrap().get(&argv[1]) {
            Some(v) => {
                reply::bulk(conn, v);
            }
            None => {
                reply::null(conn);
            }
        }),
    );

    let del_store = store.clone();
    server.register(
        "DEL",
        Arc::new(move |conn, argv, _dir| {
            let removed = del_store.lock().unwrap().remove(&argv[1]).is_some();
            reply::integer(conn, removed as i64);
        }),
    );

    server.start("127.0.0.1", 0).expect("start server")
}

fn connect(addr: std::net::SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

fn read_line(reader: &mut BufReader<&TcpStream>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read line");
    line
}

#[test]
fn set_get_del_cycle() {
    let addr = start_kv_server();
    let stream = connect(addr);
    let mut reader = BufReader::new(&stream);
    let mut writer = &stream;

    writer
        .write_all(b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n")
        .unwrap();
    assert_eq!(read_line(&mut reader), "+OK\r\n");

    writer.write_all(b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n").unwrap();
    assert_eq!(read_line(&mut reader), "$1\r\n");
    assert_eq!(read_line(&mut reader), "1\r\n");

    writer.write_all(b"*2\r\n$3\r\nDEL\r\n$1\r\na\r\n").unwrap();
    assert_eq!(read_line(&mut reader), ":1\r\n");

    writer.write_all(b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n").unwrap();
    assert_eq!(read_line(&mut reader), "$-1\r\n");
}

#[test]
fn fragmented_request_dispatches_exactly_once() {
    let addr = start_kv_server();
    let mut stream = connect(addr);

    stream.write_all(b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n").unwrap();
    std::thread::sleep(Duration::from_millis(50));
    stream.write_all(b"$3\r\nbar\r\n").unwrap();

    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"+OK\r\n");
}

#[test]
fn idle_connection_is_evicted_after_threshold() {
    let mut server = Server::new(ServerConfig {
        idle_close_secs: 0,
        tick_interval_secs: 1,
        ..ServerConfig::default()
    });
    server.register(
        "PING",
        Arc::new(|conn, _argv, _dir| {
            reply::status(conn, "PONG");
        }),
    );
    let addr = server.start("127.0.0.1", 0).expect("start server");

    let mut stream = connect(addr);
    stream.write_all(b"*1\r\n$4\r\nPING\r\n").unwrap();
    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"+PONG\r\n");

    // With idle_close_secs=0 and a 1s sweep, the next tick evicts the
    // connection even though it just replied; reads afterward see EOF.
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(n, 0, "expected EOF after idle eviction");
}
