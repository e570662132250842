//! Round-trip throughput for 1k pipelined SET requests sent over a real
//! loopback connection to a running `Server` — the parser and dispatcher
//! are only reachable through a socket from outside the crate.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use respcore::{reply, Server, ServerConfig};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

fn start_server() -> std::net::SocketAddr {
    let mut server = Server::new(ServerConfig::default());
    server.register(
        "SET",
        Arc::new(|conn, _argv, _dir| {
            reply::status(conn, "OK");
        }),
    );
    server.start("127.0.0.1", 0).expect("start server")
}

fn bench_resp_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("resp");
    let addr = start_server();

    let mut wire = Vec::new();
    for i in 0..1000 {
        wire.extend_from_slice(
            format!(
                "*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n${}\r\nval{}\r\n",
                3 + i.to_string().len(),
                i
            )
            .as_bytes(),
        );
    }

    group.bench_function("drive_1k_pipelined_sets", |b| {
        b.iter(|| {
            let mut stream = TcpStream::connect(addr).expect("connect");
            stream.write_all(&wire).expect("write");
            let mut total = 0usize;
            let mut buf = [0u8; 65536];
            while total < wire.len() / 2 {
                let n = stream.read(&mut buf).expect("read");
                if n == 0 {
                    break;
                }
                total += n;
            }
            black_box(total);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_resp_parse);
criterion_main!(benches);
