//! Minimal embedder: a handful of string commands over `respcore`,
//! backed by a plain mutex-guarded map. Demonstrates wiring up a
//! `Server`, not a production key-value store.

use anyhow::Context;
use mimalloc::MiMalloc;
use respcore::{reply, ConnectionDirectory, Connection, Server, ServerConfig};
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

type Store = Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>;

/// Pull the handful of knobs `ServerConfig` exposes from the environment.
/// Unset variables keep their `Default` value; a set-but-unparseable one
/// is a startup error rather than a silent fallback.
fn config_from_env() -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig::default();
    if let Ok(v) = env::var("RESPCORED_IDLE_CLOSE_SECS") {
        config.idle_close_secs = v.parse().context("RESPCORED_IDLE_CLOSE_SECS")?;
    }
    if let Ok(v) = env::var("RESPCORED_TICK_INTERVAL_SECS") {
        config.tick_interval_secs = v.parse().context("RESPCORED_TICK_INTERVAL_SECS")?;
    }
    if let Ok(v) = env::var("RESPCORED_BACKLOG") {
        config.backlog = v.parse().context("RESPCORED_BACKLOG")?;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = config_from_env()?;
    let store: Store = Arc::new(Mutex::new(HashMap::new()));
    let mut server = Server::new(config);

    server.register(
        "PING",
        Arc::new(|conn: &mut Connection, _argv, _dir: &mut dyn ConnectionDirectory| {
            reply::status(conn, "PONG");
        }),
    );

    server.register(
        "ECHO",
        Arc::new(|conn: &mut Connection, argv: &[Vec<u8>], _dir: &mut dyn ConnectionDirectory| {
            reply::bulk(conn, &argv[1]);
        }),
    );

    let set_store = store.clone();
    server.register(
        "SET",
        Arc::new(move |conn: &mut Connection, argv: &[Vec<u8>], _dir: &mut dyn ConnectionDirectory| {
            set_store.lock().unwrap().insert(argv[1].clone(), argv[2].clone());
            reply::status(conn, "OK");
        }),
    );

    let get_store = store.clone();
    server.register(
        "GET",
        Arc::new(move |conn: &mut Connection, argv: &[Vec<u8>], _dir: &mut dyn ConnectionDirectory| {
            match get_store.lock().unwrap().get(&argv[1]) {
                Some(v) => {
                    reply::bulk(conn, v);
                }
                None => {
                    reply::null(conn);
                }
            }
        }),
    );

    let del_store = store.clone();
    server.register(
        "DEL",
        Arc::new(move |conn: &mut Connection, argv: &[Vec<u8>], _dir: &mut dyn ConnectionDirectory| {
            let removed = del_store.lock().unwrap().remove(&argv[1]).is_some();
            reply::integer(conn, removed as i64);
        }),
    );

    server.register(
        "QUIT",
        Arc::new(|conn: &mut Connection, _argv, dir: &mut dyn ConnectionDirectory| {
            reply::status(conn, "OK");
            dir.close_connection(conn.sid);
        }),
    );

    let addr = server
        .start("0.0.0.0", 6399)
        .context("failed to start respcore server")?;
    log::info!("listening on {addr}");
    loop {
        std::thread::park();
    }
}
