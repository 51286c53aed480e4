//! Shared helpers for integration tests.
//!
//! Two kinds of server are available:
//!
//! * [`MockRedis`], an in-process RESP server over a small in-memory keyspace.
//!   Always available.
//! * [`RedisServer`], a throwaway `redis-server` on a free port. Tests using
//!   it skip themselves when the binary is not on `PATH`.

#![allow(dead_code)]

use respite::config::{ClientConfig, Transport};
use respite::resp::parse_slice;
use respite::{cmd, Client, Reply};

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::process::{Child, Command};

/// Global counter for generating unique key prefixes per test.
static TEST_ID: AtomicUsize = AtomicUsize::new(0);

/// Return a unique prefix for test keys to avoid collisions between tests.
pub fn test_prefix() -> String {
    let id = TEST_ID.fetch_add(1, Ordering::Relaxed);
    format!("respite_test_{}_{}", std::process::id(), id)
}

// ── Mock server ────────────────────────────────────────────────────

/// In-process RESP server.
///
/// Understands PING, ECHO, SET (with optional PX), GET, DEL, INCR and
/// SLEEP <ms> (answers after a delay). GARBLE gets a malformed frame.
/// Anything else gets an `ERR` reply.
pub struct MockRedis {
    pub addr: String,
    accepted: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
    commands: Arc<AtomicUsize>,
}

type Store = Arc<Mutex<HashMap<Bytes, Bytes>>>;

impl MockRedis {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let store: Store = Arc::default();
        let accepted = Arc::new(AtomicUsize::new(0));
        let open = Arc::new(AtomicUsize::new(0));
        let max_open = Arc::new(AtomicUsize::new(0));
        let commands = Arc::new(AtomicUsize::new(0));

        let (acc, op, max, cmds) = (
            accepted.clone(),
            open.clone(),
            max_open.clone(),
            commands.clone(),
        );
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                acc.fetch_add(1, Ordering::SeqCst);
                let now = op.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                let (store, op, cmds) = (store.clone(), op.clone(), cmds.clone());
                tokio::spawn(async move {
                    let mut pending = Vec::new();
                    let mut buf = vec![0u8; 8192];
                    'conn: loop {
                        let n = match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => n,
                        };
                        pending.extend_from_slice(&buf[..n]);
                        while let Ok((req, consumed)) = parse_slice(&pending) {
                            pending.drain(..consumed);
                            cmds.fetch_add(1, Ordering::SeqCst);
                            let args: Vec<Bytes> = req
                                .into_array()
                                .unwrap_or_default()
                                .into_iter()
                                .filter_map(Reply::into_bytes)
                                .collect();
                            let out = dispatch(&store, &args).await;
                            if socket.write_all(&out).await.is_err() {
                                break 'conn;
                            }
                        }
                    }
                    op.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            addr,
            accepted,
            open,
            max_open,
            commands,
        }
    }

    pub fn config(&self, pool_size: usize) -> ClientConfig {
        ClientConfig {
            pool_size,
            timeout_ms: 500,
            ..ClientConfig::new(Transport::Tcp, self.addr.clone())
        }
    }

    pub fn client(&self, pool_size: usize) -> Client {
        Client::new(self.config(pool_size))
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Most connections open at the same time.
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    /// Commands received so far.
    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }
}

async fn dispatch(store: &Store, args: &[Bytes]) -> Vec<u8> {
    let name = args
        .first()
        .map(|n| String::from_utf8_lossy(n).to_uppercase())
        .unwrap_or_default();
    match (name.as_str(), args.len()) {
        ("PING", 1) => b"+PONG\r\n".to_vec(),
        ("ECHO", 2) => bulk(&args[1]),
        ("SET", 3) | ("SET", 5) => {
            store.lock().insert(args[1].clone(), args[2].clone());
            b"+OK\r\n".to_vec()
        }
        ("GET", 2) => match store.lock().get(&args[1]) {
            Some(v) => bulk(v),
            None => b"$-1\r\n".to_vec(),
        },
        ("DEL", n) if n > 1 => {
            let mut map = store.lock();
            let removed = args[1..].iter().filter(|k| map.remove(*k).is_some()).count();
            format!(":{removed}\r\n").into_bytes()
        }
        ("INCR", 2) => {
            let mut map = store.lock();
            let current = map
                .get(&args[1])
                .map(|v| String::from_utf8_lossy(v).parse::<i64>());
            match current {
                Some(Err(_)) => b"-ERR value is not an integer or out of range\r\n".to_vec(),
                Some(Ok(n)) => incr(&mut map, &args[1], n),
                None => incr(&mut map, &args[1], 0),
            }
        }
        ("GARBLE", 1) => b"?x\r\n".to_vec(),
        ("SLEEP", 2) => {
            let ms = String::from_utf8_lossy(&args[1]).parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            b"+OK\r\n".to_vec()
        }
        _ => format!("-ERR unknown command '{name}'\r\n").into_bytes(),
    }
}

fn incr(map: &mut HashMap<Bytes, Bytes>, key: &Bytes, current: i64) -> Vec<u8> {
    let next = current + 1;
    map.insert(key.clone(), Bytes::from(next.to_string()));
    format!(":{next}\r\n").into_bytes()
}

fn bulk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

// ── Real redis-server ──────────────────────────────────────────────

const MAX_CONNECT_TRIES: usize = 1000;

/// A `redis-server` child process, killed on drop.
pub struct RedisServer {
    _child: Child,
    pub port: u16,
}

impl RedisServer {
    /// Start `redis-server` on a free port. `None` if the binary is missing.
    pub async fn start() -> Option<Self> {
        let port = free_port();
        let mut child = match Command::new("redis-server")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!("redis-server not found on PATH, skipping");
                return None;
            }
            Err(e) => panic!("failed to start redis-server: {e}"),
        };

        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("port {port}\nbind 127.0.0.1\nsave \"\"\n").as_bytes())
            .await
            .unwrap();
        drop(stdin);

        Some(Self {
            _child: child,
            port,
        })
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            pool_size: 10,
            timeout_ms: 100,
            ..ClientConfig::new(Transport::Tcp, self.addr())
        }
    }

    /// Build a client and wait until the server answers `PING`.
    ///
    /// Only "connection refused" is retried; any other failure panics.
    pub async fn client(&self) -> Client {
        self.client_with(self.config()).await
    }

    pub async fn client_with(&self, config: ClientConfig) -> Client {
        let client = Client::new(config);
        let mut tries = 0;
        loop {
            match client.call(&cmd!("PING")).await {
                Ok(_) => return client,
                Err(e) if e.is_connection_refused() && tries < MAX_CONNECT_TRIES => {
                    tries += 1;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                Err(e) => panic!("redis-server did not come up: {e}"),
            }
        }
    }
}

/// Start a server and a client connected to it, or `None` to skip.
pub async fn server_client() -> Option<(RedisServer, Client)> {
    let server = RedisServer::start().await?;
    let client = server.client().await;
    Some((server, client))
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
