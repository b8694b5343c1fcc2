//! RedisStore behaviour against a misbehaving server
//!
//! A local RESP listener answers the connection handshake and then either
//! stays silent or replies with an error to every lock command. No Redis
//! server is needed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use latchkey_store::{KeyValueStore, RedisStore, StoreConfig};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

const COMMAND_TIMEOUT_MS: u64 = 200;
const LEASE: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Reply {
    /// Never answer lock commands
    Silent,
    /// Answer lock commands with `-ERR`
    Error,
}

type CommandLog = Arc<Mutex<Vec<Vec<String>>>>;

fn is_lock_command(name: &str) -> bool {
    matches!(name, "SET" | "GET" | "EVALSHA" | "EVAL")
}

async fn read_command(reader: &mut BufReader<TcpStream>) -> Option<Vec<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Some(args)
}

async fn serve(stream: TcpStream, reply: Reply, log: CommandLog) {
    let mut reader = BufReader::new(stream);
    while let Some(args) = read_command(&mut reader).await {
        let name = args.first().map(|a| a.to_uppercase()).unwrap_or_default();
        let lock_command = is_lock_command(&name);
        log.lock().unwrap().push(args);

        let response: Option<&[u8]> = match (lock_command, reply) {
            (false, _) => Some(b"+OK\r\n"),
            (true, Reply::Error) => Some(b"-ERR injected failure\r\n"),
            (true, Reply::Silent) => None,
        };
        if let Some(response) = response {
            if reader.get_mut().write_all(response).await.is_err() {
                return;
            }
        }
    }
}

async fn start_server(reply: Reply) -> (u16, CommandLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let log: CommandLog = Arc::default();

    let server_log = log.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream, reply, server_log.clone()));
        }
    });

    (port, log)
}

async fn connect(port: u16) -> RedisStore {
    let config = StoreConfig::new("127.0.0.1", port).with_timeouts(2000, COMMAND_TIMEOUT_MS);
    RedisStore::connect(&config).await.unwrap()
}

fn commands_named(log: &CommandLog, name: &str) -> Vec<Vec<String>> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|args| args.first().is_some_and(|a| a.eq_ignore_ascii_case(name)))
        .cloned()
        .collect()
}

#[tokio::test]
async fn test_silent_server_reports_failure_within_timeout() {
    let (port, _log) = start_server(Reply::Silent).await;
    let store = connect(port).await;
    let timeout = Duration::from_millis(COMMAND_TIMEOUT_MS);

    let started = Instant::now();
    assert!(store.get("job-42").await.is_none());
    let elapsed = started.elapsed();
    assert!(elapsed >= timeout, "returned before the timeout: {elapsed:?}");
    assert!(elapsed < timeout * 5, "waited {elapsed:?}");

    let started = Instant::now();
    assert!(!store.compare_and_delete("job-42", "tok-1").await);
    assert!(started.elapsed() < timeout * 5);

    // SET times out, then the cleanup delete times out as well
    let started = Instant::now();
    assert!(!store.try_set("job-42", "tok-1", LEASE).await);
    assert!(started.elapsed() < timeout * 10);
}

#[tokio::test]
async fn test_error_replies_report_failure() {
    let (port, _log) = start_server(Reply::Error).await;
    let store = connect(port).await;

    assert!(!store.try_set("job-42", "tok-1", LEASE).await);
    assert!(store.get("job-42").await.is_none());
    assert!(!store.compare_and_delete("job-42", "tok-1").await);
}

#[tokio::test]
async fn test_timed_out_set_is_followed_by_owner_checked_delete() {
    let (port, log) = start_server(Reply::Silent).await;
    let store = connect(port).await;

    assert!(!store.try_set("job-42", "tok-1", LEASE).await);

    let deadline = Instant::now() + Duration::from_secs(2);
    let cleanups = loop {
        let cleanups = commands_named(&log, "EVALSHA");
        if !cleanups.is_empty() || Instant::now() >= deadline {
            break cleanups;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };

    assert_eq!(cleanups.len(), 1);
    // EVALSHA <sha> 1 <key> <token>
    assert_eq!(&cleanups[0][2..], ["1", "job-42", "tok-1"]);
    assert_eq!(commands_named(&log, "SET").len(), 1);
}

#[tokio::test]
async fn test_rejected_set_is_not_followed_by_delete() {
    let (port, log) = start_server(Reply::Error).await;
    let store = connect(port).await;

    assert!(!store.try_set("job-42", "tok-1", LEASE).await);
    assert_eq!(commands_named(&log, "SET").len(), 1);
    assert!(commands_named(&log, "EVALSHA").is_empty());
}
