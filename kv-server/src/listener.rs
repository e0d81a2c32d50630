use std::sync::Arc;

use kv::Engine;
use log::{error, info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::protocol::{parse_line, response, Command};

/// Binds `addr` and spawns one task per accepted connection, each sharing
/// `engine`. Runs until a Ctrl-C/SIGINT arrives or a fatal bind error occurs;
/// a failed individual `accept` is logged and does not stop the loop.
pub async fn run(addr: &str, engine: Arc<Engine>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("kv-server listening on {}", addr);

    let mut shutdown = Box::pin(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let engine = Arc::clone(&engine);
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, engine).await {
                                warn!("connection {} ended with error: {}", peer, err);
                            }
                        });
                    }
                    Err(err) => error!("failed to accept connection: {}", err),
                }
            }
            _ = &mut shutdown => {
                info!("received shutdown signal, stopping listener");
                return Ok(());
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, engine: Arc<Engine>) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let response = dispatch_line(&line, &engine);
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        write_half.write_all(&payload).await?;
    }
    Ok(())
}

fn dispatch_line(line: &str, engine: &Engine) -> Value {
    match parse_line(line) {
        Ok(command) => dispatch(command, engine),
        Err(err) => response::error(err.0),
    }
}

fn dispatch(command: Command, engine: &Engine) -> Value {
    match command {
        Command::Begin => response::ok_begin(engine.begin()),
        Command::Put { key, value, tid } => match tid {
            None => response::error("Invalid transaction ID None"),
            Some(tid) => match engine.put(&key, value, tid) {
                Ok(()) => response::ok_put(),
                Err(err) => response::error(err.to_string()),
            },
        },
        Command::Get { key, tid } => match tid {
            None => response::error("Invalid transaction ID None"),
            Some(tid) => match engine.get(&key, tid) {
                Ok(value) => response::ok_get(value),
                Err(err) => response::error(err.to_string()),
            },
        },
        Command::Del { key, tid } => match tid {
            None => response::error("Invalid transaction ID None"),
            Some(tid) => match engine.delete(&key, tid) {
                Ok(()) => response::ok_del(),
                Err(err) => response::error(err.to_string()),
            },
        },
        Command::Commit { tid } => {
            engine.commit(tid);
            response::ok_commit()
        }
        Command::Rollback { tid } => {
            engine.rollback(tid);
            response::ok_rollback()
        }
        Command::CommitAll => {
            engine.commit_all();
            response::ok_commit_all()
        }
        Command::ShowAll => response::ok_show_all(engine.show_all()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kv::router::DEFAULT_SHARD_COUNT;
    use serde_json::json;

    #[test]
    fn malformed_line_never_panics_and_yields_error_response() {
        let engine = Engine::new(DEFAULT_SHARD_COUNT);
        let response = dispatch_line("", &engine);
        assert_eq!(response["status"], "Error");
    }

    #[test]
    fn put_without_tid_is_reported_as_error_not_panic() {
        let engine = Engine::new(DEFAULT_SHARD_COUNT);
        let response = dispatch_line("PUT k1 v1", &engine);
        assert_eq!(response, json!({"status": "Error", "mesg": "Invalid transaction ID None"}));
    }

    #[test]
    fn full_roundtrip_through_dispatch() {
        let engine = Engine::new(DEFAULT_SHARD_COUNT);
        let begin = dispatch_line("BEGIN", &engine);
        let tid = begin["transaction_id"].as_u64().unwrap();

        let put = dispatch_line(&format!("PUT k1 v1 {tid}"), &engine);
        assert_eq!(put, json!({"status": "Ok"}));

        let commit = dispatch_line(&format!("COMMIT {tid}"), &engine);
        assert_eq!(commit, json!({"status": "Ok"}));

        let begin2 = dispatch_line("BEGIN", &engine);
        let tid2 = begin2["transaction_id"].as_u64().unwrap();
        let get = dispatch_line(&format!("GET k1 {tid2}"), &engine);
        assert_eq!(get, json!({"status": "Ok", "result": "v1"}));
    }

    #[test]
    fn unknown_transaction_reports_documented_message() {
        let engine = Engine::new(DEFAULT_SHARD_COUNT);
        let response = dispatch_line("GET k1 999", &engine);
        assert_eq!(response, json!({"status": "Error", "mesg": "Invalid transaction ID 999"}));
    }
}
