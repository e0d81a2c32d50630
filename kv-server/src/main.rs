use std::env;
use std::panic;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use kv::Engine;
use kv_server::config::ServerConfig;
use kv_server::{listener, trace};
use log::info;

#[derive(Debug, Parser, PartialEq)]
#[command(version, author, about)]
pub struct Args {
    /// Configuration file path.
    #[clap(short = 'c', long = "config", default_value = "config/kv.toml")]
    config: String,

    #[clap(long)]
    host: Option<String>,

    #[clap(long)]
    port: Option<u16>,

    #[clap(long)]
    shards: Option<usize>,

    #[clap(long)]
    cache_capacity: Option<usize>,

    #[clap(short = 'l', long)]
    log_level: Option<String>,

    /// Suppress the startup banner.
    #[clap(short = 'q', long)]
    quiet: bool,
}

#[tokio::main]
pub async fn main() -> Result<()> {
    setup_panic_hooks();

    let args = Args::parse();

    if !args.quiet {
        eprintln!();
        eprintln!("██  ██  █        █");
        eprintln!("██ ██   ██      ██");
        eprintln!("███      ██    ██");
        eprintln!("██ ██     ██  ██");
        eprintln!("██  ██     ████  KV Server");
        eprintln!();
    }

    let mut cfg = ServerConfig::load_file(&args.config).unwrap_or_default();
    cfg.apply_env();
    if let Some(host) = args.host {
        cfg.host = host;
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    if let Some(shards) = args.shards {
        cfg.shards = shards;
    }
    if args.cache_capacity.is_some() {
        cfg.cache_capacity = args.cache_capacity;
    }
    if let Some(log_level) = args.log_level {
        cfg.log_level = log_level;
    }

    let log_dir = format!("{}/.kv-server", env::var("HOME").unwrap_or_else(|_| ".".to_string()));
    let _guards = trace::init_logging(&log_dir, &cfg.log_level).await?;
    info!("kv-server starting with config: {:?}", &cfg);

    let engine = match cfg.cache_capacity {
        Some(capacity) if capacity > 0 => {
            Arc::new(Engine::with_cache(cfg.shards, Arc::new(kv::LruCache::new(capacity))))
        }
        _ => Arc::new(Engine::new(cfg.shards)),
    };

    listener::run(&cfg.bind_addr(), engine).await
}

fn setup_panic_hooks() {
    let meta = human_panic::Metadata {
        version: env!("CARGO_PKG_VERSION").into(),
        name: env!("CARGO_PKG_NAME").into(),
        authors: env!("CARGO_PKG_AUTHORS").replace(':', ", ").into(),
        homepage: env!("CARGO_PKG_HOMEPAGE").into(),
    };

    let default_hook = panic::take_hook();

    if env::var("RUST_BACKTRACE").is_err() {
        panic::set_hook(Box::new(move |info: &panic::PanicHookInfo| {
            default_hook(info);
            let file_path = human_panic::handle_dump(&meta, info);
            human_panic::print_msg(file_path, &meta)
                .expect("human-panic: printing error message to console failed");
        }));
    }
}
