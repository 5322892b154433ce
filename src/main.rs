//! EmberCache - A Compact In-Memory Key-Value Cache
//!
//! This is the main entry point for the EmberCache server.
//! It sets up the TCP listener, the shared store, and handles incoming
//! connections.

use embercache::connection::{handle_connection, ConnectionStats};
use embercache::storage::{Store, StoreConfig};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Store tuning (memory ceiling, TTL cap, payload bounds)
    store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: embercache::DEFAULT_HOST.to_string(),
            port: embercache::DEFAULT_PORT,
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--max-memory" | "-m" => {
                    if i + 1 < args.len() {
                        config.store.memory_ceiling = parse_size(&args[i + 1]).unwrap_or_else(|| {
                            eprintln!("Error: invalid memory size (try 128M or 1G)");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --max-memory requires a value");
                        std::process::exit(1);
                    }
                }
                "--max-item-ttl" => {
                    if i + 1 < args.len() {
                        config.store.max_item_ttl = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid TTL (seconds)");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --max-item-ttl requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("EmberCache version {}", embercache::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses sizes like `512`, `64K`, `128M`, `2G` into bytes.
fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let (digits, multiplier) = match s.chars().last()? {
        'k' | 'K' => (&s[..s.len() - 1], 1024),
        'm' | 'M' => (&s[..s.len() - 1], 1024 * 1024),
        'g' | 'G' => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1),
    };
    digits.parse::<u64>().ok().map(|n| n * multiplier)
}

fn print_help() {
    println!(
        r#"
EmberCache - A Compact In-Memory Key-Value Cache

USAGE:
    embercache [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>          Port to listen on (default: 10128)
    -m, --max-memory <SIZE>    Memory ceiling, e.g. 128M or 2G (default: 128M)
        --max-item-ttl <SECS>  Cap on per-item TTL (default: 2592000)
    -v, --version              Print version information
        --help                 Print this help message

EXAMPLES:
    embercache                       # Start on 127.0.0.1:10128
    embercache --port 10200          # Start on port 10200
    embercache --max-memory 1G       # Allow up to 1 GiB of items
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
EmberCache v{} - Compact In-Memory Key-Value Cache
──────────────────────────────────────────────────
Server started on {}
Memory ceiling: {} bytes
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        embercache::VERSION,
        config.bind_address(),
        config.store.memory_ceiling,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Print the banner
    print_banner(&config);

    // Create the store (shared across all connections)
    let store = Arc::new(Mutex::new(Store::new(config.store.clone())));
    info!(
        memory_ceiling = config.store.memory_ceiling,
        max_item_ttl = config.store.max_item_ttl,
        "store initialized"
    );

    // Create connection statistics
    let stats = Arc::new(ConnectionStats::new());

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, store, stats) => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    store: Arc<Mutex<Store>>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let store = Arc::clone(&store);
                let stats = Arc::clone(&stats);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, store, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
