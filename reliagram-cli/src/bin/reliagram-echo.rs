//! Echo server: reflects every received payload back to its source.

use clap::Parser;
use reliagram::io::Timer;
use reliagram::{Connection, Packet};
use reliagram_cli::{display_compact_stats, init_logging, Config};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "reliagram-echo")]
#[command(about = "Echo server for the reliagram transport", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:4600")]
    bind: String,

    /// Read buffer and kernel buffer size in bytes
    #[arg(long, default_value = "65536")]
    buffer_size: usize,

    /// Optional TOML configuration file (overrides the flags above)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Statistics interval in seconds, 0 to disable
    #[arg(long, default_value = "5")]
    stats: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (bind, buffer_size) = match &args.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            (config.endpoint.bind, config.endpoint.buffer_size)
        }
        None => (args.bind.clone(), args.buffer_size),
    };

    let mut conn = Connection::open(buffer_size, Some(&bind), None)?;
    conn.set_read_deadline(Some(Duration::from_millis(100)))?;
    info!(addr = %conn.local_addr(), "echo server listening");

    let started = Instant::now();
    let mut stats_timer = Timer::new(Duration::from_secs(args.stats.max(1)));

    loop {
        match conn.read() {
            Ok(packet) => {
                let mut reply = Packet::new(
                    packet.client_id,
                    0,
                    packet.channel,
                    0,
                    0,
                    packet.payload.clone(),
                );
                if let Err(err) = conn.send(&mut reply, true, packet.remote_address) {
                    warn!(%err, "failed to echo packet");
                }
            }
            Err(err) if err.is_timeout() => {}
            Err(err) => warn!(%err, "read failed"),
        }

        if args.stats > 0 && stats_timer.try_fire() {
            info!("{}", display_compact_stats(&conn.stats(), started.elapsed()));
        }
    }
}
