//! Reliable ping client: sends numbered pings and reports whether each one
//! was acknowledged before its retry budget ran out.

use clap::Parser;
use reliagram::{Connection, Packet};
use reliagram_cli::{display_compact_stats, init_logging, Config};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reliagram-ping")]
#[command(about = "Reliable ping client for the reliagram transport", long_about = None)]
struct Args {
    /// Target address, e.g. an echo server
    #[arg(short, long, default_value = "127.0.0.1:4600")]
    target: String,

    /// Number of pings to send
    #[arg(short = 'n', long, default_value = "10")]
    count: u32,

    /// Retry interval in milliseconds
    #[arg(long, default_value = "250")]
    retry_interval: u64,

    /// Maximum retransmissions per ping
    #[arg(long, default_value = "5")]
    retries: u32,

    /// Application channel tag to stamp on each ping
    #[arg(long, default_value = "7")]
    channel: u8,

    /// Optional TOML configuration file (overrides the flags above)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (target, buffer_size, retry_interval, retries) = match &args.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            let target = config.endpoint.remote.unwrap_or_else(|| args.target.clone());
            (
                target,
                config.endpoint.buffer_size,
                config.retry.interval(),
                config.retry.count,
            )
        }
        None => (
            args.target.clone(),
            65536,
            Duration::from_millis(args.retry_interval),
            args.retries,
        ),
    };

    let mut conn = Connection::open(buffer_size, None, Some(&target))?;
    info!(local = %conn.local_addr(), %target, "sending {} reliable pings", args.count);

    let started = Instant::now();
    let mut acked = 0u32;
    let mut failed = 0u32;

    for n in 1..=args.count {
        let outcome = Rc::new(Cell::new(None::<bool>));

        let payload = format!("PING{n}");
        let mut record = Packet::new(42, 0, args.channel, 0, 0, payload.into_bytes())
            .make_reliable(retry_interval, retries);

        let on_ack = outcome.clone();
        record.on_ack = Some(Box::new(move |_| on_ack.set(Some(true))));
        let on_fail = outcome.clone();
        record.on_fail_to_ack = Some(Box::new(move |_| on_fail.set(Some(false))));

        let sent_at = Instant::now();
        conn.send_reliable(record, true, None)?;

        while conn.in_flight_len() > 0 {
            conn.tick()?;
        }

        match outcome.get() {
            Some(true) => {
                acked += 1;
                info!("ping {n} acked in {:?}", sent_at.elapsed());
            }
            _ => {
                failed += 1;
                info!("ping {n} never acked");
            }
        }
    }

    info!(acked, failed, "done");
    info!("{}", display_compact_stats(&conn.stats(), started.elapsed()));
    Ok(())
}
