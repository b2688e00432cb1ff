//! Statistics display and formatting.

use reliagram::ConnectionStats;
use std::time::Duration;

/// Format bytes in human-readable form.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a packet rate in human-readable form.
pub fn format_rate(packets: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return "0.0 pkt/s".to_string();
    }
    format!("{:.1} pkt/s", packets as f64 / secs)
}

/// Format a duration in human-readable form.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// One-line summary of connection statistics.
pub fn display_compact_stats(stats: &ConnectionStats, elapsed: Duration) -> String {
    format!(
        "tx {} pkts / {} | rx {} pkts / {} | retrans {} | acked {} | failed {} | {}",
        stats.packets_sent,
        format_bytes(stats.bytes_sent),
        stats.packets_received,
        format_bytes(stats.bytes_received),
        stats.retransmissions,
        stats.reliable_acked,
        stats.reliable_exhausted,
        format_rate(stats.packets_sent + stats.packets_received, elapsed),
    )
}
