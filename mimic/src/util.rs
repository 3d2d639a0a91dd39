//! Utilities.
use chrono::Local;
use rand::Rng;

/// Timestamp like `20240131_235959_1a2b3c`, unique even for runs started in the same second.
pub fn make_unique_timestamp() -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0..1 << 24);
    format!("{}_{:06x}", timestamp, suffix)
}
