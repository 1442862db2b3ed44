use log::info;
use rand::Rng;
use std::thread;
use std::time::Duration;

/// Constant-range courtesy pause between durability flushes. Not an adaptive
/// rate limiter; the upstream service is rate-sensitive and serial requests
/// with a short pause are the whole policy.
pub fn batch_pause(min_secs: u64, max_secs: u64) {
    let delay_secs = if max_secs > min_secs {
        rand::thread_rng().gen_range(min_secs..=max_secs)
    } else {
        min_secs
    };
    if delay_secs == 0 {
        return;
    }
    info!("Waiting for {} seconds (Batch Pause)...", delay_secs);
    thread::sleep(Duration::from_secs(delay_secs));
}
