use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

const SLICE: Duration = Duration::from_millis(100);

/// Pause between requests to the same group of sites.
pub fn source_delay(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    debug!("Waiting {} ms (Source Delay)...", delay.as_millis());
    thread::sleep(delay);
}

/// Pause between rows. Sleeps in short slices and returns early once
/// `interrupt` is raised. Returns `true` if the full delay elapsed.
pub fn row_delay(delay: Duration, interrupt: &AtomicBool) -> bool {
    if delay.is_zero() {
        return !interrupt.load(Ordering::SeqCst);
    }
    debug!("Waiting {} ms (Row Delay)...", delay.as_millis());
    let started = Instant::now();
    loop {
        if interrupt.load(Ordering::SeqCst) {
            return false;
        }
        let elapsed = started.elapsed();
        if elapsed >= delay {
            return true;
        }
        thread::sleep(SLICE.min(delay - elapsed));
    }
}
