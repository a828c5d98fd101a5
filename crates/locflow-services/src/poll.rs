//! Fixed-cadence wait loop for remote job completion.
//!
//! Ticks are aligned to the original start instant, so a slow first check or
//! a slow tick shifts nothing: the next check still lands on the next
//! wall-clock boundary. Per-tick check errors count as "not complete yet";
//! only the final completed/timed-out decision is ever reported.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use locflow_core::Result;
use locflow_domain::PollOutcome;

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub tick: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            tick: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Repeatedly run `check` until it reports completion or the deadline
/// elapses. One check runs immediately; afterwards checks run on
/// `tick`-aligned boundaries measured from the start instant. Ticks are
/// strictly sequential: the next tick is not armed until the previous check
/// has settled.
pub async fn wait_until<F, Fut>(opts: &PollOptions, mut check: F) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();

    // The work is often already done by the time polling begins.
    if check_once(&mut check).await {
        return PollOutcome::Completed;
    }

    loop {
        let delay = aligned_delay(start.elapsed(), opts.tick);
        tokio::time::sleep(delay).await;

        if check_once(&mut check).await {
            return PollOutcome::Completed;
        }
        if start.elapsed() >= opts.timeout {
            return PollOutcome::TimedOut;
        }
    }
}

/// `tick - (elapsed mod tick)`: the remaining time until the next boundary
/// relative to the start instant. A full tick when already on a boundary.
fn aligned_delay(elapsed: Duration, tick: Duration) -> Duration {
    let tick_ms = tick.as_millis().max(1) as u64;
    let elapsed_ms = elapsed.as_millis() as u64;
    Duration::from_millis(tick_ms - (elapsed_ms % tick_ms))
}

async fn check_once<F, Fut>(check: &mut F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    match check().await {
        Ok(done) => done,
        Err(err) => {
            // Transient poll failures must not kill an otherwise-successful
            // wait; the deadline still bounds the whole operation.
            debug!("poll check failed, treating as incomplete: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn opts(tick_ms: u64, timeout_ms: u64) -> PollOptions {
        PollOptions {
            tick: Duration::from_millis(tick_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_only_after_the_reporting_tick() {
        let calls = Cell::new(0u32);
        let start = Instant::now();
        let outcome = wait_until(&opts(5000, 60_000), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Ok(n >= 3) }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Completed);
        // Immediate check + ticks at 5s and 10s.
        assert_eq!(calls.get(), 3);
        assert!(start.elapsed() >= Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_and_stops_ticking() {
        let calls = Cell::new(0u32);
        let outcome = wait_until(&opts(5000, 12_000), || {
            calls.set(calls.get() + 1);
            async { Ok(false) }
        })
        .await;
        assert_eq!(outcome, PollOutcome::TimedOut);
        // Immediate check + ticks at 5s, 10s and 15s; 15s >= 12s deadline.
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_stay_aligned_when_a_check_is_slow() {
        let start = Instant::now();
        let seen = RefCell::new(Vec::new());
        let outcome = wait_until(&opts(5000, 60_000), || {
            let at = start.elapsed().as_millis() as u64;
            seen.borrow_mut().push(at);
            let first = at == 0;
            async move {
                if first {
                    // A slow initial check must not shift later boundaries.
                    tokio::time::sleep(Duration::from_millis(1200)).await;
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Completed);
        assert_eq!(*seen.borrow(), vec![0, 5000]);
    }

    #[tokio::test(start_paused = true)]
    async fn check_errors_are_not_terminal() {
        let calls = Cell::new(0u32);
        let outcome = wait_until(&opts(1000, 30_000), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n == 1 {
                    Err(color_eyre::eyre::eyre!("connection reset"))
                } else {
                    Ok(n >= 2)
                }
            }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Completed);
        assert_eq!(calls.get(), 2);
    }
}
