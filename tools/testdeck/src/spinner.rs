use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

pub const TICK: Duration = Duration::from_millis(250);

/// Runs `work` on the calling thread while a second thread ticks a
/// drawing callback every quarter second. The ticker is signalled and
/// joined before this returns, so the caller draws next.
pub fn with_spinner<T, F, W>(tick: F, work: W) -> T
where
    F: Fn(usize) + Send,
    W: FnOnce() -> T,
{
    let (stop, ticker) = mpsc::channel::<()>();
    std::thread::scope(|scope| {
        let handle = scope.spawn(move || {
            let mut frame = 0;
            loop {
                tick(frame);
                frame += 1;
                match ticker.recv_timeout(TICK) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        let result = work();
        let _ = stop.send(());
        let _ = handle.join();
        result
    })
}

/// The animated banner text, cycling through four dot states.
pub fn busy_banner(frame: usize) -> String {
    let dots = ".".repeat(frame % 4);
    format!("  working{:<3}  ", dots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn work_result_is_returned_and_the_ticker_runs_first() {
        let ticks = AtomicUsize::new(0);
        let result = with_spinner(
            |_frame| {
                ticks.fetch_add(1, Ordering::SeqCst);
            },
            || 42,
        );
        assert_eq!(result, 42);
        assert!(ticks.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn slow_work_accumulates_ticks() {
        let ticks = AtomicUsize::new(0);
        with_spinner(
            |_frame| {
                ticks.fetch_add(1, Ordering::SeqCst);
            },
            || std::thread::sleep(Duration::from_millis(600)),
        );
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn banner_cycles_through_four_dot_states() {
        assert_eq!(busy_banner(0), "  working     ");
        assert_eq!(busy_banner(1), "  working.    ");
        assert_eq!(busy_banner(3), "  working...  ");
        assert_eq!(busy_banner(4), "  working     ");
    }
}
