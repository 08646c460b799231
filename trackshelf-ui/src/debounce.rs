//! Debounced value propagation
//!
//! A [`Debouncer`] owns a source value and a derived value. Every
//! [`Debouncer::set`] restarts the quiet-period timer; the derived value is
//! only updated once the source has been stable for the whole period, so
//! values that lived shorter than the period are never observed.
//!
//! The timer runs on a background tokio task that is aborted when the
//! debouncer is dropped.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Debouncer<T> {
    source: watch::Sender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start a debouncer whose source and derived value begin at `initial`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(initial: T, quiet: Duration) -> Self {
        let (source, source_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);

        let task = tokio::spawn(run_timer(source_rx, output_tx, quiet));

        Self {
            source,
            output,
            task,
        }
    }

    /// Replace the source value, cancelling any pending emission
    pub fn set(&self, value: T) {
        self.source.send_replace(value);
    }

    /// Latest source value (may not have settled yet)
    pub fn pending(&self) -> T {
        self.source.borrow().clone()
    }

    /// Current debounced value
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    /// Receiver notified each time the debounced value changes
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_timer<T>(mut source: watch::Receiver<T>, output: watch::Sender<T>, quiet: Duration)
where
    T: Clone + PartialEq,
{
    // Outer loop: wait for the first change of a burst
    while source.changed().await.is_ok() {
        // Inner loop: every further change restarts the quiet period
        loop {
            tokio::select! {
                _ = tokio::time::sleep(quiet) => {
                    let settled = source.borrow_and_update().clone();
                    output.send_if_modified(|current| {
                        if *current == settled {
                            false
                        } else {
                            *current = settled;
                            true
                        }
                    });
                    break;
                }
                changed = source.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const QUIET: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_emits_after_quiet_period() {
        let debouncer = Debouncer::new(String::new(), QUIET);

        debouncer.set("rock".to_string());
        sleep(Duration::from_millis(499)).await;
        assert_eq!(debouncer.current(), "");

        sleep(Duration::from_millis(2)).await;
        assert_eq!(debouncer.current(), "rock");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_changes_only_emit_last_value() {
        let debouncer = Debouncer::new(String::new(), QUIET);
        let mut rx = debouncer.subscribe();

        let seen = tokio::spawn(async move {
            let mut values = Vec::new();
            while rx.changed().await.is_ok() {
                values.push(rx.borrow_and_update().clone());
            }
            values
        });

        for term in ["r", "ro", "roc", "rock"] {
            debouncer.set(term.to_string());
            sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(debouncer.current(), "");

        // 400ms more after the last change completes the quiet period
        sleep(Duration::from_millis(401)).await;
        assert_eq!(debouncer.current(), "rock");

        drop(debouncer);
        let values = seen.await.unwrap();
        assert_eq!(values, vec!["rock".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_emit_separately() {
        let debouncer = Debouncer::new(0u32, QUIET);

        debouncer.set(1);
        sleep(Duration::from_millis(600)).await;
        assert_eq!(debouncer.current(), 1);

        debouncer.set(2);
        assert_eq!(debouncer.pending(), 2);
        assert_eq!(debouncer.current(), 1);
        sleep(Duration::from_millis(600)).await;
        assert_eq!(debouncer.current(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returning_to_current_value_does_not_notify() {
        let debouncer = Debouncer::new("jazz".to_string(), QUIET);
        let rx = debouncer.subscribe();

        debouncer.set("jaz".to_string());
        sleep(Duration::from_millis(100)).await;
        debouncer.set("jazz".to_string());
        sleep(Duration::from_millis(600)).await;

        assert_eq!(debouncer.current(), "jazz");
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_timer() {
        let debouncer = Debouncer::new(String::new(), QUIET);
        let rx = debouncer.subscribe();

        debouncer.set("late".to_string());
        drop(debouncer);
        sleep(Duration::from_millis(600)).await;

        // Timer task is gone: nothing emitted and the channel is closed
        assert_eq!(*rx.borrow(), "");
        assert!(rx.has_changed().is_err());
    }
}
