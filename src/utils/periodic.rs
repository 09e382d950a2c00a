use crate::error::Result;
use log::{error, info};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A background thread that runs a job, waits `interval`, and repeats until
/// stopped. The job runs once immediately on spawn.
///
/// Stopping is deterministic: `stop()` (or dropping the task) wakes the
/// sleeping thread and joins it. A job already in progress is allowed to
/// finish first.
pub struct PeriodicTask {
    name: String,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F>(name: &str, interval: Duration, job: F) -> Result<PeriodicTask>
    where
        F: FnMut() + Send + 'static,
    {
        PeriodicTask::spawn_after(name, Duration::ZERO, interval, job)
    }

    /// Like `spawn`, but the first run happens after `initial_delay`.
    pub fn spawn_after<F>(
        name: &str,
        initial_delay: Duration,
        interval: Duration,
        mut job: F,
    ) -> Result<PeriodicTask>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                if !initial_delay.is_zero() && !wait_for_tick(&stop_rx, initial_delay) {
                    info!("Periodic task '{thread_name}' stopped");
                    return;
                }
                loop {
                    job();
                    if !wait_for_tick(&stop_rx, interval) {
                        info!("Periodic task '{thread_name}' stopped");
                        break;
                    }
                }
            })?;

        Ok(PeriodicTask {
            name: name.to_string(),
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Periodic task '{}' panicked", self.name);
            }
        }
    }
}

/// Sleeps for `interval` unless stopped first. Returns false on a stop signal
/// or when every sender is gone.
fn wait_for_tick(stop_rx: &Receiver<()>, interval: Duration) -> bool {
    matches!(stop_rx.recv_timeout(interval), Err(RecvTimeoutError::Timeout))
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_runs_immediately_and_repeats() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task = PeriodicTask::spawn("counter", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        task.stop();
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_halts_further_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task = PeriodicTask::spawn("halt", Duration::from_secs(3600), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(task.name(), "halt");

        // the long interval must not delay shutdown
        thread::sleep(Duration::from_millis(50));
        task.stop();
        let after_stop = runs.load(Ordering::SeqCst);
        assert_eq!(after_stop, 1);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_initial_delay_defers_first_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task = PeriodicTask::spawn_after(
            "deferred",
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(30));
        task.stop();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_stops_task() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        {
            let _task = PeriodicTask::spawn("dropped", Duration::from_millis(5), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            thread::sleep(Duration::from_millis(30));
        }
        let after_drop = runs.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(runs.load(Ordering::SeqCst), after_drop);
    }
}
