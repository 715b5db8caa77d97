use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Holds the latest value and publishes it once it has stopped changing for
/// `delay`. Every `set` restarts the timer, so intermediate values are never
/// published.
pub struct Debouncer<T> {
    raw: watch::Sender<T>,
    settled: Arc<watch::Sender<T>>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

fn publish<T: PartialEq>(settled: &watch::Sender<T>, value: T) -> bool {
    settled.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    })
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (raw, _) = watch::channel(initial.clone());
        let (settled, _) = watch::channel(initial);
        Self {
            raw,
            settled: Arc::new(settled),
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Must be called from within a Tokio runtime.
    pub fn set(&self, value: T) {
        self.raw.send_replace(value.clone());

        let settled = self.settled.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            publish(&settled, value);
        });
        self.replace_pending(Some(task));
    }

    /// Publishes the latest value now, skipping the remaining delay.
    pub fn flush(&self) -> bool {
        self.replace_pending(None);
        publish(&self.settled, self.value())
    }

    fn replace_pending(&self, task: Option<JoinHandle<()>>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = std::mem::replace(&mut *pending, task) {
            previous.abort();
        }
    }

    /// Latest value, settled or not.
    pub fn value(&self) -> T {
        self.raw.borrow().clone()
    }

    pub fn settled(&self) -> T {
        self.settled.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.subscribe()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}
