use std::{future::Future, time::Duration};
use tokio::task::JoinHandle;

/// A single pending callback. Arming replaces whatever was pending.
///
/// Every arm gets a new generation, passed to the callback, so the owner can
/// recognise a callback that fired just before it was replaced.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F, Fut>(&mut self, delay: Duration, callback: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(generation).await;
        }));

        generation
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Still waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// `generation` belongs to the latest arm and was not cancelled since.
    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
