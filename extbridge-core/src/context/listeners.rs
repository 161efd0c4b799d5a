//! Ordered listener lists with removable handles

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle returned when a listener is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct ListenerRegistry<T: ?Sized> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Arc<T>)>>,
}

impl<T: ?Sized> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, listener: Arc<T>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    pub fn has(&self, id: ListenerId) -> bool {
        self.lock().iter().any(|(entry, _)| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listeners in registration order.
    ///
    /// Taken as a copy so a listener may add or remove listeners while running.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.lock().iter().map(|(_, listener)| listener.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Arc<T>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
