use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ordered, thread-safe collection of annotation handles.
///
/// Insertion order is draw order. The registry only owns membership: callers
/// keep their own `Arc` and the graphic lives as long as any holder does.
/// Removal matches by pointer identity, so the same handle may be added twice.
pub struct GraphicRegistry<G: ?Sized> {
    items: Mutex<Vec<Arc<G>>>,
}

impl<G: ?Sized> Default for GraphicRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: ?Sized> GraphicRegistry<G> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    fn items(&self) -> MutexGuard<'_, Vec<Arc<G>>> {
        // A panicking holder cannot leave the Vec half-updated
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, handle: Arc<G>) {
        self.items().push(handle);
    }

    /// Removes the first occurrence of `handle`. Returns false if absent.
    pub fn remove(&self, handle: &Arc<G>) -> bool {
        let mut items = self.items();
        match items
            .iter()
            .position(|h| std::ptr::addr_eq(Arc::as_ptr(h), Arc::as_ptr(handle)))
        {
            Some(idx) => {
                items.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.items().clear();
    }

    /// Copy of the current draw order.
    ///
    /// The lock is held only for the copy, so slow draw callbacks never
    /// block producers calling `add`/`remove`/`clear`.
    pub fn snapshot(&self) -> Vec<Arc<G>> {
        self.items().clone()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}
