use std::sync::{Arc, RwLock};

/// Creates a single-writer, many-reader cell holding the latest value of a
/// piece of node state (position, dynamics, assigned route).
///
/// The writer is not cloneable, so the single-writer discipline is enforced
/// by ownership: only the worker holding the [StateWriter] can mutate, and
/// every update replaces the whole value. Readers take snapshots and can
/// never observe a torn update.
pub fn state_cell<T: Clone>(initial: T) -> (StateWriter<T>, StateReader<T>) {
    let inner = Arc::new(RwLock::new(initial));
    let reader = StateReader {
        inner: Arc::clone(&inner),
    };
    (StateWriter { inner }, reader)
}

#[derive(Debug)]
pub struct StateWriter<T> {
    inner: Arc<RwLock<T>>,
}

impl<T: Clone> StateWriter<T> {
    /// Replaces the stored value atomically.
    pub fn store(&self, value: T) {
        match self.inner.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    pub fn reader(&self) -> StateReader<T> {
        StateReader {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Reads back the last stored value, for read-modify-write by the owner.
    pub fn load(&self) -> T {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[derive(Debug)]
pub struct StateReader<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Clone for StateReader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> StateReader<T> {
    pub fn snapshot(&self) -> T {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
