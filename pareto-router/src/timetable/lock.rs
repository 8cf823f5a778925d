//! Read/write lock guarding the shared timetable.
//!
//! Any number of readers may hold the lock while no writer is queued.
//! Writers are served one at a time in arrival order and take priority
//! over readers that arrive after them. An active reader is never
//! preempted: a queued writer waits until all current readers finish.

use std::ops::{Deref, DerefMut};

use parking_lot::{Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Gate {
    readers: usize,
    /// Next writer ticket to hand out.
    next_ticket: u64,
    /// Ticket of the writer currently served (active or next to run).
    serving: u64,
}

impl Gate {
    fn writers_queued(&self) -> u64 {
        self.next_ticket - self.serving
    }
}

/// A writer-priority FIFO lock.
#[derive(Debug, Default)]
pub struct ScheduleLock<T> {
    gate: Mutex<Gate>,
    changed: Condvar,
    data: RwLock<T>,
}

impl<T> ScheduleLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            gate: Mutex::new(Gate::default()),
            changed: Condvar::new(),
            data: RwLock::new(value),
        }
    }

    /// Blocks until no writer is active or queued, then enters a read scope.
    pub fn read(&self) -> ReadScope<'_, T> {
        let mut gate = self.gate.lock();
        while gate.writers_queued() > 0 {
            self.changed.wait(&mut gate);
        }
        gate.readers += 1;
        drop(gate);

        let permit = ReaderPermit { lock: self };
        ReadScope {
            guard: self.data.read(),
            _permit: permit,
        }
    }

    /// Queues behind earlier writers, waits for active readers to leave,
    /// then enters an exclusive scope.
    pub fn write(&self) -> WriteScope<'_, T> {
        let mut gate = self.gate.lock();
        let ticket = gate.next_ticket;
        gate.next_ticket += 1;
        while gate.serving != ticket || gate.readers > 0 {
            self.changed.wait(&mut gate);
        }
        drop(gate);

        let permit = WriterPermit { lock: self };
        WriteScope {
            guard: self.data.write(),
            _permit: permit,
        }
    }

    /// Number of writers active or waiting.
    pub fn queued_writers(&self) -> u64 {
        self.gate.lock().writers_queued()
    }

    /// Number of readers inside a read scope.
    pub fn active_readers(&self) -> usize {
        self.gate.lock().readers
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

struct ReaderPermit<'a, T> {
    lock: &'a ScheduleLock<T>,
}

impl<T> Drop for ReaderPermit<'_, T> {
    fn drop(&mut self) {
        let mut gate = self.lock.gate.lock();
        gate.readers -= 1;
        if gate.readers == 0 {
            self.lock.changed.notify_all();
        }
    }
}

struct WriterPermit<'a, T> {
    lock: &'a ScheduleLock<T>,
}

impl<T> Drop for WriterPermit<'_, T> {
    fn drop(&mut self) {
        let mut gate = self.lock.gate.lock();
        gate.serving += 1;
        self.lock.changed.notify_all();
    }
}

/// Shared access to the guarded value.
pub struct ReadScope<'a, T> {
    // Field order matters: the data guard is released before the permit.
    guard: RwLockReadGuard<'a, T>,
    _permit: ReaderPermit<'a, T>,
}

impl<T> Deref for ReadScope<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

/// Exclusive access to the guarded value.
pub struct WriteScope<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    _permit: WriterPermit<'a, T>,
}

impl<T> Deref for WriteScope<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for WriteScope<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn wait_for_writers(lock: &ScheduleLock<Vec<u32>>, n: u64) {
        while lock.queued_writers() != n {
            thread::yield_now();
        }
    }

    #[test]
    fn readers_share_access() {
        let lock = ScheduleLock::new(5);
        let a = lock.read();
        let b = lock.read();
        assert_eq!(*a + *b, 10);
        assert_eq!(lock.active_readers(), 2);
        drop(a);
        drop(b);
        assert_eq!(lock.active_readers(), 0);

        *lock.write() = 7;
        assert_eq!(*lock.read(), 7);
        assert_eq!(lock.queued_writers(), 0);
    }

    #[test]
    fn queued_writer_goes_before_later_reader() {
        let lock = Arc::new(ScheduleLock::new(Vec::new()));
        let first = lock.read();

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.write().push(1))
        };
        wait_for_writers(&lock, 1);

        let reader = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.read().clone())
        };

        // The active reader is not preempted.
        assert!(first.is_empty());
        drop(first);

        writer.join().unwrap();
        assert_eq!(reader.join().unwrap(), vec![1]);
    }

    #[test]
    fn writers_are_served_in_arrival_order() {
        let lock = Arc::new(ScheduleLock::new(Vec::new()));
        let reader = lock.read();

        let mut handles = Vec::new();
        for id in 1..=3 {
            let l = Arc::clone(&lock);
            handles.push(thread::spawn(move || l.write().push(id)));
            wait_for_writers(&lock, u64::from(id));
        }
        drop(reader);

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.read(), vec![1, 2, 3]);
    }

    #[test]
    fn into_inner_returns_value() {
        let lock = ScheduleLock::new(String::from("tt"));
        lock.write().push('!');
        assert_eq!(lock.into_inner(), "tt!");
    }
}
