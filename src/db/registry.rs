//! Fixed-capacity handle tables.
//!
//! A handle is the index of a slot. Each slot owns its connection behind a
//! per-slot lock; the table lock only guards slot occupancy. Releasing a
//! handle empties the slot and takes the connection out of its cell, so a
//! caller still holding the old cell sees an empty connection and reports
//! `InvalidHandle` instead of touching a closed native object.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::{BackendKind, DbError};

/// Integer capability naming an open connection of one backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(i64);

impl Handle {
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned by [`HandleRegistry::store`] when no slot is free.
///
/// Gives the connection back so the caller can close it.
pub struct RegistryFull<C> {
    pub capacity: usize,
    pub connection: C,
}

type Cell<C> = Arc<Mutex<Option<C>>>;

/// Handle table for one backend kind.
pub struct HandleRegistry<C> {
    kind: BackendKind,
    slots: Mutex<Vec<Option<Cell<C>>>>,
}

impl<C> HandleRegistry<C> {
    pub fn new(kind: BackendKind, capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| None).collect();
        Self {
            kind,
            slots: Mutex::new(slots),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a connection in the lowest free slot.
    pub fn store(&self, connection: C) -> Result<Handle, RegistryFull<C>> {
        let mut slots = self.slots.lock();
        match slots.iter().position(Option::is_none) {
            Some(index) => {
                slots[index] = Some(Arc::new(Mutex::new(Some(connection))));
                debug!(kind = %self.kind, handle = index, "stored connection");
                Ok(Handle(index as i64))
            }
            None => Err(RegistryFull {
                capacity: slots.len(),
                connection,
            }),
        }
    }

    /// Whether `handle` currently names a live connection.
    pub fn contains(&self, handle: Handle) -> bool {
        match self.cell(handle) {
            Ok(cell) => cell.lock().is_some(),
            Err(_) => false,
        }
    }

    /// Run `f` against the connection behind `handle`.
    ///
    /// The table lock is released before `f` runs; only the slot's own lock
    /// is held for the duration of the call.
    pub fn with_connection<T>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut C) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let cell = self.cell(handle)?;
        let mut guard = cell.lock();
        match guard.as_mut() {
            Some(connection) => f(connection),
            None => Err(self.invalid(handle)),
        }
    }

    /// Release `handle`, returning its connection if the slot was occupied.
    ///
    /// Removing an empty slot is a no-op. Out-of-range handles are rejected.
    pub fn remove(&self, handle: Handle) -> Result<Option<C>, DbError> {
        let index = self.index(handle)?;
        let cell = self.slots.lock()[index].take();
        let connection = match cell {
            Some(cell) => {
                let mut guard = cell.lock();
                guard.take()
            }
            None => None,
        };
        if connection.is_some() {
            debug!(kind = %self.kind, handle = index, "released handle");
        }
        Ok(connection)
    }

    fn cell(&self, handle: Handle) -> Result<Cell<C>, DbError> {
        let index = self.index(handle)?;
        self.slots.lock()[index]
            .clone()
            .ok_or_else(|| self.invalid(handle))
    }

    fn index(&self, handle: Handle) -> Result<usize, DbError> {
        let capacity = self.slots.lock().len();
        usize::try_from(handle.0)
            .ok()
            .filter(|&i| i < capacity)
            .ok_or_else(|| self.invalid(handle))
    }

    fn invalid(&self, handle: Handle) -> DbError {
        DbError::InvalidHandle {
            kind: self.kind,
            handle: handle.0,
        }
    }
}
