//! Writer lifecycle for one entity's index.
//!
//! A handle has at most one open writer at any time. The writer is opened
//! lazily on the first staged mutation, stays open across the write
//! sequence, and [`WriterCell::commit`] is the only open→closed success
//! transition; [`WriterCell::abort`] rolls staged changes back and closes.
//! The mutex around the state is the serialization point for concurrent
//! write sequences against the same entity.

use std::sync::Mutex;

use syndex_core::error::{Error, Result};
use tantivy::{Index, IndexWriter};

/// Index writer heap size (50MB).
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Writer lifecycle state.
enum WriterState {
    /// No writer open; next mutation opens one.
    Closed,
    /// A writer is open and may hold staged mutations.
    Open(IndexWriter),
}

/// Mutex-guarded writer state machine for one index.
pub struct WriterCell {
    index: Index,
    state: Mutex<WriterState>,
}

impl WriterCell {
    /// Create a cell in the closed state.
    pub fn new(index: Index) -> Self {
        Self {
            index,
            state: Mutex::new(WriterState::Closed),
        }
    }

    /// Run `f` against the open writer, opening one if the cell is closed.
    ///
    /// The state lock is held for the duration of `f`, so staged mutations
    /// from concurrent callers never interleave mid-operation.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut IndexWriter) -> Result<R>) -> Result<R> {
        let mut state = self.lock_state()?;
        if let WriterState::Closed = *state {
            let writer = self
                .index
                .writer(WRITER_HEAP_BYTES)
                .map_err(|e| Error::backend(format!("failed to open index writer: {e}")))?;
            *state = WriterState::Open(writer);
        }
        match &mut *state {
            WriterState::Open(writer) => f(writer),
            WriterState::Closed => unreachable!("writer opened above"),
        }
    }

    /// Commit staged mutations and close the writer.
    ///
    /// Returns `false` when no writer was open (nothing staged). On commit
    /// failure the writer is dropped and the cell returns to closed, so a
    /// later write sequence starts from a clean writer.
    pub fn commit(&self) -> Result<bool> {
        let mut state = self.lock_state()?;
        match std::mem::replace(&mut *state, WriterState::Closed) {
            WriterState::Closed => Ok(false),
            WriterState::Open(mut writer) => {
                writer
                    .commit()
                    .map_err(|e| Error::backend(format!("failed to commit index: {e}")))?;
                Ok(true)
            }
        }
    }

    /// Roll back staged mutations and close the writer.
    pub fn abort(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        match std::mem::replace(&mut *state, WriterState::Closed) {
            WriterState::Closed => Ok(()),
            WriterState::Open(mut writer) => {
                writer
                    .rollback()
                    .map_err(|e| Error::backend(format!("failed to roll back index writer: {e}")))?;
                Ok(())
            }
        }
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, WriterState>> {
        self.state
            .lock()
            .map_err(|_| Error::backend("index writer state poisoned"))
    }
}

impl std::fmt::Debug for WriterCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self
            .state
            .lock()
            .map(|s| matches!(*s, WriterState::Open(_)))
            .unwrap_or(false);
        f.debug_struct("WriterCell").field("open", &open).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
