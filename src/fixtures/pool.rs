use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use super::FixtureKind;
use crate::error::FixtureError;

/// What a pool does once its private copy runs dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExhausted {
    /// Report [`FixtureError::Exhausted`] on every further `pop()`.
    Stop,
    /// Refill with a fresh permutation of the master list.
    Recycle,
}

/// A virtual user's private, shuffled copy of one master fixture list.
///
/// The master list is shared read-only between users; every pool owns its
/// own `Vec`, so users never contend on or alias each other's data.
#[derive(Debug)]
pub struct FixturePool<T> {
    kind: FixtureKind,
    master: Arc<[T]>,
    items: Vec<T>,
    on_exhausted: OnExhausted,
    refills: usize,
}

impl<T: Clone> FixturePool<T> {
    /// Copy and shuffle `master` with the thread-local RNG.
    pub fn new(kind: FixtureKind, master: Arc<[T]>, on_exhausted: OnExhausted) -> Self {
        Self::with_rng(kind, master, on_exhausted, &mut rand::thread_rng())
    }

    /// Copy and shuffle `master` with a caller-supplied RNG.
    pub fn with_rng<R: Rng + ?Sized>(
        kind: FixtureKind,
        master: Arc<[T]>,
        on_exhausted: OnExhausted,
        rng: &mut R,
    ) -> Self {
        let mut items = master.to_vec();
        items.shuffle(rng);
        Self {
            kind,
            master,
            items,
            on_exhausted,
            refills: 0,
        }
    }

    /// Take the next item, consuming it.
    pub fn pop(&mut self) -> Result<T, FixtureError> {
        if let Some(item) = self.items.pop() {
            return Ok(item);
        }
        match self.on_exhausted {
            OnExhausted::Stop => Err(FixtureError::Exhausted(self.kind)),
            OnExhausted::Recycle => {
                if self.master.is_empty() {
                    return Err(FixtureError::Exhausted(self.kind));
                }
                self.items = self.master.to_vec();
                self.items.shuffle(&mut rand::thread_rng());
                self.refills += 1;
                tracing::debug!(kind = %self.kind, refills = self.refills, "fixture pool recycled");
                self.items.pop().ok_or(FixtureError::Exhausted(self.kind))
            }
        }
    }

    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    /// Items left before the pool is exhausted (or recycled).
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    /// How many times the pool has been refilled from the master list.
    pub fn refills(&self) -> usize {
        self.refills
    }

    /// Remaining items in pop order reversed (the next `pop()` is the last).
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}
