//! Single-pass regrouping of joined, parent-ordered rows into nested aggregates.
//!
//! A `parent LEFT JOIN child ORDER BY parent` query yields one row per
//! (parent, child) pair. Each row is scanned into a throwaway aggregate that
//! carries at most one child; consecutive rows with the same parent key are
//! folded into the first, and a key change flushes the finished aggregate.
//! Only the group currently being folded is held in memory.

use futures::{Stream, StreamExt};
use thiserror::Error as ThisError;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// A parent row plus its owned child collection(s).
pub trait Aggregate: Sized {
    /// Grouping key. Rows with equal keys must be adjacent in the input.
    fn key(&self) -> Uuid;

    /// Moves the children carried by `row` (one per collection, or none for
    /// an empty LEFT JOIN side) onto the end of `self`'s collections.
    fn absorb(&mut self, row: Self);
}

/// Rebuild state: the group being folded plus everything already flushed.
#[derive(Debug)]
pub struct Reconstructor<A> {
    pending: Option<A>,
    done: Vec<A>,
}

impl<A> Default for Reconstructor<A> {
    fn default() -> Self {
        Self {
            pending: None,
            done: Vec::new(),
        }
    }
}

impl<A: Aggregate> Reconstructor<A> {
    pub fn push(&mut self, row: A) {
        match self.pending.as_mut() {
            Some(pending) if pending.key() == row.key() => pending.absorb(row),
            _ => {
                if let Some(prev) = self.pending.replace(row) {
                    self.done.push(prev);
                }
            }
        }
    }

    pub fn finish(mut self) -> Vec<A> {
        if let Some(last) = self.pending.take() {
            self.done.push(last);
        }
        self.done
    }

    /// Groups known to be complete. The pending group is dropped because
    /// rows belonging to it may not have been read yet.
    fn completed(self) -> Vec<A> {
        self.done
    }
}

/// Scanning failed part-way. `items` holds the aggregates completed before
/// the failure; callers must treat the error as authoritative.
#[derive(Debug, ThisError)]
#[error("row reconstruction aborted after {} complete aggregates: {source}", .items.len())]
pub struct ReconstructError<A: std::fmt::Debug> {
    pub items: Vec<A>,
    #[source]
    pub source: StoreError,
}

impl<A: std::fmt::Debug> From<ReconstructError<A>> for StoreError {
    fn from(err: ReconstructError<A>) -> Self {
        err.source
    }
}

/// Drains `rows`, scanning each with `scan`, and returns the regrouped
/// aggregates in input order.
pub async fn reconstruct<A, R, S, F>(rows: S, mut scan: F) -> Result<Vec<A>, ReconstructError<A>>
where
    A: Aggregate + std::fmt::Debug,
    S: Stream<Item = Result<R, sqlx::Error>>,
    F: FnMut(&R) -> StoreResult<A>,
{
    let mut rows = std::pin::pin!(rows);
    let mut state = Reconstructor::default();

    while let Some(next) = rows.next().await {
        let scanned = next.map_err(StoreError::from).and_then(|row| scan(&row));
        match scanned {
            Ok(agg) => state.push(agg),
            Err(source) => {
                return Err(ReconstructError {
                    items: state.completed(),
                    source,
                });
            }
        }
    }

    Ok(state.finish())
}
