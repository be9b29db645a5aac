use std::future::Future;
use std::time::Instant;

use tracing::{debug, field, warn};
use uuid::Uuid;

use crate::cid::Cid;
use crate::error::StoreResult;

/// Runs one accessor body, logging start/finish with elapsed time and
/// labelling any driver error with `method` and `cid`.
pub async fn observe<T, F>(method: &'static str, id: Option<Uuid>, cid: &Cid, body: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    let started = Instant::now();
    debug!(method, id = id.map(field::display), %cid, "starting work");

    let result = body.await.map_err(|err| err.in_context(method, cid));

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => debug!(method, %cid, elapsed_ms, "finished work"),
        Err(err) => warn!(method, id = id.map(field::display), %cid, elapsed_ms, error = %err, "finished work"),
    }
    result
}
