//! Monitor-side hand-off: fold freshly scraped results into the published
//! snapshot and write it back.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

use crate::error::StoreError;
use crate::results::{ResultRecord, Snapshot, Timestamp};
use crate::store::ResultsStore;

/// Two records with the same lottery, number and animal are the same draw.
fn identity(r: &ResultRecord) -> (&str, &str, &str) {
    (&r.lottery, r.number.as_str(), &r.animal)
}

/// Append the records of `incoming` not already in `snapshot`, returning how
/// many were added. Bumps `ultima_verificacao` and `total_resultados`.
pub fn merge_new(snapshot: &mut Snapshot, incoming: Vec<ResultRecord>) -> usize {
    let mut known: HashSet<(String, String, String)> = snapshot
        .resultados
        .iter()
        .map(|r| {
            let (l, n, a) = identity(r);
            (l.to_owned(), n.to_owned(), a.to_owned())
        })
        .collect();

    let before = snapshot.resultados.len();
    for record in incoming {
        let (l, n, a) = identity(&record);
        if known.insert((l.to_owned(), n.to_owned(), a.to_owned())) {
            snapshot.resultados.push(record);
        }
    }

    snapshot.ultima_verificacao = Some(Some(Timestamp::now()));
    snapshot.total_resultados = Some(snapshot.resultados.len() as u64);
    snapshot.resultados.len() - before
}

/// Accept either a bare array of records or a whole snapshot object.
pub fn parse_incoming(bytes: &[u8]) -> Result<Vec<ResultRecord>, StoreError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Malformed(e.to_string()))?;
    match value {
        Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| StoreError::Malformed(e.to_string()))
        }
        Value::Object(_) => Ok(Snapshot::from_value(value)?.resultados),
        other => Err(StoreError::Malformed(format!(
            "expected an array of results or a snapshot object, got {}",
            other
        ))),
    }
}

/// Read the current snapshot, merge `incoming` and publish the result if
/// anything new was found. Returns the number of new results.
pub async fn publish(store: &dyn ResultsStore, incoming: Vec<ResultRecord>) -> Result<usize> {
    let mut snapshot = store
        .get()
        .await
        .with_context(|| format!("Failed to read current snapshot from {} store", store.name()))?;

    let added = merge_new(&mut snapshot, incoming);
    if added == 0 {
        info!("No new results; {} store left untouched", store.name());
        return Ok(0);
    }

    store
        .put(snapshot)
        .await
        .with_context(|| format!("Failed to publish snapshot to {} store", store.name()))?;
    info!("{} new result(s) published to {} store", added, store.name());
    Ok(added)
}
