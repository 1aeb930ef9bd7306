//! Lazy operationId lookup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::document::ApiDocument;
use crate::error::RequestError;

/// A resolved `(path, method)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationTarget {
    pub path: String,
    /// Lowercase method key.
    pub method: String,
}

/// Memoized operationId → (path, method) index.
///
/// Misses trigger a scan of `paths` in document order. Every id seen during
/// the scan is cached; when an id is declared more than once, the first
/// declaration in document order wins. Concurrent misses may scan twice;
/// both scans produce the same entries.
#[derive(Debug, Default)]
pub struct OperationIndex {
    cache: RwLock<HashMap<String, OperationTarget>>,
    scans: AtomicUsize,
}

impl OperationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an operationId against `document`.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::OperationNotFound` if no operation declares the id.
    pub fn resolve(
        &self,
        document: &ApiDocument,
        operation_id: &str,
    ) -> Result<OperationTarget, RequestError> {
        if let Some(target) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation_id)
        {
            return Ok(target.clone());
        }

        self.scans.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(operation_id, "scanning document for operation");

        let mut seen = Vec::new();
        let mut found = None;
        for op in document.operations() {
            let Some(id) = op.operation_id() else {
                continue;
            };
            let target = OperationTarget {
                path: op.path.to_string(),
                method: op.method.to_string(),
            };
            seen.push((id.to_string(), target.clone()));
            if id == operation_id {
                found = Some(target);
                break;
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        for (id, target) in seen {
            cache.entry(id).or_insert(target);
        }

        found.ok_or_else(|| RequestError::OperationNotFound {
            operation: format!("operationId \"{}\"", operation_id),
        })
    }

    /// Number of full document scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }
}
