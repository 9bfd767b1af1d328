use parking_lot::Mutex;
use std::sync::Arc;

/// Optional capture of every statement sent to the database, in order.
/// Disabled until [QueryLog::enable] is called.
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    inner: Arc<Mutex<Option<Vec<String>>>>,
}

impl QueryLog {
    pub fn enable(&self) {
        let mut inner = self.inner.lock();

        if inner.is_none() {
            *inner = Some(Vec::new());
        }
    }

    pub fn disable(&self) {
        *self.inner.lock() = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// The statements captured so far. Empty when disabled.
    pub fn entries(&self) -> Vec<String> {
        self.inner.lock().clone().unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Some(entries) = self.inner.lock().as_mut() {
            entries.clear();
        }
    }

    pub(crate) fn record(&self, sql: &str) {
        tracing::debug!(target: "sql_query_connector::query", query = %sql);

        if let Some(entries) = self.inner.lock().as_mut() {
            entries.push(sql.to_owned());
        }
    }
}
