//! Non-fatal diagnostics: unrecognized attribute values and purge failures
//! must not fail the caller's `log`, but an operator still needs to see
//! them. Routed through a caller-supplied sink, defaulting to `tracing`.

use std::sync::Arc;

/// A sink for warnings that do not abort the operation that produced them.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self { sink: None }
    }
}

impl Diagnostics {
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    pub fn warn(&self, message: &str) {
        match &self.sink {
            Some(sink) => sink(message),
            None => tracing::warn!(target: "rotaling", "{}", message),
        }
    }
}
