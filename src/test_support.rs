//! Shared fixtures for unit tests.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::context::ContextStore;
use crate::sink::{RecordingSink, SubmissionSink};

/// A recording sink both as the trait object screens take and as the
/// concrete handle tests inspect.
pub fn recording_pair() -> (Arc<dyn SubmissionSink>, Arc<RecordingSink>) {
    let recorder = Arc::new(RecordingSink::new());
    (recorder.clone() as Arc<dyn SubmissionSink>, recorder)
}

/// A store holding a minimal context for `screen_name` with the given
/// transaction state.
pub fn store_with_screen(screen_name: &str, state: &str) -> ContextStore {
    store_with_context(json!({
        "screen": { "name": screen_name },
        "transaction": { "state": state }
    }))
}

/// Same, with a `screen.data` block.
pub fn store_with_screen_data(screen_name: &str, state: &str, data: Value) -> ContextStore {
    store_with_context(json!({
        "screen": { "name": screen_name, "data": data },
        "transaction": { "state": state }
    }))
}

pub fn store_with_context(context: Value) -> ContextStore {
    let store = ContextStore::new();
    store.install(context).expect("test context must parse");
    store
}
