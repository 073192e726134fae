use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 7;

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Wall-clock milliseconds that never go backwards within this process
fn monotonic_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    LAST_MILLIS.fetch_max(now, Ordering::Relaxed).max(now)
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// Generate a spreadsheet node id: `table-<millis>-<suffix>`
///
/// Collisions are not checked; see [`crate::index::duplicate_ids`].
pub fn generate_id() -> String {
    IdGenerator::new().new_id()
}

/// Id generator, optionally namespaced per editing session
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    namespace: Option<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { namespace: None }
    }

    /// Ids look like `table-<namespace>-<millis>-<suffix>`
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    pub fn new_id(&self) -> String {
        let millis = monotonic_millis();
        let suffix = random_suffix(SUFFIX_LEN);
        match &self.namespace {
            Some(ns) => format!("table-{}-{}-{}", ns, millis, suffix),
            None => format!("table-{}-{}", millis, suffix),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}
