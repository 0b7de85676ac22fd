// ============================================================
// Layer 6 — Process Runtime
// ============================================================
// Training is strictly sequential. The CPU backend parallelises
// tensor ops through rayon's global pool, so the pool is pinned
// to one worker before any tensor work happens.

use std::sync::Once;

static INIT: Once = Once::new();

/// Configure a one-thread global rayon pool. Later calls do nothing.
pub fn init_single_thread() {
    INIT.call_once(|| {
        match rayon::ThreadPoolBuilder::new().num_threads(1).build_global() {
            Ok(()) => tracing::debug!("Global thread pool limited to 1 thread"),
            // Someone built the global pool first; keep theirs
            Err(e) => tracing::warn!("Could not configure single-thread pool: {e}"),
        }
    });
}
