//! Progress-callback trait for batch item events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::EngineConfigBuilder::progress_callback`] to be told as
//! each asset of a batch (or each page of a rasterised document) is
//! processed. The trait is `Send + Sync` because items run concurrently on
//! the blocking pool.
//!
//! # Example
//!
//! ```rust
//! use pixeldrift::{BatchProgressCallback, EngineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, total: usize, bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("item {}/{} done ({} bytes)", index + 1, total, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = EngineConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by batch operations as they process each item.
///
/// All methods have default no-op implementations. `index` is 0-based and
/// refers to the item's position in the input, not completion order.
///
/// # Thread safety
///
/// `on_item_start`, `on_item_complete` and `on_item_error` may be called
/// concurrently from different threads.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any item is processed.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when work on an item begins.
    fn on_item_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an item produced its output.
    ///
    /// * `bytes`: size of the encoded output
    fn on_item_complete(&self, index: usize, total: usize, bytes: usize) {
        let _ = (index, total, bytes);
    }

    /// Called when an item failed. The batch aborts after this.
    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once at the end, also after a failure.
    ///
    /// * `succeeded`: items that completed before the batch finished
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EngineConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
