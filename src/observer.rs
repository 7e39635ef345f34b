//! Observer trait for session and export events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] into [`crate::Session::new`] or
//! [`crate::export::pdf::PdfExporter::with_observer`] to mirror state changes
//! into a UI, a terminal spinner or a log. The library never depends on how
//! the host presents them.
//!
//! # Example
//!
//! ```rust
//! use docmimic::{SessionObserver, SessionPhase};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PhaseCounter(AtomicUsize);
//!
//! impl SessionObserver for PhaseCounter {
//!     fn on_phase_changed(&self, _phase: SessionPhase) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let observer: Arc<dyn SessionObserver> = Arc::new(PhaseCounter(AtomicUsize::new(0)));
//! ```

use crate::session::SessionPhase;
use std::sync::Arc;

/// Receives session and export events.
///
/// Implementations must be `Send + Sync`: events are delivered from whatever
/// task completes the operation. All methods default to no-ops. Events are
/// delivered after the session lock has been released, so an observer may
/// call back into the session.
pub trait SessionObserver: Send + Sync {
    /// The generation phase changed.
    fn on_phase_changed(&self, phase: SessionPhase) {
        let _ = phase;
    }

    /// The single active message was set (`Some`) or cleared (`None`).
    fn on_message_changed(&self, message: Option<&str>) {
        let _ = message;
    }

    fn on_analysis_started(&self) {}

    /// Analysis settled; `success` is false on failure.
    fn on_analysis_finished(&self, success: bool) {
        let _ = success;
    }

    /// An export began writing `file_name`.
    fn on_export_started(&self, file_name: &str) {
        let _ = file_name;
    }

    /// An export settled, successfully or not.
    fn on_export_settled(&self, file_name: &str, success: bool) {
        let _ = (file_name, success);
    }

    /// A one-shot notice, e.g. that PDF rendering is not available yet.
    fn on_notice(&self, notice: &str) {
        let _ = notice;
    }
}

/// Observer that ignores everything. The default.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Shared observer handle.
pub type ObserverHandle = Arc<dyn SessionObserver>;
