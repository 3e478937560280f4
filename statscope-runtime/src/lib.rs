//! # statscope-runtime - In-Process Call Collector
//!
//! The instrumentation side of statscope. A profiled target links this crate,
//! marks functions with [`profile_span!`], and calls [`init`] once at startup;
//! from then on a flusher thread periodically appends the accumulated call
//! statistics to the sink file the viewer designated via `STATSCOPE_SINK`.
//!
//! ```no_run
//! fn main() {
//!     statscope_runtime::init();
//!     work();
//!     statscope_runtime::shutdown();
//! }
//!
//! fn work() {
//!     statscope_runtime::profile_span!("work");
//!     // ...
//! }
//! ```
//!
//! When `STATSCOPE_SINK` is not set the guards still run (the cost is a
//! thread-local push/pop and a hash-map update per call) but no I/O happens,
//! so instrumented binaries behave normally outside the viewer.

pub mod collector;

pub use collector::{enter, init, shutdown, CallSite, Guard};

/// Start a profiled span covering the rest of the enclosing block.
///
/// Captures the source file and line of the invocation into a static
/// [`CallSite`], so the viewer can report `file:line(name)` identities.
#[macro_export]
macro_rules! profile_span {
    ($name:expr) => {
        let _statscope_span_guard = {
            static SITE: $crate::CallSite = $crate::CallSite {
                name: $name,
                file: file!(),
                line: line!(),
            };
            $crate::enter(&SITE)
        };
    };
}
