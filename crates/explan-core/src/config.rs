//! Process-wide activation default.
//!
//! A single flag, read once at [`crate::Logger`] construction to seed each
//! new instance's `active` state. Narration is opt-in: the flag starts out
//! `false` so instrumented code costs one boolean check per call site until
//! somebody turns it on.

use std::sync::atomic::{AtomicBool, Ordering};

static ACTIVE_BY_DEFAULT: AtomicBool = AtomicBool::new(false);

/// Set whether newly constructed loggers start active.
pub fn set_active_by_default(active: bool) {
    ACTIVE_BY_DEFAULT.store(active, Ordering::Relaxed);
}

/// Whether newly constructed loggers start active.
#[must_use]
pub fn active_by_default() -> bool {
    ACTIVE_BY_DEFAULT.load(Ordering::Relaxed)
}
