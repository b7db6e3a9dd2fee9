//! Scoped admin-mode elevation for privileged host reads and writes
//!
//! Callers never toggle the mode directly: they hold an `AdminModeGuard`
//! for the duration of the privileged work, and dropping the guard releases
//! that elevation on every exit path. Guards from concurrent attempts may be
//! released in any order; admin mode stays on while at least one is held.

use std::sync::atomic::{AtomicUsize, Ordering};

pub trait HostContext: Send + Sync {
    /// Take one elevation, returning whether admin mode was already active
    fn enter_admin_mode(&self) -> bool;

    /// Release one elevation taken by `enter_admin_mode`
    fn restore_mode(&self, previous: bool);
}

/// Elevated-privilege scope, released on drop
#[must_use = "admin mode is released as soon as the guard is dropped"]
pub struct AdminModeGuard<'a> {
    context: &'a dyn HostContext,
    previous: bool,
}

impl<'a> AdminModeGuard<'a> {
    pub fn acquire(context: &'a dyn HostContext) -> Self {
        let previous = context.enter_admin_mode();
        tracing::trace!(previous, "Entered admin mode");
        Self { context, previous }
    }
}

impl Drop for AdminModeGuard<'_> {
    fn drop(&mut self) {
        self.context.restore_mode(self.previous);
        tracing::trace!(outer_held = self.previous, "Left admin mode");
    }
}

/// Process-local admin mode, counted per held elevation
#[derive(Debug, Default)]
pub struct ProcessHostContext {
    depth: AtomicUsize,
}

impl ProcessHostContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_admin(&self) -> bool {
        self.depth() > 0
    }

    /// Number of elevations currently held
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl HostContext for ProcessHostContext {
    fn enter_admin_mode(&self) -> bool {
        self.depth.fetch_add(1, Ordering::SeqCst) > 0
    }

    fn restore_mode(&self, _previous: bool) {
        // Never wraps below zero, even for an unbalanced release
        let _ = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| depth.checked_sub(1));
    }
}
