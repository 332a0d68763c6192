use std::ops::{Deref, DerefMut};

use super::ControlSurface;
use crate::io::transport::MidiTransport;

/// Scoped setup block for a [`ControlSurface`].
///
/// Every listener registered while the guard is alive belongs to the setup.
/// [`ComponentGuard::complete`] keeps them. Dropping the guard without
/// completing it (early return, panic) releases them again, so a half-done
/// setup never leaves stray bindings behind.
pub struct ComponentGuard<'a, T: MidiTransport> {
    surface: &'a mut ControlSurface<T>,
    completed: bool,
}

impl<'a, T: MidiTransport> ComponentGuard<'a, T> {
    pub(super) fn new(surface: &'a mut ControlSurface<T>) -> Self {
        assert!(surface.setup_pending.is_none(), "component guard is already active");
        surface.setup_pending = Some(Vec::new());
        Self { surface, completed: false }
    }

    /// Number of listeners registered under this guard so far.
    pub fn registered(&self) -> usize {
        self.surface.setup_pending.as_ref().map_or(0, Vec::len)
    }

    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl<T: MidiTransport> Deref for ComponentGuard<'_, T> {
    type Target = ControlSurface<T>;

    fn deref(&self) -> &ControlSurface<T> {
        self.surface
    }
}

impl<T: MidiTransport> DerefMut for ComponentGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut ControlSurface<T> {
        self.surface
    }
}

impl<T: MidiTransport> Drop for ComponentGuard<'_, T> {
    fn drop(&mut self) {
        let pending = self.surface.setup_pending.take().unwrap_or_default();
        if self.completed {
            log::debug!("Surface setup complete, {} listeners registered", pending.len());
            return;
        }
        if !pending.is_empty() {
            log::warn!("Surface setup aborted, releasing {} listeners", pending.len());
        }
        for id in pending {
            self.surface.registry.remove(id);
        }
    }
}
