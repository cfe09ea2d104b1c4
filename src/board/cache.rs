//! Lazily rebuilt geometry caches.
//!
//! A pad's derived geometry is expensive to build and read from many
//! threads. [`LazyCache`] keeps one shared value with a dirty flag:
//!
//! 1. readers check the flag and return the cached `Arc` when clean;
//! 2. otherwise they take the build lock and check the flag again;
//! 3. the first thread through rebuilds, later ones find it clean and
//!    return the same `Arc`.
//!
//! Writers mark the cache dirty after changing the pad. Since every pad
//! mutator takes `&mut self`, no reader can run while the pad changes, and
//! the release store on the flag orders the change before the next rebuild.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::layer::{PcbLayer, MAX_COPPER_LAYERS};

/// A value rebuilt on demand after invalidation.
#[derive(Debug)]
pub struct LazyCache<T> {
    dirty: AtomicBool,
    build_lock: Mutex<()>,
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> LazyCache<T> {
    /// Creates an empty, dirty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dirty: AtomicBool::new(true),
            build_lock: Mutex::new(()),
            slot: RwLock::new(None),
        }
    }

    /// Marks the cached value stale.
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns true when the next read will rebuild.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// The cached value if it is up to date.
    #[must_use]
    pub fn peek(&self) -> Option<Arc<T>> {
        if self.is_dirty() {
            return None;
        }
        self.read_slot()
    }

    /// Returns the cached value, building it first if stale.
    ///
    /// At most one `build` runs per dirty transition; threads that raced
    /// for the rebuild all receive the same `Arc`.
    pub fn get_or_build(&self, build: impl FnOnce() -> T) -> Arc<T> {
        if let Some(value) = self.peek() {
            return value;
        }

        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(value) = self.peek() {
            return value;
        }

        let value = Arc::new(build());
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&value));
        self.dirty.store(false, Ordering::Release);
        value
    }

    fn read_slot(&self) -> Option<Arc<T>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }
}

impl<T> Default for LazyCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning yields an empty cache: a cloned pad rebuilds its own geometry.
impl<T> Clone for LazyCache<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Forced flashing state of one copper layer for copper-pour connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZoneLayerOverride {
    /// Follow the normal flashing rules.
    #[default]
    None,
    /// Treat the layer as flashed.
    ForceFlashed,
    /// Treat the layer as not flashed.
    ForceUnflashed,
}

/// Per-copper-layer zone overrides, guarded by their own lock.
///
/// Written by zone filling and read by flashing queries, independently of
/// the shape caches.
#[derive(Debug)]
pub struct ZoneLayerOverrides {
    slots: Mutex<[ZoneLayerOverride; MAX_COPPER_LAYERS]>,
}

impl ZoneLayerOverrides {
    /// All layers without override.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new([ZoneLayerOverride::None; MAX_COPPER_LAYERS]),
        }
    }

    /// Override for `layer`. Technical layers never have one.
    #[must_use]
    pub fn get(&self, layer: PcbLayer) -> ZoneLayerOverride {
        layer.copper_index().map_or(ZoneLayerOverride::None, |i| {
            self.slots.lock().unwrap_or_else(PoisonError::into_inner)[i]
        })
    }

    /// Sets the override for a copper layer; technical layers are ignored.
    pub fn set(&self, layer: PcbLayer, value: ZoneLayerOverride) {
        if let Some(i) = layer.copper_index() {
            self.slots.lock().unwrap_or_else(PoisonError::into_inner)[i] = value;
        } else {
            tracing::debug!(layer = %layer, "Ignoring zone override on non-copper layer");
        }
    }

    /// Resets every layer to [`ZoneLayerOverride::None`].
    pub fn clear(&self) {
        *self.slots.lock().unwrap_or_else(PoisonError::into_inner) =
            [ZoneLayerOverride::None; MAX_COPPER_LAYERS];
    }

    fn snapshot(&self) -> [ZoneLayerOverride; MAX_COPPER_LAYERS] {
        *self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ZoneLayerOverrides {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ZoneLayerOverrides {
    fn clone(&self) -> Self {
        Self {
            slots: Mutex::new(self.snapshot()),
        }
    }
}
