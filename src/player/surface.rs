//! Render surface binding
//!
//! The host owns a `RenderSurface`; the engine and decoders only ever see a
//! `SurfaceHandle`, which can outlive the surface and reports whether the
//! surface behind it is still alive.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Host-owned destination for decoded frames
pub struct RenderSurface {
    id: u64,
    alive: Arc<AtomicBool>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get a handle that can be given to the engine
    pub fn handle(&self) -> SurfaceHandle {
        SurfaceHandle {
            id: self.id,
            alive: Arc::clone(&self.alive),
        }
    }

    /// Tear the surface down; outstanding handles observe it as dead
    pub fn destroy(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Opaque reference to a render surface
#[derive(Clone)]
pub struct SurfaceHandle {
    id: u64,
    alive: Arc<AtomicBool>,
}

impl SurfaceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl PartialEq for SurfaceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SurfaceHandle {}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Shared slot holding the surface currently bound by the engine
///
/// The engine writes it; proxies handed to decoders read it.
#[derive(Clone, Default)]
pub struct SurfaceSlot {
    inner: Arc<RwLock<Option<SurfaceHandle>>>,
}

impl SurfaceSlot {
    pub fn get(&self) -> Option<SurfaceHandle> {
        self.inner.read().clone()
    }

    pub fn replace(&self, handle: Option<SurfaceHandle>) -> Option<SurfaceHandle> {
        std::mem::replace(&mut *self.inner.write(), handle)
    }

    pub fn take(&self) -> Option<SurfaceHandle> {
        self.inner.write().take()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_none()
    }
}
