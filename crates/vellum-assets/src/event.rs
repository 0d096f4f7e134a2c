//! Asset lifecycle events.

use vellum_core::ResourcePath;

use crate::asset_type::AssetTypeKey;

/// Events emitted by the asset system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// A new asset was created and its file written.
    Created {
        /// The path of the asset.
        path: ResourcePath,
        /// The type of the asset.
        asset_type: AssetTypeKey,
    },

    /// An asset was loaded from its file.
    Loaded {
        /// The path of the asset.
        path: ResourcePath,
        /// The type of the asset.
        asset_type: AssetTypeKey,
    },

    /// An asset finished initialization.
    Initialized {
        /// The path of the asset.
        path: ResourcePath,
    },

    /// An asset's initialization job failed.
    InitializationFailed {
        /// The path of the asset.
        path: ResourcePath,
        /// Error message.
        error: String,
    },

    /// An asset was written to its file.
    Saved {
        /// The path of the asset.
        path: ResourcePath,
    },

    /// An asset file was deleted.
    Deleted {
        /// The path of the asset.
        path: ResourcePath,
    },

    /// The last handle to an asset was released.
    Unloaded {
        /// The path of the asset.
        path: ResourcePath,
    },
}

impl AssetEvent {
    /// Get the path of the asset this event relates to.
    pub fn path(&self) -> ResourcePath {
        match self {
            AssetEvent::Created { path, .. }
            | AssetEvent::Loaded { path, .. }
            | AssetEvent::Initialized { path }
            | AssetEvent::InitializationFailed { path, .. }
            | AssetEvent::Saved { path }
            | AssetEvent::Deleted { path }
            | AssetEvent::Unloaded { path } => *path,
        }
    }

    /// Check if this is a creation event.
    pub fn is_created(&self) -> bool {
        matches!(self, AssetEvent::Created { .. })
    }

    /// Check if this is an unload event.
    pub fn is_unloaded(&self) -> bool {
        matches!(self, AssetEvent::Unloaded { .. })
    }

    /// Check if this is a failure event.
    pub fn is_failed(&self) -> bool {
        matches!(self, AssetEvent::InitializationFailed { .. })
    }
}

/// A buffer of asset events that can be drained each frame.
#[derive(Debug, Default)]
pub struct AssetEventBuffer {
    events: Vec<AssetEvent>,
}

impl AssetEventBuffer {
    /// Create a new empty event buffer.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to the buffer.
    pub fn push(&mut self, event: AssetEvent) {
        self.events.push(event);
    }

    /// Drain all events from the buffer.
    pub fn drain(&mut self) -> impl Iterator<Item = AssetEvent> + '_ {
        self.events.drain(..)
    }

    /// Get an iterator over events without draining.
    pub fn iter(&self) -> impl Iterator<Item = &AssetEvent> {
        self.events.iter()
    }

    /// Check if there are any events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Clear all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
