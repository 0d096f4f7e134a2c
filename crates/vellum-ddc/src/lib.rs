//! Derived data cache (DDC).
//!
//! Compiled byproducts of source assets are stored as memory-mapped blobs, one file
//! per [`DerivedDataKey`] under a configured root directory. Blobs are accessed
//! through [`ContentHandle`]s, which own their mapping and unmap on drop.
//!
//! # Example
//!
//! ```ignore
//! let cache = DerivedDataCache::new("ddc")?;
//! let key = DerivedDataKey::from_content(b"source bytes");
//!
//! cache.create_derived_data(key, b"compiled bytes")?;
//! let handle = cache.get_resource_handle(key, MapOptions::default())?.unwrap();
//! assert_eq!(handle.immutable_span(), b"compiled bytes");
//! ```

pub mod backend;
pub mod cache;
pub mod container;
pub mod error;
pub mod handle;
pub mod key;

pub use backend::{MappedRegion, MmapBackend, PlatformBackend};
pub use cache::{DerivedDataCache, MapOptions, WHOLE_BLOB};
pub use container::{ContainerView, HEADER_PREFIX_LEN};
pub use error::{DdcError, DdcResult};
pub use handle::{ByteRange, ContentHandle};
pub use key::{DerivedDataKey, ParseKeyError};
