//! Header-prefixed blobs.
//!
//! A container blob is laid out as
//!
//! ```text
//! [ header length: u32 LE ][ header: bincode ][ payload bytes ... ]
//! ```
//!
//! The header describes the payload (counts, formats, strides) so a consumer can map
//! the blob once and interpret the payload in place.

use serde::Serialize;
use serde::de::DeserializeOwned;
use vellum_core::profiling::profile_function;

use crate::cache::{DerivedDataCache, MapOptions};
use crate::error::{DdcError, DdcResult};
use crate::handle::ContentHandle;
use crate::key::DerivedDataKey;

/// Size of the length prefix in front of the header.
pub const HEADER_PREFIX_LEN: usize = 4;

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// A decoded header together with the mapping that holds its payload.
#[derive(Debug)]
pub struct ContainerView<H> {
    header: H,
    handle: ContentHandle,
    payload_offset: usize,
}

impl<H> ContainerView<H> {
    pub fn header(&self) -> &H {
        &self.header
    }

    /// Payload bytes following the header, borrowed from the mapping.
    pub fn payload(&self) -> &[u8] {
        &self.handle.immutable_span()[self.payload_offset..]
    }

    /// Byte offset of the payload inside the blob.
    pub fn payload_offset(&self) -> usize {
        self.payload_offset
    }

    pub fn into_parts(self) -> (H, ContentHandle, usize) {
        (self.header, self.handle, self.payload_offset)
    }
}

impl DerivedDataCache {
    /// Write `header` followed by `payload` as one blob.
    pub fn write_container<H: Serialize>(
        &self,
        key: DerivedDataKey,
        header: &H,
        payload: &[u8],
    ) -> DdcResult<()> {
        profile_function!();
        let encoded = bincode::serde::encode_to_vec(header, config())
            .map_err(|e| DdcError::container(key, format!("failed to encode header: {}", e)))?;
        let header_len = u32::try_from(encoded.len())
            .map_err(|_| DdcError::container(key, "header is larger than 4 GiB"))?;

        let payload_offset = HEADER_PREFIX_LEN + encoded.len();
        let mut handle = self.create_derived_data_sized(key, payload_offset + payload.len())?;
        {
            let span = handle.mutable_span();
            span[..HEADER_PREFIX_LEN].copy_from_slice(&header_len.to_le_bytes());
            span[HEADER_PREFIX_LEN..payload_offset].copy_from_slice(&encoded);
            span[payload_offset..].copy_from_slice(payload);
        }
        handle.flush_writes()?;

        tracing::trace!(
            "Wrote container {} (header {} bytes, payload {} bytes)",
            key,
            encoded.len(),
            payload.len()
        );
        Ok(())
    }

    /// Map a container blob and decode its header. Returns `Ok(None)` if it does not exist.
    pub fn read_container<H: DeserializeOwned>(
        &self,
        key: DerivedDataKey,
    ) -> DdcResult<Option<ContainerView<H>>> {
        profile_function!();
        let Some(handle) = self.get_resource_handle(key, MapOptions::default())? else {
            return Ok(None);
        };

        let bytes = handle.immutable_span();
        if bytes.len() < HEADER_PREFIX_LEN {
            return Err(DdcError::container(key, "blob is shorter than the length prefix"));
        }
        let mut prefix = [0u8; HEADER_PREFIX_LEN];
        prefix.copy_from_slice(&bytes[..HEADER_PREFIX_LEN]);
        let header_len = u32::from_le_bytes(prefix) as usize;

        let payload_offset = HEADER_PREFIX_LEN + header_len;
        if payload_offset > bytes.len() {
            return Err(DdcError::container(
                key,
                format!(
                    "header length {} exceeds blob size {}",
                    header_len,
                    bytes.len()
                ),
            ));
        }

        let (header, read): (H, usize) =
            bincode::serde::decode_from_slice(&bytes[HEADER_PREFIX_LEN..payload_offset], config())
                .map_err(|e| DdcError::container(key, format!("failed to decode header: {}", e)))?;
        if read != header_len {
            return Err(DdcError::container(
                key,
                format!("header decoded {} of {} bytes", read, header_len),
            ));
        }

        Ok(Some(ContainerView {
            header,
            handle,
            payload_offset,
        }))
    }
}
