//! Moving buffers, words, strings and records across the boundary.
//!
//! Arguments are copied into buffers allocated with the core allocator and
//! handed over as [`Slice`]s; the core frees them. Results come back as
//! `(ptr, len)` pairs in a [`ReturnArea`] and are freed as soon as they are
//! copied out.

use std::sync::MutexGuard;

use plonk_core::{RawHandle, Slice};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::context::Bridge;
use crate::error::{BridgeError, Result};

/// Bytes reserved on the core stack for a multi-value result.
pub const RETURN_AREA_SIZE: i32 = 16;

impl Bridge {
    fn alloc(&self, size: u32) -> Result<u32> {
        self.call(|core| core.malloc(size))
    }

    fn write_memory(&self, ptr: u32, bytes: &[u8]) -> Result<()> {
        let mut memory = self.instance().image().memory();
        memory.write(ptr, bytes).map_err(plonk_core::CoreError::from)?;
        Ok(())
    }

    pub fn pass_bytes(&self, bytes: &[u8]) -> Result<Slice> {
        if bytes.is_empty() {
            return Ok(Slice::EMPTY);
        }
        let ptr = self.alloc(bytes.len() as u32)?;
        self.write_memory(ptr, bytes)?;
        trace!(ptr, len = bytes.len(), "passed bytes");
        Ok(Slice::new(ptr, bytes.len() as u32))
    }

    /// `len` of the result counts words.
    pub fn pass_words(&self, words: &[u32]) -> Result<Slice> {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let slice = self.pass_bytes(&bytes)?;
        Ok(Slice::new(slice.ptr, words.len() as u32))
    }

    pub fn pass_handles(&self, handles: &[RawHandle]) -> Result<Slice> {
        self.pass_words(&RawHandle::encode_all(handles))
    }

    /// Allocates one byte per character and grows the buffer once the first
    /// non-ASCII character shows the estimate was short.
    pub fn pass_str(&self, s: &str) -> Result<Slice> {
        if s.is_empty() {
            return Ok(Slice::EMPTY);
        }
        let estimate = s.chars().count() as u32;
        let mut ptr = self.alloc(estimate)?;
        let ascii = s.bytes().take_while(u8::is_ascii).count();
        self.write_memory(ptr, &s.as_bytes()[..ascii])?;
        if ascii < s.len() {
            ptr = self.call(|core| core.realloc(ptr, s.len() as u32))?;
            self.write_memory(ptr + ascii as u32, &s.as_bytes()[ascii..])?;
            trace!(estimate, len = s.len(), "string outgrew ascii estimate");
        }
        Ok(Slice::new(ptr, s.len() as u32))
    }

    pub fn pass_record<T: Serialize>(&self, value: &T) -> Result<Slice> {
        self.pass_bytes(&bincode::serialize(value)?)
    }

    /// Copies `len` bytes at `ptr` out of the core and frees the buffer.
    pub fn take_bytes(&self, ptr: u32, len: u32) -> Result<Vec<u8>> {
        if ptr == 0 {
            return Ok(Vec::new());
        }
        let mut memory = self.instance().image().memory();
        let bytes = memory.read(ptr, len).map(<[u8]>::to_vec);
        let freed = memory.free(ptr);
        let bytes = bytes.map_err(plonk_core::CoreError::from)?;
        freed.map_err(plonk_core::CoreError::from)?;
        Ok(bytes)
    }

    pub fn take_words(&self, ptr: u32, len: u32) -> Result<Vec<u32>> {
        let bytes = len
            .checked_mul(4)
            .ok_or_else(|| BridgeError::Decode(format!("{len} words overflow the address space")))?;
        Ok(self
            .take_bytes(ptr, bytes)?
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect())
    }

    /// Fails with [`BridgeError::Decode`] on invalid UTF-8; the buffer is freed either way.
    pub fn take_string(&self, ptr: u32, len: u32) -> Result<String> {
        String::from_utf8(self.take_bytes(ptr, len)?)
            .map_err(|e| BridgeError::Decode(format!("string result is not UTF-8: {e}")))
    }

    pub fn take_record<T: DeserializeOwned>(&self, ptr: u32, len: u32) -> Result<T> {
        Ok(bincode::deserialize(&self.take_bytes(ptr, len)?)?)
    }

    /// Reserves a return area for the duration of one call. Other threads
    /// using the same core wait until it is released.
    pub fn return_area(&self) -> Result<ReturnArea<'_>> {
        ReturnArea::new(self)
    }
}

/// A scratch region on the core stack, released on drop. The core stack is
/// held exclusively while the area exists.
#[derive(Debug)]
pub struct ReturnArea<'a> {
    bridge: &'a Bridge,
    ptr: u32,
    _stack: MutexGuard<'a, ()>,
}

impl<'a> ReturnArea<'a> {
    pub fn new(bridge: &'a Bridge) -> Result<Self> {
        let stack = bridge.lock_stack();
        let ptr = bridge.call(|core| core.add_to_stack_pointer(-RETURN_AREA_SIZE))?;
        Ok(Self {
            bridge,
            ptr,
            _stack: stack,
        })
    }

    pub const fn ptr(&self) -> u32 {
        self.ptr
    }

    fn words(&self, n: u32) -> Result<Vec<u32>> {
        let memory = self.bridge.instance().image().memory();
        Ok(memory
            .read_u32s(self.ptr, n)
            .map_err(plonk_core::CoreError::from)?)
    }

    /// Result of shape `(ptr, len)` with `len` in bytes.
    pub fn take_bytes(&self) -> Result<Vec<u8>> {
        let w = self.words(2)?;
        self.bridge.take_bytes(w[0], w[1])
    }

    /// Result of shape `(ptr, len)` with `len` in words.
    pub fn take_words(&self) -> Result<Vec<u32>> {
        let w = self.words(2)?;
        self.bridge.take_words(w[0], w[1])
    }

    pub fn take_string(&self) -> Result<String> {
        let w = self.words(2)?;
        self.bridge.take_string(w[0], w[1])
    }

    pub fn take_record<T: DeserializeOwned>(&self) -> Result<T> {
        let w = self.words(2)?;
        self.bridge.take_record(w[0], w[1])
    }

    /// Result of shape `(is_some, ptr, len)`.
    pub fn take_option(&self) -> Result<Option<Vec<u8>>> {
        let w = self.words(3)?;
        match w[0] {
            0 => Ok(None),
            1 => self.bridge.take_bytes(w[1], w[2]).map(Some),
            tag => Err(BridgeError::Decode(format!("invalid option tag {tag}"))),
        }
    }
}

impl Drop for ReturnArea<'_> {
    fn drop(&mut self) {
        if let Err(err) = self
            .bridge
            .call(|core| core.add_to_stack_pointer(RETURN_AREA_SIZE))
        {
            tracing::error!(%err, "failed to release return area");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    #[test]
    fn test_return_area_is_released_on_error() {
        let bridge = Bridge::new(BridgeConfig::default()).unwrap();
        let sp = bridge.instance().image().memory().stack_pointer();
        {
            let ret = bridge.return_area().unwrap();
            assert_eq!(ret.ptr(), sp - 16);
            let bad = bridge.pass_bytes(&[1, 2, 3]).unwrap();
            assert!(bridge
                .call(|core| core.field_of_bytes::<plonk_core::Fp>(bad, ret.ptr()))
                .is_err());
        }
        assert_eq!(bridge.instance().image().memory().stack_pointer(), sp);
        assert_eq!(bridge.live_allocations(), 0);
    }

    #[test]
    fn test_strings_outgrowing_the_estimate() {
        let bridge = Bridge::new(BridgeConfig::default()).unwrap();
        for s in ["ascii only", "grüße", "ζ·ω", "🦀x"] {
            let slice = bridge.pass_str(s).unwrap();
            assert_eq!(slice.len as usize, s.len());
            assert_eq!(bridge.take_string(slice.ptr, slice.len).unwrap(), s);
        }
        assert_eq!(bridge.live_allocations(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_freed() {
        let bridge = Bridge::new(BridgeConfig::default()).unwrap();
        let slice = bridge.pass_bytes(&[0xff, 0xfe, b'a']).unwrap();
        let err = bridge.take_string(slice.ptr, slice.len).unwrap_err();
        assert!(matches!(err, BridgeError::Decode(_)));
        assert_eq!(bridge.live_allocations(), 0);
    }

    #[test]
    fn test_words_and_records() {
        let bridge = Bridge::new(BridgeConfig::default()).unwrap();
        let words = [1u32, u32::MAX, 7];
        let slice = bridge.pass_words(&words).unwrap();
        assert_eq!(slice.len, 3);
        assert_eq!(bridge.take_words(slice.ptr, slice.len).unwrap(), words);

        let record = (3u64, String::from("row"), vec![true, false]);
        let slice = bridge.pass_record(&record).unwrap();
        let back: (u64, String, Vec<bool>) = bridge.take_record(slice.ptr, slice.len).unwrap();
        assert_eq!(back, record);
        assert!(bridge.take_bytes(0, 0).unwrap().is_empty());
    }
}
