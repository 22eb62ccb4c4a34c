//! Linear memory of the compute core.
//!
//! The address space is split into a reserved null word, a downward-growing
//! stack used for return areas, and a heap managed by [`HeapAllocator`].

mod allocator;
mod error;

use allocator::HeapAllocator;
pub use error::MemoryError;
use serde::{Deserialize, Serialize};

/// Size of one memory page in bytes.
pub const PAGE_SIZE: u32 = 1 << 16;
/// Pages mapped when the memory is created.
pub const INITIAL_PAGES: u32 = 18;
/// Hard limit on the number of pages. Instantiation rejects any other maximum.
pub const MAXIMUM_PAGES: u32 = 16384;
/// Top of the stack region; the heap starts here.
pub const STACK_TOP: u32 = PAGE_SIZE;
/// Lowest address the stack pointer may reach. Address 0 stays the null pointer.
pub const STACK_FLOOR: u32 = 8;

/// Shape of a memory as requested by a module's imports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDescriptor {
    pub initial: u32,
    pub maximum: u32,
    pub shared: bool,
}

impl Default for MemoryDescriptor {
    fn default() -> Self {
        Self {
            initial: INITIAL_PAGES,
            maximum: MAXIMUM_PAGES,
            shared: true,
        }
    }
}

impl MemoryDescriptor {
    /// Checks the descriptor against what the core module imports.
    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.maximum != MAXIMUM_PAGES {
            return Err(MemoryError::InvalidDescriptor(format!(
                "maximum must be {MAXIMUM_PAGES} pages, got {}",
                self.maximum
            )));
        }
        if !self.shared {
            return Err(MemoryError::InvalidDescriptor(
                "memory must be shared between execution units".into(),
            ));
        }
        if self.initial < 2 || self.initial > self.maximum {
            return Err(MemoryError::InvalidDescriptor(format!(
                "initial size of {} pages is outside [2, {}]",
                self.initial, self.maximum
            )));
        }
        Ok(())
    }
}

/// A growable byte array addressed by 32-bit pointers.
#[derive(Debug)]
pub struct LinearMemory {
    descriptor: MemoryDescriptor,
    bytes: Vec<u8>,
    heap: HeapAllocator,
    stack_pointer: u32,
}

impl LinearMemory {
    pub fn new(descriptor: MemoryDescriptor) -> Result<Self, MemoryError> {
        descriptor.validate()?;
        Ok(Self {
            descriptor,
            bytes: vec![0; (descriptor.initial * PAGE_SIZE) as usize],
            heap: HeapAllocator::new(STACK_TOP),
            stack_pointer: STACK_TOP,
        })
    }

    pub const fn descriptor(&self) -> MemoryDescriptor {
        self.descriptor
    }

    /// Number of mapped pages.
    pub fn pages(&self) -> u32 {
        (self.bytes.len() / PAGE_SIZE as usize) as u32
    }

    pub fn byte_len(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Number of heap blocks currently allocated.
    pub fn live_allocations(&self) -> usize {
        self.heap.live_blocks()
    }

    pub const fn stack_pointer(&self) -> u32 {
        self.stack_pointer
    }

    /// Maps `delta` additional pages and returns the previous page count.
    pub fn grow(&mut self, delta: u32) -> Result<u32, MemoryError> {
        let old = self.pages();
        let new = old
            .checked_add(delta)
            .filter(|pages| *pages <= self.descriptor.maximum)
            .ok_or(MemoryError::GrowthLimit {
                max: self.descriptor.maximum,
            })?;
        self.bytes.resize(new as usize * PAGE_SIZE as usize, 0);
        Ok(old)
    }

    pub fn malloc(&mut self, size: u32) -> Result<u32, MemoryError> {
        let max = self.descriptor.maximum;
        let addr = self.heap.alloc(size).ok_or(MemoryError::GrowthLimit { max })?;
        let needed = self.heap.high_water() as u64;
        if needed > self.bytes.len() as u64 {
            let pages = needed.div_ceil(PAGE_SIZE as u64) as u32;
            if let Err(err) = self.grow(pages - self.pages()) {
                self.heap.rollback(addr);
                return Err(err);
            }
        }
        Ok(addr)
    }

    pub fn free(&mut self, ptr: u32) -> Result<(), MemoryError> {
        self.heap
            .free(ptr)
            .map(|_| ())
            .ok_or(MemoryError::UnknownAllocation(ptr))
    }

    /// Resizes the block at `ptr`, moving it when the padded size no longer fits.
    pub fn realloc(&mut self, ptr: u32, new_size: u32) -> Result<u32, MemoryError> {
        let old_size = self
            .heap
            .block_size(ptr)
            .ok_or(MemoryError::UnknownAllocation(ptr))?;
        if new_size <= old_size {
            return Ok(ptr);
        }
        let new_ptr = self.malloc(new_size)?;
        self.bytes
            .copy_within(ptr as usize..(ptr + old_size) as usize, new_ptr as usize);
        self.free(ptr)?;
        Ok(new_ptr)
    }

    /// Moves the stack pointer by `delta` bytes and returns its new value.
    pub fn add_to_stack_pointer(&mut self, delta: i32) -> Result<u32, MemoryError> {
        let target = self.stack_pointer as i64 + delta as i64;
        if target < STACK_FLOOR as i64 || target > STACK_TOP as i64 {
            return Err(MemoryError::StackOverflow(target));
        }
        self.stack_pointer = target as u32;
        Ok(self.stack_pointer)
    }

    fn range(&self, ptr: u32, len: u32) -> Result<std::ops::Range<usize>, MemoryError> {
        if len == 0 {
            return Ok(0..0);
        }
        if ptr == 0 {
            return Err(MemoryError::NullPointer);
        }
        let end = ptr as u64 + len as u64;
        if end > self.bytes.len() as u64 {
            return Err(MemoryError::OutOfBounds {
                ptr,
                len,
                size: self.byte_len(),
            });
        }
        Ok(ptr as usize..end as usize)
    }

    pub fn read(&self, ptr: u32, len: u32) -> Result<&[u8], MemoryError> {
        let range = self.range(ptr, len)?;
        Ok(&self.bytes[range])
    }

    pub fn write(&mut self, ptr: u32, data: &[u8]) -> Result<(), MemoryError> {
        let range = self.range(ptr, data.len() as u32)?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    pub fn read_u32(&self, ptr: u32) -> Result<u32, MemoryError> {
        let bytes = self.read(ptr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn write_u32(&mut self, ptr: u32, value: u32) -> Result<(), MemoryError> {
        self.write(ptr, &value.to_le_bytes())
    }

    /// Reads `len` little-endian words starting at `ptr`.
    pub fn read_u32s(&self, ptr: u32, len: u32) -> Result<Vec<u32>, MemoryError> {
        let byte_len = len.checked_mul(4).ok_or(MemoryError::OutOfBounds {
            ptr,
            len,
            size: self.byte_len(),
        })?;
        Ok(self
            .read(ptr, byte_len)?
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect())
    }

    pub fn write_u32s(&mut self, ptr: u32, words: &[u32]) -> Result<(), MemoryError> {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.write(ptr, &bytes)
    }
}
