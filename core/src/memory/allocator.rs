use std::collections::HashMap;

/// Smallest block handed out by the heap.
pub(crate) const MIN_BLOCK_SIZE: u32 = 8;

/// HeapAllocator hands out linear-memory addresses for core buffers, ensuring that:
/// - Every block is a power-of-two of at least MIN_BLOCK_SIZE bytes, aligned to its size,
/// - Freed blocks and alignment gaps are recorded as slack and reused first,
/// - Live blocks are tracked so that frees of unknown pointers are rejected.
#[derive(Debug)]
pub(crate) struct HeapAllocator {
    /// The next free allocation pointer.
    pos: u32,
    /// Slack blocks available for reuse, organized by the exponent (i.e. block size = 2^exponent).
    slack: HashMap<u32, Vec<u32>>,
    /// Live blocks, keyed by address, with their padded size.
    live: HashMap<u32, u32>,
}

impl HeapAllocator {
    /// Creates an allocator whose first block starts at `base`.
    pub(crate) fn new(base: u32) -> Self {
        Self {
            pos: base,
            slack: HashMap::new(),
            live: HashMap::new(),
        }
    }

    /// One past the highest address ever handed out.
    pub(crate) const fn high_water(&self) -> u32 {
        self.pos
    }

    pub(crate) fn live_blocks(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn block_size(&self, addr: u32) -> Option<u32> {
        self.live.get(&addr).copied()
    }

    /// Allocates a block for `requested_size` bytes.
    ///
    /// The allocation process:
    /// 1. Compute `p`, the padded size (power-of-two ≥ MIN_BLOCK_SIZE).
    /// 2. Attempt to reuse a slack block of size ≥ `p`, splitting off any leftover.
    /// 3. Otherwise, align the allocation pointer (recording any gap as slack),
    ///    and allocate a fresh block.
    ///
    /// Returns `None` when the address space is exhausted.
    pub(crate) fn alloc(&mut self, requested_size: u32) -> Option<u32> {
        let p = requested_size.checked_next_power_of_two()?.max(MIN_BLOCK_SIZE);
        let k = p.trailing_zeros();

        for exp in k..u32::BITS {
            if let Some(mut blocks) = self.slack.remove(&exp) {
                if let Some(addr) = blocks.pop() {
                    if !blocks.is_empty() {
                        self.slack.insert(exp, blocks);
                    }
                    let leftover = (1u32 << exp) - p;
                    if leftover >= MIN_BLOCK_SIZE {
                        self.add_slack(addr + p, leftover);
                    }
                    self.live.insert(addr, p);
                    return Some(addr);
                }
            }
        }

        let old_pos = self.pos;
        let aligned_pos = align_to(old_pos, p)?;
        let end = aligned_pos.checked_add(p)?;
        let gap = aligned_pos - old_pos;
        if gap >= MIN_BLOCK_SIZE {
            self.add_slack(old_pos, gap);
        }
        self.pos = end;
        self.live.insert(aligned_pos, p);
        Some(aligned_pos)
    }

    /// Returns a live block to the slack lists and yields its padded size.
    pub(crate) fn free(&mut self, addr: u32) -> Option<u32> {
        let size = self.live.remove(&addr)?;
        self.add_slack(addr, size);
        Some(size)
    }

    /// Releases the most recent fresh allocation if it was `addr`, used to roll back
    /// an allocation that the backing memory could not map.
    pub(crate) fn rollback(&mut self, addr: u32) {
        if let Some(size) = self.live.remove(&addr) {
            if addr + size == self.pos {
                self.pos = addr;
            } else {
                self.add_slack(addr, size);
            }
        }
    }

    /// Records a free (slack) region starting at `addr` with length `size`
    /// by splitting it into power-of-two blocks.
    fn add_slack(&mut self, addr: u32, size: u32) {
        if size < MIN_BLOCK_SIZE {
            return;
        }
        for (block_addr, block_size) in split_into_power_of_two_blocks(addr, size) {
            self.slack
                .entry(block_size.trailing_zeros())
                .or_default()
                .push(block_addr);
        }
    }
}

/// Aligns `pos` to the next multiple of `alignment` (which must be a power-of-two).
#[inline]
fn align_to(pos: u32, alignment: u32) -> Option<u32> {
    Some(pos.checked_add(alignment - 1)? & !(alignment - 1))
}

/// Splits the interval [addr, addr + size) into power-of-two blocks with proper alignment.
///
/// Blocks smaller than MIN_BLOCK_SIZE are dropped.
fn split_into_power_of_two_blocks(addr: u32, size: u32) -> Vec<(u32, u32)> {
    let mut blocks = Vec::new();
    let mut current_addr = addr;
    let mut remaining = size;
    while remaining > 0 {
        // Maximum block size allowed by the current address's alignment.
        let alignment_constraint = if current_addr == 0 {
            remaining
        } else {
            current_addr & (!current_addr).wrapping_add(1)
        };
        let largest_possible = 1 << (31 - remaining.leading_zeros());
        let mut block_size = alignment_constraint.min(largest_possible);
        while block_size > remaining {
            block_size /= 2;
        }
        if block_size >= MIN_BLOCK_SIZE {
            blocks.push((current_addr, block_size));
        }
        current_addr += block_size;
        remaining -= block_size;
    }
    blocks
}
