//! The arena heap.
//!
//! A `Heap` owns a fixed-capacity, contiguous byte buffer holding a 12-byte
//! serializable header followed by a bump-allocated sequence of
//! [`Block`]s. It is relocatable: its bytes can be copied verbatim to disk
//! (or anywhere else) and later reopened with [`Heap::existing`].

use crate::block::{Block, Type};
use crate::config::HeapOptions;
use crate::error::{HeapError, Result};
use crate::handle::{HandleSlots, SharedHandleSlots};
use crate::object::Growable;
use crate::slice::HeapSlice;
use crate::val::Val;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Magic number stamped at byte offset 0 of every valid heap.
pub const MAGIC: u32 = 0xA189_933A;
/// Size in bytes of the fixed header (magic, root offset, symbol-table offset).
pub const HEADER_SIZE: usize = 12;
/// Largest capacity a heap may have: offsets must fit a 31-bit intra-heap pointer.
pub const MAX_CAPACITY: usize = 1 << 31;

/// Callback invoked when [`Heap::alloc_block`] runs out of space.
///
/// Receives the heap and the number of bytes that were needed. It may run
/// the GC, extend the heap's usable window (see [`Heap::resize`]), or both,
/// then return `true` to ask the allocator to retry. Returning `false`, or
/// failing to actually increase the available space, aborts the
/// allocation and `alloc_block` returns `None`.
pub type AllocFailureHandler = Box<dyn FnMut(&mut Heap, u32) -> bool>;

/// A fixed-capacity, bump-allocated, relocatable heap of [`Block`]s.
pub struct Heap {
    /// Backing storage. Always exactly `cap` bytes long for the heap's
    /// entire lifetime -- growing is modeled only by moving `end` forward
    /// within this fixed allocation, so outstanding [`Block`] pointers are
    /// never invalidated by a `Vec` reallocation.
    buf: Vec<u8>,
    cap: usize,
    /// Usable end of the heap; `end <= cap`. Moved by [`Heap::resize`].
    end: usize,
    /// Bump allocation cursor; `HEADER_SIZE <= cur <= end`.
    cur: usize,
    alloc_failure_handler: Option<AllocFailureHandler>,
    handles: SharedHandleSlots,
    options: HeapOptions,
}

impl Heap {
    /// Allocates a new empty heap of `capacity` bytes, with default
    /// [`HeapOptions`]. Use [`Heap::with_options`] to override tuning
    /// constants such as the initial symbol-table size.
    pub fn new(capacity: usize) -> Result<Heap> {
        Heap::with_options(capacity, HeapOptions::default())
    }

    /// As [`Heap::new`], but with caller-supplied [`HeapOptions`].
    pub fn with_options(capacity: usize, options: HeapOptions) -> Result<Heap> {
        if capacity < HEADER_SIZE {
            return Err(HeapError::InvalidArgument(format!(
                "capacity {capacity} is smaller than the {HEADER_SIZE}-byte header"
            )));
        }
        if capacity > MAX_CAPACITY {
            return Err(HeapError::InvalidArgument(format!(
                "capacity {capacity} exceeds the maximum of {MAX_CAPACITY}"
            )));
        }
        let mut heap = Heap {
            buf: vec![0u8; capacity],
            cap: capacity,
            end: capacity,
            cur: 0,
            alloc_failure_handler: None,
            handles: Rc::new(RefCell::new(HandleSlots::new())),
            options,
        };
        heap.reset();
        Ok(heap)
    }

    /// An invalid, zero-capacity heap, as returned by [`Heap::existing`]
    /// when validation fails. `valid()` is `false` and every other method
    /// panics or is meaningless; callers must check `valid()` first.
    fn invalid() -> Heap {
        Heap {
            buf: Vec::new(),
            cap: 0,
            end: 0,
            cur: 0,
            alloc_failure_handler: None,
            handles: Rc::new(RefCell::new(HandleSlots::new())),
            options: HeapOptions::default(),
        }
    }

    pub fn options(&self) -> HeapOptions {
        self.options
    }

    pub fn set_options(&mut self, options: HeapOptions) {
        self.options = options;
    }

    /// Reconstructs a heap from previously-saved bytes (as produced by
    /// [`Heap::save`]). `capacity` is the eventual usable capacity, which
    /// may exceed `bytes.len()`. Returns an invalid heap (`valid() ==
    /// false`) if the magic number or root offset fail validation; no
    /// deeper content validation is performed.
    pub fn existing(bytes: Vec<u8>, capacity: usize) -> Heap {
        Heap::existing_with_options(bytes, capacity, HeapOptions::default())
    }

    /// As [`Heap::existing`], but with caller-supplied [`HeapOptions`]
    /// (not part of the persisted format, so these are not recovered from
    /// `bytes` itself).
    pub fn existing_with_options(bytes: Vec<u8>, capacity: usize, options: HeapOptions) -> Heap {
        if bytes.len() < HEADER_SIZE || capacity < bytes.len() || capacity > MAX_CAPACITY {
            return Heap::invalid();
        }
        let mut buf = bytes;
        buf.resize(capacity, 0);
        let used = buf.len().min(capacity);
        let heap = Heap {
            buf,
            cap: capacity,
            end: capacity,
            cur: used,
            alloc_failure_handler: None,
            handles: Rc::new(RefCell::new(HandleSlots::new())),
            options,
        };

        let used_len = heap.cur;
        if u32::from_le_bytes(heap.buf[0..4].try_into().unwrap()) != MAGIC {
            return Heap::invalid();
        }
        let root = u32::from_le_bytes(heap.buf[4..8].try_into().unwrap());
        if root != 0 && !(root as usize >= HEADER_SIZE && (root as usize) < used_len) {
            return Heap::invalid();
        }
        heap
    }

    /// Whether this heap is a well-formed, usable heap. A default-ish
    /// invalid heap is produced by a failed [`Heap::existing`] call.
    pub fn valid(&self) -> bool {
        self.cap != 0
    }

    /// Resets to an empty heap: writes a fresh header and rewinds the
    /// bump cursor. Drops the symbol table reference (the caller will
    /// recreate one lazily on first symbol creation).
    fn reset(&mut self) {
        self.cur = 0;
        let ptr = self.raw_alloc(HEADER_SIZE as u32).expect("capacity >= HEADER_SIZE was checked");
        unsafe {
            std::ptr::copy_nonoverlapping(MAGIC.to_le_bytes().as_ptr(), ptr, 4);
            std::ptr::write_bytes(ptr.add(4), 0, 8);
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn used(&self) -> usize {
        self.cur
    }

    pub fn remaining(&self) -> usize {
        self.end - self.cur
    }

    pub fn available(&self) -> usize {
        self.remaining()
    }

    /// Moves the usable-end pointer. Succeeds only if `new_end` stays
    /// within `[used(), capacity()]`; the backing allocation itself never
    /// changes size, so this can never invalidate outstanding `Block`s.
    pub fn resize(&mut self, new_end: usize) -> bool {
        if new_end < self.cur || new_end > self.cap {
            return false;
        }
        self.end = new_end;
        true
    }

    // ---- Header fields ----

    fn header_field(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.buf[offset..offset + 4].try_into().unwrap())
    }

    fn set_header_field(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn root_offset(&self) -> u32 {
        self.header_field(4)
    }

    pub(crate) fn set_root_offset(&mut self, offset: u32) {
        self.set_header_field(4, offset);
    }

    pub fn root_val(&self) -> Val {
        match self.root_offset() {
            0 => Val::NULL,
            pos => Val::object(pos),
        }
    }

    pub fn root_value(&self) -> Value {
        Value::new(self.root_val(), self)
    }

    /// Sets the heap's root value. `val` must be null or an object
    /// reference into this same heap.
    pub fn set_root(&mut self, val: Val) {
        self.set_root_offset(if val.is_object() { val.as_offset() } else { 0 });
    }

    pub(crate) fn symbol_table_offset(&self) -> u32 {
        self.header_field(8)
    }

    pub(crate) fn set_symbol_table_offset(&mut self, offset: u32) {
        self.set_header_field(8, offset);
    }

    pub fn symbol_table_val(&self) -> Val {
        match self.symbol_table_offset() {
            0 => Val::NULL,
            pos => Val::object(pos),
        }
    }

    pub fn set_symbol_table_val(&mut self, val: Val) {
        self.set_symbol_table_offset(if val.is_object() { val.as_offset() } else { 0 });
    }

    // ---- Address translation ----

    pub fn valid_pos(&self, pos: u32) -> bool {
        pos as usize >= HEADER_SIZE && (pos as usize) < self.cur
    }

    /// Resolves a block header living at byte offset `pos` in this heap.
    ///
    /// Panics (in debug builds) if `pos` isn't within the allocated range;
    /// release builds trust the offset came from a valid `Val` or prior
    /// iteration and skip the check for speed.
    pub fn block_at(&self, pos: u32) -> Block {
        debug_assert!(self.valid_pos(pos), "offset {pos} out of range");
        // SAFETY: `buf` is pinned for this heap's lifetime (never reallocated),
        // and `pos` addresses a block header previously written by this heap.
        unsafe { Block::at(self.buf.as_ptr().add(pos as usize) as *mut u8) }
    }

    pub fn offset_of(&self, block: Block) -> u32 {
        let base = self.buf.as_ptr() as usize;
        let addr = block.as_ptr() as usize;
        debug_assert!(addr >= base && addr < base + self.cap);
        (addr - base) as u32
    }

    pub fn contains(&self, block: Block) -> bool {
        let base = self.buf.as_ptr() as usize;
        let addr = block.as_ptr() as usize;
        addr >= base + HEADER_SIZE && addr < base + self.cur
    }

    // ---- Allocation ----

    fn raw_alloc(&mut self, size: u32) -> Option<*mut u8> {
        let size = size as usize;
        if self.cur + size <= self.end {
            let ptr = unsafe { self.buf.as_mut_ptr().add(self.cur) };
            self.cur += size;
            Some(ptr)
        } else {
            self.raw_alloc_failed(size)
        }
    }

    fn raw_alloc_failed(&mut self, size: usize) -> Option<*mut u8> {
        let mut handler = self.alloc_failure_handler.take();
        let result = loop {
            let Some(h) = handler.as_mut() else { break None };
            let avail_before = self.end - self.cur;
            if self.options.verbose {
                log::debug!(
                    "heap full: {size} bytes requested, {avail_before} available; invoking failure handler"
                );
            }
            if !(h)(self, size as u32) {
                break None;
            }
            let avail_after = self.end - self.cur;
            if avail_after <= avail_before {
                log::warn!("allocation-failure handler did not increase available space");
                break None;
            }
            if self.cur + size <= self.end {
                let ptr = unsafe { self.buf.as_mut_ptr().add(self.cur) };
                self.cur += size;
                break Some(ptr);
            }
            // Handler helped but not enough yet; loop and ask again.
        };
        self.alloc_failure_handler = handler;
        if result.is_none() {
            log::error!("heap allocation failed: {size} bytes requested, {} available", self.remaining());
        }
        result
    }

    /// Installs the allocation-failure handler (see [`AllocFailureHandler`]).
    pub fn set_alloc_failure_handler(
        &mut self,
        handler: impl FnMut(&mut Heap, u32) -> bool + 'static,
    ) {
        self.alloc_failure_handler = Some(Box::new(handler));
    }

    pub fn clear_alloc_failure_handler(&mut self) {
        self.alloc_failure_handler = None;
    }

    /// Allocates a block with `data_size` bytes of uninitialized (zeroed)
    /// payload. Returns `None` if the heap is full and either has no
    /// failure handler or the handler could not free enough space.
    pub fn alloc_block(&mut self, data_size: u32, ty: Type) -> Option<Block> {
        if data_size > crate::block::MAX_DATA_SIZE {
            return None;
        }
        let total = Block::total_size(data_size);
        let ptr = self.raw_alloc(total)?;
        let (block, _) = unsafe { Block::init(ptr, data_size, ty) };
        Some(block)
    }

    /// As [`Heap::alloc_block`], but additionally copies `contents` into
    /// the start of the new block's payload (the rest stays zeroed).
    pub fn alloc_block_with(&mut self, data_size: u32, ty: Type, contents: &[u8]) -> Option<Block> {
        debug_assert!(contents.len() as u32 <= data_size);
        let block = self.alloc_block(data_size, ty)?;
        unsafe {
            block.data_mut()[..contents.len()].copy_from_slice(contents);
        }
        Some(block)
    }

    /// Reallocates `container` at `new_capacity`, copies its live entries
    /// across, and returns the new handle. `new_capacity` must exceed
    /// `container`'s current capacity; fails (returns `None`) if the
    /// larger container itself can't be allocated.
    ///
    /// The old container is left in place, unreferenced -- it becomes
    /// ordinary garbage for the next collection to reclaim.
    pub fn grow<T: Growable>(&mut self, container: T, new_capacity: u32) -> Option<T> {
        debug_assert!(new_capacity > container.capacity());
        let grown = T::allocate(self, new_capacity)?;
        container.copy_into(&grown);
        Some(grown)
    }

    // ---- Iteration ----

    fn first_block_offset(&self) -> Option<u32> {
        if self.cur > HEADER_SIZE {
            Some(HEADER_SIZE as u32)
        } else {
            None
        }
    }

    /// Walks every block in allocation order, live or not, from the
    /// header to the bump cursor.
    pub fn visit_all(&self, mut f: impl FnMut(Block)) {
        let Some(mut offset) = self.first_block_offset() else { return };
        while (offset as usize) < self.cur {
            let block = self.block_at(offset);
            f(block);
            offset = block.next_block_offset(offset);
        }
    }

    /// Every external handle value currently registered, object or not.
    pub(crate) fn handle_table(&self) -> SharedHandleSlots {
        self.handles.clone()
    }

    pub fn register_handle(&self, val: Val) -> crate::handle::HandleId {
        self.handles.borrow_mut().insert(val)
    }

    /// Root set for reachability: the root block, the symbol-table array,
    /// and every registered handle that currently holds an object `Val`.
    fn root_vals(&self) -> Vec<Val> {
        let mut roots = Vec::new();
        if self.root_offset() != 0 {
            roots.push(self.root_val());
        }
        if self.symbol_table_offset() != 0 {
            roots.push(self.symbol_table_val());
        }
        for (_, v) in self.handles.borrow().iter() {
            if v.is_object() {
                roots.push(v);
            }
        }
        roots
    }

    /// Performs a reachability traversal from every root and calls `f`
    /// once per reachable block. Clears the `visited` flag on every block
    /// both before and after the walk, so it never leaks into later calls.
    pub fn visit(&self, mut f: impl FnMut(Block)) {
        self.visit_all(|b| b.clear_visited());

        let mut stack = Vec::new();
        let mut visit_one = |block: Block, f: &mut dyn FnMut(Block)| {
            if !block.is_visited() {
                block.set_visited();
                f(block);
                if block.type_().holds_vals() && block.data_size() > 0 {
                    stack.push(block);
                }
            }
        };

        for root in self.root_vals() {
            if root.is_object() {
                visit_one(self.block_at(root.as_offset()), &mut f);
            }
        }

        while let Some(block) = stack.pop() {
            let vals = unsafe { self.block_vals(block) };
            for i in 0..vals.len() {
                let v = unsafe { vals.get_unchecked(i) };
                if v.is_object() {
                    visit_one(self.block_at(v.as_offset()), &mut f);
                }
            }
        }

        self.visit_all(|b| b.clear_visited());
    }

    /// Reinterprets a container block's payload as a view of `Val`s.
    ///
    /// The payload follows a byte-packed 2- or 4-byte header, so it is
    /// frequently not 4-aligned; callers must go through
    /// [`HeapSlice::get_unchecked`]/[`HeapSlice::set_unchecked`] (unaligned
    /// reads/writes) rather than materializing a `&[Val]`.
    ///
    /// # Safety
    /// `block` must be a container type ([`Type::holds_vals`]) belonging
    /// to this heap.
    pub(crate) unsafe fn block_vals(&self, block: Block) -> HeapSlice<Val> {
        debug_assert!(block.type_().holds_vals());
        HeapSlice::new(block.data_ptr(), block.data_size() / 4)
    }

    /// # Safety
    /// Same preconditions as [`Heap::block_vals`].
    pub(crate) unsafe fn block_vals_mut(&self, block: Block) -> HeapSlice<Val> {
        self.block_vals(block)
    }

    // ---- Persistence ----

    /// Returns the heap's used bytes (`[0, used())`), suitable for writing
    /// to disk and later reopening with [`Heap::existing`].
    pub fn to_bytes(&self) -> &[u8] {
        &self.buf[..self.cur]
    }

    /// Convenience wrapper writing [`Heap::to_bytes`] to `path`.
    pub fn save_to(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Convenience wrapper reading `path` and calling [`Heap::existing`].
    pub fn load_from(path: impl AsRef<std::path::Path>, capacity: usize) -> Result<Heap> {
        let bytes = std::fs::read(path)?;
        let heap = Heap::existing(bytes, capacity);
        if !heap.valid() {
            return Err(HeapError::InvalidHeap { reason: "bad magic or root offset".into() });
        }
        Ok(heap)
    }

    /// Replaces this heap's backing storage with `other`'s, and vice
    /// versa. Used by the GC to make the freshly-collected to-heap become
    /// the "live" heap while keeping the caller's `Heap` handle stable.
    pub(crate) fn swap_storage_with(&mut self, other: &mut Heap) {
        std::mem::swap(&mut self.buf, &mut other.buf);
        std::mem::swap(&mut self.cap, &mut other.cap);
        std::mem::swap(&mut self.end, &mut other.end);
        std::mem::swap(&mut self.cur, &mut other.cur);
        // alloc_failure_handler and handles belong to the Heap value
        // itself, not its storage, so they are deliberately not swapped.
    }
}
