//! Configuration Module - heap tuning parameters
//!
//! Manages the small set of parameters that affect heap and symbol-table
//! behavior. Unlike a generational collector there is no pause-time target
//! or thread count to tune; the knobs here are sizing constants for the
//! symbol table and a verbosity flag for GC logging.

/// Tuning options for a [`Heap`](crate::heap::Heap) and its symbol table.
///
/// # Examples
///
/// ```rust
/// use fgc::HeapOptions;
///
/// let opts = HeapOptions::default();
/// assert_eq!(opts.initial_symbol_table_entries, 128);
///
/// let verbose = HeapOptions { verbose: true, ..Default::default() };
/// assert!(verbose.verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeapOptions {
    /// Initial number of entries in a freshly created symbol table.
    /// Must be a power of two. Default: 128.
    pub initial_symbol_table_entries: u32,

    /// Maximum fraction of symbol-table entries that may be occupied
    /// before the table grows. Default: 0.9.
    pub symbol_table_max_load: f32,

    /// Log GC cycles and heap growth decisions via the `log` crate.
    /// Default: false.
    pub verbose: bool,
}

impl Default for HeapOptions {
    fn default() -> Self {
        HeapOptions {
            initial_symbol_table_entries: 128,
            symbol_table_max_load: 0.9,
            verbose: false,
        }
    }
}

impl HeapOptions {
    /// The WyHash seed used for all symbol-table hashing.
    ///
    /// A library constant (not user-tunable) so that hash codes computed
    /// before and after a save/reopen round trip agree.
    pub const HASH_SEED: u32 = 0xFE15_2280;
}
