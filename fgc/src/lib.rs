//! `fgc`: a compact, relocatable, copying-GC managed heap.
//!
//! The heap is a single contiguous byte buffer holding a 12-byte header
//! (magic, root offset, symbol-table offset) followed by a packed sequence
//! of byte-aligned blocks, each tagged with one of eight [`block::Type`]s.
//! Allocation is bump-pointer; reclamation is a stop-the-world Cheney
//! semispace copy ([`gc::GarbageCollector::run`]) that relocates every
//! reachable block into a fresh heap of the same capacity and discards the
//! rest. Because blocks move, nothing outside the heap is allowed to hold
//! a raw pointer across a collection -- external code that needs a value
//! to survive a GC cycle registers a [`handle::Handle`] instead.
//!
//! ```
//! use fgc::{GarbageCollector, Heap, HeapString, Val};
//!
//! let mut heap = Heap::new(10_000).unwrap();
//! let greeting = HeapString::new(&mut heap, "hello").unwrap();
//! heap.set_root(Val::object(heap.offset_of(greeting.block())));
//!
//! GarbageCollector::run(&mut heap);
//!
//! let root = heap.root_value().as_kind::<HeapString>().unwrap();
//! assert_eq!(root.as_str(), "hello");
//! ```

pub mod block;
pub mod config;
pub mod current;
pub mod error;
pub mod gc;
pub mod handle;
pub mod heap;
#[cfg(feature = "json")]
pub mod json;
pub mod object;
pub mod slice;
pub mod symbol_table;
pub mod val;
pub mod value;

pub use block::{Block, Type};
pub use config::HeapOptions;
pub use current::{current_heap, UsingHeap};
pub use error::{HeapError, Result};
pub use gc::GarbageCollector;
pub use handle::{Handle, HandleId};
pub use heap::Heap;
#[cfg(feature = "json")]
pub use json::{parse as parse_json, stringify as to_json};
pub use object::{Array, BigInt, Blob, Dict, Float, HeapString, ObjectKind, Symbol, Vector};
pub use symbol_table::SymbolTable;
pub use val::Val;
pub use value::{Kind, Value};
