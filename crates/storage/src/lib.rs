#![forbid(unsafe_code)]

pub mod atomic;
pub mod error;
pub mod git;
pub mod index;
pub mod paths;
pub mod timestamps;
pub mod working_memory;

pub use error::StoreError;
pub use index::{build_index, load_index, load_index_fresh};
pub use working_memory::{add_entry, clear_working_memory, format_working_memory, load_working_memory};
