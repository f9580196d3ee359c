// mod.rs - Data structures module

pub mod loaders;
pub mod read;

// Re-export main types for convenience
pub use loaders::{load_read_groups, LoaderOptions, UmiSource};
pub use read::{Read, ReadError, ReadGroup};
