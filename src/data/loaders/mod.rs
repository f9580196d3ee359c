// mod.rs - Input loaders

pub mod alignment;

pub use alignment::{load_read_groups, LoaderOptions, UmiSource};
