//! Reference document adapters.

mod file_library;

pub use file_library::{media_type_for, FileReferenceLibrary};
