// Utility Module
// File helpers shared by the cipher and the command line

pub mod file_ops;

pub use file_ops::{format_file_size, Progress};
