// Utility functions

pub mod batch;
pub mod logger;

pub use batch::*;
pub use logger::*;
