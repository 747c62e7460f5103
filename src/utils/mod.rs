pub mod media;
pub mod signal;
