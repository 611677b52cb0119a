pub mod file;
pub mod hash;
pub mod memory;
pub mod prompt;
pub mod time;
