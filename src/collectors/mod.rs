pub mod filesystem;
pub mod process;
