pub mod filesystem;
pub mod outcome;
pub mod request;
