pub mod errno;
pub mod fs;
