pub mod buf;
pub mod cli;
pub mod filename;
pub mod hash;
pub mod png;
pub mod stamp;
