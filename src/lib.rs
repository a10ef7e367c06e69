//! Build a patched gdb with an embedded scripting runtime and launch it against
//! interpreter processes.

pub mod config;
pub mod error;
pub mod launcher;
pub mod layout;
pub mod log;
pub mod pipeline;
pub mod utils;
pub mod version;
