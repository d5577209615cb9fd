pub mod align;
pub mod cli;
pub mod commands;
pub mod io;
pub mod project;
pub mod utils;
