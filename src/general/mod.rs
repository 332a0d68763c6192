pub mod check;
pub mod rescale;
pub mod stdin_handler;
