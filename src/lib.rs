pub mod api;
pub mod cli;
pub mod core;
pub mod guest;
pub mod llm;
