mod core;
pub mod gemini;
pub mod openai;

pub use core::*;
