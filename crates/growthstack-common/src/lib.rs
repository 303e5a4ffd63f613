pub mod gemini;
pub mod store;
