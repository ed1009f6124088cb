pub mod error;
pub mod exchange;
pub mod text;
