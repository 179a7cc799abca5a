pub mod error;
pub mod grid;
pub mod pbm;
pub mod fill;
pub mod config;
pub mod pipeline;
