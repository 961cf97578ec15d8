// src/models/mod.rs
pub mod driver;
pub mod history;
pub mod passenger;
pub mod ride;

pub use driver::*;
pub use history::*;
pub use passenger::*;
pub use ride::*;
