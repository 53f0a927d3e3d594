#![forbid(unsafe_code)]

mod mission;
mod records;

pub use mission::*;
pub use records::*;
