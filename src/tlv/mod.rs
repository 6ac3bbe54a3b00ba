pub mod decoders;
pub mod dol;
pub mod elements;
pub mod errors;
#[cfg(test)]
mod tests;
mod types;

pub use self::decoders::{read_all, read_field};
pub use self::errors::DecodeError;
pub use self::types::*;
