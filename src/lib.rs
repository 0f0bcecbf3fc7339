pub mod calc;
pub mod check;
pub mod checkpoint;
pub mod command;
pub mod error;
pub mod launch;
pub mod mcstas;
pub mod params;

pub use error::{CalcError, ErrorClass, Result};

#[cfg(test)]
mod test;
