mod error;
mod vmem;

pub use error::FormatError;
pub use vmem::{AddressStep, WordFormat, read_vmem, write_vmem};
