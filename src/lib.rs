pub mod backdoor;
pub mod endpoint;
pub mod error;
pub mod image;
pub mod io;
pub mod segment;

pub use backdoor::{
    BackdoorError, Connect, MemoryBackdoor, SparseMemory, read_segment, with_connection,
    write_image, write_segment,
};
pub use endpoint::{DEFAULT_BACKDOOR_PORT, Endpoint, EndpointError, Host};
pub use error::Error;
pub use image::Image;
pub use io::{AddressStep, FormatError, WordFormat, read_vmem, write_vmem};
pub use segment::{Payload, Segment};
