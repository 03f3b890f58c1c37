//! Narrow interface to a memory backdoor service.
//!
//! The transport lives outside this crate. A connection only has to move
//! byte blocks; these helpers turn them into `Segment`s and `Image`s.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::{Endpoint, Image, Segment};

#[derive(Debug, Error)]
pub enum BackdoorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot connect to {endpoint}: {message}")]
    Connect { endpoint: Endpoint, message: String },

    #[error("access of {len} bytes at {address:#X} exceeds u32 address space")]
    AddressOverflow { address: u32, len: usize },
}

/// Byte-granular access to target memory.
pub trait MemoryBackdoor {
    fn read_block8(&mut self, address: u32, len: usize) -> Result<Vec<u8>, BackdoorError>;

    fn write_block8(&mut self, address: u32, data: &[u8]) -> Result<(), BackdoorError>;
}

/// A backdoor that is reached through an [`Endpoint`].
///
/// Dropping the connection closes it.
pub trait Connect: MemoryBackdoor + Sized {
    fn connect(endpoint: &Endpoint) -> Result<Self, BackdoorError>;
}

/// Open a connection, run `f` against it, and close it again on every path.
pub fn with_connection<C, T, F>(endpoint: &Endpoint, f: F) -> Result<T, BackdoorError>
where
    C: Connect,
    F: FnOnce(&mut C) -> Result<T, BackdoorError>,
{
    debug!("connecting to backdoor at {endpoint}");
    let mut connection = C::connect(endpoint)?;
    f(&mut connection)
}

pub fn read_segment<B: MemoryBackdoor + ?Sized>(
    backdoor: &mut B,
    address: u32,
    len: usize,
) -> Result<Segment, BackdoorError> {
    check_span(address, len)?;
    let data = backdoor.read_block8(address, len)?;
    Ok(Segment::new(address, data))
}

pub fn write_segment<B: MemoryBackdoor + ?Sized>(
    backdoor: &mut B,
    segment: &Segment,
) -> Result<(), BackdoorError> {
    if segment.is_empty() {
        return Ok(());
    }
    backdoor.write_block8(segment.base_address(), segment.bytes())
}

/// Write every segment in image order; later segments overwrite earlier ones.
pub fn write_image<B: MemoryBackdoor + ?Sized>(
    backdoor: &mut B,
    image: &Image,
) -> Result<(), BackdoorError> {
    for segment in image.segments() {
        write_segment(backdoor, segment)?;
    }
    Ok(())
}

fn check_span(address: u32, len: usize) -> Result<(), BackdoorError> {
    if address as u64 + len as u64 > 1 << 32 {
        return Err(BackdoorError::AddressOverflow { address, len });
    }
    Ok(())
}

/// In-process sparse memory. Unwritten bytes read back as `fill`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseMemory {
    bytes: BTreeMap<u32, u8>,
    fill: u8,
}

impl SparseMemory {
    pub fn new(fill: u8) -> Self {
        Self {
            bytes: BTreeMap::new(),
            fill,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Written bytes as an image of maximal contiguous segments, lowest address first.
    pub fn to_image(&self) -> Image {
        let mut runs: Vec<(u32, Vec<u8>)> = Vec::new();
        for (&addr, &byte) in &self.bytes {
            match runs.last_mut() {
                Some((start, data)) if *start as u64 + data.len() as u64 == addr as u64 => {
                    data.push(byte);
                }
                _ => runs.push((addr, vec![byte])),
            }
        }
        Image::with_segments(
            runs.into_iter()
                .map(|(start, data)| Segment::new(start, data))
                .collect(),
        )
    }
}

impl MemoryBackdoor for SparseMemory {
    fn read_block8(&mut self, address: u32, len: usize) -> Result<Vec<u8>, BackdoorError> {
        check_span(address, len)?;
        Ok((0..len)
            .map(|i| {
                let addr = address + i as u32;
                self.bytes.get(&addr).copied().unwrap_or(self.fill)
            })
            .collect())
    }

    fn write_block8(&mut self, address: u32, data: &[u8]) -> Result<(), BackdoorError> {
        check_span(address, data.len())?;
        for (i, &byte) in data.iter().enumerate() {
            self.bytes.insert(address + i as u32, byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_image_later_segment_wins() {
        let image = Image::with_segments(vec![
            Segment::new(0x100, vec![0x01, 0x02, 0x03]),
            Segment::new(0x101, vec![0xFF]),
            Segment::new(0x200, vec![]),
        ]);
        let mut mem = SparseMemory::new(0x00);
        write_image(&mut mem, &image).unwrap();
        assert_eq!(mem.len(), 3);
        assert_eq!(mem.read_block8(0x100, 4).unwrap(), vec![0x01, 0xFF, 0x03, 0x00]);
    }

    #[test]
    fn test_read_segment_uses_fill_for_gaps() {
        let mut mem = SparseMemory::new(0xEE);
        mem.write_block8(0x801, &[0xAA]).unwrap();
        let seg = read_segment(&mut mem, 0x800, 3).unwrap();
        assert_eq!(seg.base_address(), 0x800);
        assert_eq!(seg.bytes(), &[0xEE, 0xAA, 0xEE]);
    }

    #[test]
    fn test_to_image_merges_runs() {
        let mut mem = SparseMemory::default();
        mem.write_block8(0x10, &[1, 2]).unwrap();
        mem.write_block8(0x12, &[3]).unwrap();
        mem.write_block8(0x20, &[4]).unwrap();
        let image = mem.to_image();
        assert_eq!(image.segments().len(), 2);
        assert_eq!(image.segments()[0].base_address(), 0x10);
        assert_eq!(image.segments()[0].bytes(), &[1, 2, 3]);
        assert_eq!(image.segments()[1].base_address(), 0x20);
    }

    #[test]
    fn test_top_of_memory() {
        let mut mem = SparseMemory::default();
        mem.write_block8(0xFFFF_FFFF, &[0x5A]).unwrap();
        assert_eq!(mem.to_image().segments()[0].end_address(), 1 << 32);
        assert!(matches!(
            mem.write_block8(0xFFFF_FFFF, &[0, 0]),
            Err(BackdoorError::AddressOverflow { .. })
        ));
    }

    struct Loopback {
        mem: SparseMemory,
    }

    impl MemoryBackdoor for Loopback {
        fn read_block8(&mut self, address: u32, len: usize) -> Result<Vec<u8>, BackdoorError> {
            self.mem.read_block8(address, len)
        }

        fn write_block8(&mut self, address: u32, data: &[u8]) -> Result<(), BackdoorError> {
            self.mem.write_block8(address, data)
        }
    }

    impl Connect for Loopback {
        fn connect(endpoint: &Endpoint) -> Result<Self, BackdoorError> {
            if endpoint.port == 0 {
                return Err(BackdoorError::Connect {
                    endpoint: *endpoint,
                    message: "refused".to_string(),
                });
            }
            let mut mem = SparseMemory::default();
            mem.write_block8(0x80_0000, &[0x01, 0x23, 0x45, 0x67])?;
            Ok(Self { mem })
        }
    }

    #[test]
    fn test_with_connection_reads_block() {
        let seg = with_connection::<Loopback, _, _>(&Endpoint::default(), |bd| {
            read_segment(bd, 0x80_0000, 4)
        })
        .unwrap();
        assert_eq!(seg.to_text_words_width(4).unwrap(), vec!["@00800000 67452301"]);
    }

    #[test]
    fn test_with_connection_refused() {
        let endpoint: Endpoint = "localhost:0".parse().unwrap();
        let result = with_connection::<Loopback, (), _>(&endpoint, |_| Ok(()));
        assert!(matches!(result, Err(BackdoorError::Connect { .. })));
    }
}
