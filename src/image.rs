use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::io::{FormatError, WordFormat, read_vmem, write_vmem};
use crate::{Error, Segment};

/// A sparse memory image: segments in the order they were read or added.
///
/// Segments are not sorted and may overlap. `find_overlap()` reports the
/// first overlapping pair. Where segments overlap, the later one wins, the
/// same as replaying them into memory in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    segments: Vec<Segment>,
}

impl Image {
    pub fn new() -> Self {
        Self { segments: vec![] }
    }

    /// Wrap raw bytes in a single segment at `offset`.
    ///
    /// Fails with `FormatError::AddressOverflow` if the bytes run past 4 GiB.
    pub fn from_bytes(bytes: Vec<u8>, offset: u32) -> Result<Self, FormatError> {
        let mut image = Self::new();
        image.append_bytes(bytes, offset)?;
        Ok(image)
    }

    pub fn with_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse memory image text from any reader.
    pub fn parse<R: Read>(reader: R) -> Result<Self, Error> {
        let segments = read_vmem(BufReader::new(reader))?;
        Ok(Self { segments })
    }

    pub fn parse_str(text: &str) -> Result<Self, Error> {
        Self::parse(text.as_bytes())
    }

    /// Open and parse a memory image file. The file is closed before returning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("loading {}", path.display());
        let file = File::open(path)?;
        Self::parse(file)
    }

    /// Parse more segments onto the end of this image.
    ///
    /// On error the image is left exactly as it was.
    pub fn extend_from_reader<R: Read>(&mut self, reader: R) -> Result<(), Error> {
        let parsed = read_vmem(BufReader::new(reader))?;
        self.segments.extend(parsed);
        Ok(())
    }

    pub fn append_bytes(&mut self, bytes: Vec<u8>, offset: u32) -> Result<(), FormatError> {
        let mut segment = Segment::new(offset, Vec::new());
        segment.append_bytes(&bytes)?;
        self.segments.push(segment);
        Ok(())
    }

    pub fn append_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.segments.iter().map(Segment::size).sum()
    }

    pub fn min_address(&self) -> Option<u32> {
        self.segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(Segment::base_address)
            .min()
    }

    /// Exclusive end of the highest non-empty segment.
    pub fn max_end_address(&self) -> Option<u64> {
        self.segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(Segment::end_address)
            .max()
    }

    /// Read a single byte. The last segment covering `addr` wins.
    pub fn read_byte(&self, addr: u32) -> Option<u8> {
        self.segments
            .iter()
            .rev()
            .find(|seg| seg.contains(addr))
            .map(|seg| seg.bytes()[(addr - seg.base_address()) as usize])
    }

    /// Indices of the first pair of segments that share an address.
    pub fn find_overlap(&self) -> Option<(usize, usize)> {
        for (i, a) in self.segments.iter().enumerate() {
            for (j, b) in self.segments.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// All lines of the image, segment by segment.
    pub fn to_text(&self, format: &WordFormat) -> Result<Vec<String>, Error> {
        let mut lines = Vec::new();
        for segment in &self.segments {
            lines.extend(segment.to_text_words(format)?);
        }
        Ok(lines)
    }

    pub fn write_to<W: Write>(&self, out: &mut W, format: &WordFormat) -> Result<(), Error> {
        write_vmem(&self.segments, out, format)
    }

    /// Print the image to stdout with the default word format.
    pub fn dump(&self) -> Result<(), Error> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.write_to(&mut out, &WordFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use super::*;

    #[test]
    fn test_from_bytes_single_segment() {
        let image = Image::from_bytes(vec![0x01, 0x02], 0x100).unwrap();
        assert_eq!(image.segments().len(), 1);
        assert_eq!(image.segments()[0].base_address(), 0x100);
        assert_eq!(image.segments()[0].bytes(), &[0x01, 0x02]);
    }

    #[test]
    fn test_from_bytes_past_top_of_memory() {
        let image = Image::from_bytes(vec![0x01], 0xFFFF_FFFF).unwrap();
        assert_eq!(image.max_end_address(), Some(1 << 32));

        assert!(matches!(
            Image::from_bytes(vec![0x01, 0x02], 0xFFFF_FFFF),
            Err(FormatError::AddressOverflow(_))
        ));

        let mut image = Image::new();
        assert!(image.append_bytes(vec![0; 0x20], 0xFFFF_FFF0).is_err());
        assert!(image.is_empty());
    }

    #[test]
    fn test_to_text_default_format() {
        let mut image = Image::from_bytes(vec![0x01, 0x23, 0x45, 0x67], 0).unwrap();
        image
            .append_bytes(vec![0xEF, 0xBE, 0xAD, 0xDE], 0x20)
            .unwrap();
        assert_eq!(
            image.to_text(&WordFormat::default()).unwrap(),
            vec!["@00000000 67452301", "@00000020 deadbeef"]
        );
    }

    #[test]
    fn test_extend_from_reader_is_atomic() {
        let mut image = Image::parse_str("@0 aa\n").unwrap();
        let before = image.clone();

        let result = image.extend_from_reader("@10 bb\n@20 cc\nxyz\n".as_bytes());
        assert!(result.is_err());
        assert_eq!(image, before);

        image.extend_from_reader("@10 bb\n".as_bytes()).unwrap();
        assert_eq!(image.segments().len(), 2);
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("device gone"));
            }
            self.served = true;
            let data = b"@0 00\n";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    #[test]
    fn test_io_error_propagates() {
        let result = Image::parse(FailingReader { served: false });
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_read_byte_last_segment_wins() {
        let image = Image::with_segments(vec![
            Segment::new(0x100, vec![0xAA, 0xBB]),
            Segment::new(0x101, vec![0xFF, 0xCC]),
        ]);
        assert_eq!(image.read_byte(0x100), Some(0xAA));
        assert_eq!(image.read_byte(0x101), Some(0xFF));
        assert_eq!(image.read_byte(0x102), Some(0xCC));
        assert_eq!(image.read_byte(0x103), None);
    }

    #[test]
    fn test_find_overlap() {
        let disjoint = Image::with_segments(vec![
            Segment::new(0x200, vec![0; 4]),
            Segment::new(0x100, vec![0; 0x100]),
        ]);
        assert_eq!(disjoint.find_overlap(), None);

        let overlapping = Image::with_segments(vec![
            Segment::new(0x000, vec![0; 4]),
            Segment::new(0x100, vec![0; 0x10]),
            Segment::new(0x10F, vec![0]),
        ]);
        assert_eq!(overlapping.find_overlap(), Some((1, 2)));
    }

    #[test]
    fn test_address_bounds_ignore_empty_segments() {
        let image = Image::with_segments(vec![
            Segment::new(0x10, vec![]),
            Segment::new(0x40, vec![0; 4]),
            Segment::new(0x20, vec![0; 2]),
        ]);
        assert_eq!(image.min_address(), Some(0x20));
        assert_eq!(image.max_end_address(), Some(0x44));
        assert_eq!(image.total_bytes(), 6);
    }
}
