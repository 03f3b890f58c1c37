use crate::Error;
use crate::io::{AddressStep, FormatError, WordFormat};

/// Input accepted by [`Segment::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw bytes, stored verbatim in memory order.
    Bytes(Vec<u8>),
    /// One line of whitespace separated big-endian hex words.
    Text(String),
}

impl Payload {
    /// Build a text payload from raw input that is expected to be text.
    pub fn text_from_utf8(raw: Vec<u8>) -> Result<Self, Error> {
        String::from_utf8(raw)
            .map(Payload::Text)
            .map_err(|e| Error::UnsupportedInput(format!("payload is not text: {e}")))
    }
}

/// A contiguous run of bytes anchored at a byte address.
///
/// `bytes()[i]` lives at `base_address() + i`. Bytes can only be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    base_address: u32,
    bytes: Vec<u8>,
}

impl Segment {
    pub fn new(base_address: u32, bytes: Vec<u8>) -> Self {
        debug_assert!(
            base_address as u64 + bytes.len() as u64 <= ADDRESS_SPACE,
            "segment exceeds the 32-bit address space"
        );
        Self {
            base_address,
            bytes,
        }
    }

    /// Create an empty segment from a hex address literal such as `"0000ff00"`.
    pub fn with_hex_offset(offset: &str) -> Result<Self, FormatError> {
        Ok(Self::new(parse_hex_offset(offset)?, Vec::new()))
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Exclusive upper bound. Wider than `u32` so a segment may end at the top of memory.
    pub fn end_address(&self) -> u64 {
        self.base_address as u64 + self.bytes.len() as u64
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.base_address && (address as u64) < self.end_address()
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        (self.base_address as u64) < other.end_address()
            && (other.base_address as u64) < self.end_address()
    }

    pub fn append(&mut self, payload: Payload) -> Result<(), FormatError> {
        match payload {
            Payload::Bytes(bytes) => self.append_bytes(&bytes),
            Payload::Text(line) => self.append_text_line(&line),
        }
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        let end = self.end_address() + bytes.len() as u64;
        if end > ADDRESS_SPACE {
            return Err(FormatError::AddressOverflow(format!(
                "{:#X} + {} exceeds u32",
                self.base_address,
                self.bytes.len() + bytes.len()
            )));
        }
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Append a line of hex words such as `"67452301 efcdab89"`.
    ///
    /// Each word is written most significant byte first and stored least
    /// significant byte first, so `"67452301"` appends `01 23 45 67`.
    /// Nothing is appended if any word on the line is malformed.
    pub fn append_text_line(&mut self, line: &str) -> Result<(), FormatError> {
        let mut decoded = Vec::new();
        for word in line.split_whitespace() {
            decode_word(word, &mut decoded)?;
        }
        if decoded.is_empty() {
            return Ok(());
        }
        self.append_bytes(&decoded)
    }

    /// Encode the stored bytes as addressed lines, one word per line.
    ///
    /// A trailing group shorter than `format.width` becomes a shorter word.
    pub fn to_text_words(&self, format: &WordFormat) -> Result<Vec<String>, FormatError> {
        if format.width == 0 {
            return Err(FormatError::InvalidWordWidth);
        }
        let increment = match format.step {
            AddressStep::Word => 1,
            AddressStep::Byte => format.width as u64,
        };

        let mut lines = Vec::with_capacity(self.bytes.len().div_ceil(format.width));
        let mut address = self.base_address as u64;
        for group in self.bytes.chunks(format.width) {
            let mut line = String::with_capacity(10 + group.len() * 2);
            line.push('@');
            push_hex_address(&mut line, address);
            line.push(' ');
            for &byte in group.iter().rev() {
                push_hex_byte(&mut line, byte);
            }
            lines.push(line);
            address += increment;
        }
        Ok(lines)
    }

    pub fn to_text_words_width(&self, width: usize) -> Result<Vec<String>, FormatError> {
        self.to_text_words(&WordFormat::with_width(width))
    }
}

const ADDRESS_SPACE: u64 = 1 << 32;
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

pub(crate) fn parse_hex_offset(offset: &str) -> Result<u32, FormatError> {
    if offset.is_empty() || !offset.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FormatError::InvalidOffset {
            line: 0,
            offset: offset.to_string(),
        });
    }
    u32::from_str_radix(offset, 16)
        .map_err(|_| FormatError::AddressOverflow(format!("offset {offset} exceeds u32")))
}

fn decode_word(word: &str, out: &mut Vec<u8>) -> Result<(), FormatError> {
    let invalid = |message: String| FormatError::InvalidWord {
        line: 0,
        word: word.to_string(),
        message,
    };

    let digits = word.as_bytes();
    if !digits.len().is_multiple_of(2) {
        return Err(invalid("odd number of hex digits".to_string()));
    }

    let start = out.len();
    for pair in digits.chunks_exact(2) {
        let hi = hex_value(pair[0])
            .ok_or_else(|| invalid(format!("invalid hex digit {:?}", pair[0] as char)))?;
        let lo = hex_value(pair[1])
            .ok_or_else(|| invalid(format!("invalid hex digit {:?}", pair[1] as char)))?;
        out.push((hi << 4) | lo);
    }
    out[start..].reverse();
    Ok(())
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

fn push_hex_byte(out: &mut String, byte: u8) {
    out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
    out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
}

fn push_hex_address(out: &mut String, address: u64) {
    for shift in (0..8).rev() {
        out.push(HEX_DIGITS[((address >> (shift * 4)) & 0x0F) as usize] as char);
    }
}
