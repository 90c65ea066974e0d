use std::{
    fmt::{self, Debug, Display},
    io::Read,
    ops::Deref,
};

use tracing::warn;

use crate::binary::{Deserialize, Deserializer, Error, ErrorKind, ResultContextExt, Strictness};

/// Lengths beyond this are assumed to be garbage read from a desynchronized
/// stream. Lenient readers log and carry on; strict readers reject.
const MAX_SANE_LENGTH: usize = 4096;

/// A length-prefixed string as Unreal serializes it: a signed 32-bit length,
/// then that many 8-bit characters (length >= 0) or UTF-16LE code units
/// (length < 0), NUL-terminated.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct UnrealString {
    text: String,
}

impl UnrealString {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl Deref for UnrealString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.text
    }
}

impl Debug for UnrealString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.text, f)
    }
}

impl Display for UnrealString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.text, f)
    }
}

impl From<String> for UnrealString {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for UnrealString {
    fn from(text: &str) -> Self {
        Self { text: text.to_owned() }
    }
}

/// Drops the terminator, then any stray padding NULs before it.
fn strip_terminated<T: Copy + PartialEq>(units: &[T], nul: T) -> &[T] {
    let units = units.split_last().map_or(units, |(_, rest)| rest);
    let end = units.iter().rposition(|&unit| unit != nul).map_or(0, |i| i + 1);
    &units[..end]
}

impl Deserialize for UnrealString {
    fn deserialize(deserializer: &mut Deserializer<impl Read>) -> Result<Self, Error> {
        let length = deserializer
            .deserialize::<i32>()
            .context("cannot read string length")?;
        let unit_count = length.unsigned_abs() as usize;
        if unit_count > MAX_SANE_LENGTH {
            match deserializer.strictness() {
                Strictness::Strict => {
                    return Err(ErrorKind::Deserialize.make(format!(
                        "suspicious string length {length} (limit is {MAX_SANE_LENGTH} units)"
                    )));
                }
                Strictness::Lenient => {
                    warn!("suspicious string length {length} (limit is {MAX_SANE_LENGTH} units)");
                }
            }
        }

        let text = if length < 0 {
            let mut bytes = vec![0; unit_count * 2];
            deserializer
                .read_bytes(&mut bytes)
                .with_context(|| format!("cannot read UTF-16 string of {unit_count} units"))?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(strip_terminated(&units, 0))
        } else {
            let mut bytes = vec![0; unit_count];
            deserializer
                .read_bytes(&mut bytes)
                .with_context(|| format!("cannot read string of length {unit_count}"))?;
            String::from_utf8_lossy(strip_terminated(&bytes, 0)).into_owned()
        };
        Ok(Self { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::deserialize;

    #[test]
    fn eight_bit_string_drops_the_terminator() {
        let buffer = [4u8, 0, 0, 0, b'H', b'i', b'!', 0];
        assert_eq!(deserialize::<UnrealString>(&buffer).unwrap().as_str(), "Hi!");
    }

    #[test]
    fn stray_byte_after_the_terminator_is_dropped_too() {
        let buffer = [5u8, 0, 0, 0, b'H', b'i', b'!', 0, b'?'];
        assert_eq!(deserialize::<UnrealString>(&buffer).unwrap().as_str(), "Hi!");
    }

    #[test]
    fn negative_length_reads_utf16_code_units() {
        let mut buffer = vec![0xFAu8, 0xFF, 0xFF, 0xFF]; // -6
        for unit in [0x48u16, 0xE9, 0x6C, 0x6C, 0x6F, 0] {
            buffer.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(
            deserialize::<UnrealString>(&buffer).unwrap().as_str(),
            "Héllo"
        );
    }

    #[test]
    fn zero_length_is_an_empty_string() {
        let buffer = [0u8, 0, 0, 0];
        assert_eq!(deserialize::<UnrealString>(&buffer).unwrap().as_str(), "");
    }

    #[test]
    fn suspicious_length_is_fatal_only_when_strict() {
        let length = (MAX_SANE_LENGTH + 1) as u32;
        let mut buffer = length.to_le_bytes().to_vec();
        buffer.extend(std::iter::repeat(b'a').take(MAX_SANE_LENGTH));
        buffer.push(0);

        let lenient = deserialize::<UnrealString>(&buffer).unwrap();
        assert_eq!(lenient.len(), MAX_SANE_LENGTH);

        let mut strict =
            Deserializer::from_buffer(buffer.as_slice()).with_strictness(Strictness::Strict);
        let error = strict.deserialize::<UnrealString>().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Deserialize);
    }

    #[test]
    fn truncated_string_is_unexpected_eof() {
        let buffer = [10u8, 0, 0, 0, b'a', b'b'];
        let error = deserialize::<UnrealString>(&buffer).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnexpectedEof);
    }
}
