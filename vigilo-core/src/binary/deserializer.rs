use std::{
    io::{Cursor, Read, Seek, SeekFrom},
    ops::Deref,
};

use super::{Error, ErrorKind, ResultContextExt};

/// How much latitude the reader gives malformed-looking data that is not
/// structurally fatal (currently: implausibly long string lengths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    #[default]
    Lenient,
    Strict,
}

/// A position-tracking cursor over a byte stream. The invariant
/// `0 <= stream_position <= stream_length` holds at all times; the stream is
/// at its end exactly when the two are equal.
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<R> {
    stream_length: u64,
    stream_position: u64,
    strictness: Strictness,
    stream: R,
}

impl<R> Deserializer<R> {
    pub fn stream_length(&self) -> u64 {
        self.stream_length
    }

    pub fn stream_position(&self) -> u64 {
        self.stream_position
    }

    pub fn end_of_stream(&self) -> bool {
        self.stream_position == self.stream_length
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn read_bytes(&mut self, out_bytes: &mut [u8]) -> Result<(), Error>
    where
        R: Read,
    {
        self.stream
            .read_exact(out_bytes)
            .map_err(|error| {
                let kind = match error.kind() {
                    std::io::ErrorKind::UnexpectedEof => ErrorKind::UnexpectedEof,
                    _ => ErrorKind::Deserialize,
                };
                kind.make(error.to_string())
            })
            .with_context(|| format!("at stream position {:08x}", self.stream_position))?;
        self.stream_position += out_bytes.len() as u64;
        Ok(())
    }

    /// Seek to a new position. Targets outside `[0, stream_length]` are
    /// rejected with `InvalidPosition`.
    pub fn seek(&mut self, whence: SeekFrom) -> Result<u64, Error>
    where
        R: Seek,
    {
        let target = match whence {
            SeekFrom::Start(position) => position as i128,
            SeekFrom::Current(delta) => self.stream_position as i128 + delta as i128,
            SeekFrom::End(delta) => self.stream_length as i128 + delta as i128,
        };
        if target < 0 || target > self.stream_length as i128 {
            return Err(ErrorKind::InvalidPosition.make(format!(
                "seek target {target} is outside the stream (length {})",
                self.stream_length
            )));
        }
        self.stream_position = self
            .stream
            .seek(SeekFrom::Start(target as u64))
            .map_err(|error| ErrorKind::InvalidPosition.make(error.to_string()))?;
        Ok(self.stream_position)
    }

    /// Run `read` with the cursor repositioned at `position`, then restore
    /// the previous position. Restoration happens whether or not the nested
    /// read succeeds, so table reads located by absolute offset leave the
    /// main cursor where it was.
    pub fn detour<T>(
        &mut self,
        position: u64,
        read: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error>
    where
        R: Read + Seek,
    {
        let saved = self.stream_position;
        self.seek(SeekFrom::Start(position))?;
        let result = read(self);
        let restored = self
            .seek(SeekFrom::Start(saved))
            .context("cannot restore stream position after detour");
        match (result, restored) {
            (Ok(value), Ok(_)) => Ok(value),
            (Err(error), _) => Err(error),
            (Ok(_), Err(error)) => Err(error),
        }
    }
}

impl<T> Deserializer<Cursor<T>>
where
    T: Deref<Target = [u8]>,
{
    pub fn from_buffer(buffer: T) -> Self {
        Self::from(Cursor::new(buffer))
    }
}

impl<R> Deserializer<R>
where
    R: Read + Seek,
{
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let to_error = |error: std::io::Error| ErrorKind::InvalidPosition.make(error.to_string());
        let position = reader
            .stream_position()
            .map_err(to_error)
            .context("cannot obtain current stream position")?;
        let stream_length = reader
            .seek(SeekFrom::End(0))
            .map_err(to_error)
            .context("cannot obtain stream length")?;
        reader
            .seek(SeekFrom::Start(position))
            .map_err(to_error)
            .context("cannot go back to previous stream position after obtaining its length")?;
        Ok(Self {
            stream_length,
            stream_position: position,
            strictness: Strictness::default(),
            stream: reader,
        })
    }
}

impl<T> From<Cursor<T>> for Deserializer<Cursor<T>>
where
    T: Deref<Target = [u8]>,
{
    fn from(cursor: Cursor<T>) -> Self {
        Self {
            stream_length: cursor.get_ref().len() as u64,
            stream_position: cursor.position(),
            strictness: Strictness::default(),
            stream: cursor,
        }
    }
}
