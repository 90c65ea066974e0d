use std::{fmt, io::Read};

use rust_lzo::{LZOContext, LZOError};
use thiserror::Error as ThisError;
use tracing::{debug, trace};
use vigilo_core::{
    binary::{Deserializer, Error, ErrorKind, ResultContextExt},
    deserialize_structure,
};

use crate::PACKAGE_MAGIC;

/// Why a block failed to decompress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum DecompressError {
    #[error("corrupted compressed stream")]
    Failed,
    #[error("out of memory")]
    OutOfMemory,
    #[error("data is not compressible")]
    NotCompressible,
    #[error("input overrun")]
    InputOverrun,
    #[error("output overrun")]
    OutputOverrun,
    #[error("look-behind window overrun")]
    LookbehindOverrun,
    #[error("end marker not found")]
    MissingEndMarker,
    #[error("input not fully consumed")]
    UnconsumedInput,
    #[error("decompressed output shorter than expected")]
    ShortOutput,
}

/// Decompresses one opaque block into a caller-sized buffer. On success the
/// whole of `output` is populated.
pub trait BlockDecompressor {
    fn decompress(&self, compressed: &[u8], output: &mut [u8]) -> Result<(), DecompressError>;
}

/// The codec the engine actually uses for chunk payloads (LZO1X).
#[derive(Debug, Clone, Copy, Default)]
pub struct LzoDecompressor;

impl BlockDecompressor for LzoDecompressor {
    fn decompress(&self, compressed: &[u8], output: &mut [u8]) -> Result<(), DecompressError> {
        let expected = output.len();
        let (written, result) = LZOContext::decompress_to_slice(compressed, output);
        match result {
            LZOError::OK if written.len() == expected => Ok(()),
            LZOError::OK => Err(DecompressError::ShortOutput),
            LZOError::ERROR => Err(DecompressError::Failed),
            LZOError::OUT_OF_MEMORY => Err(DecompressError::OutOfMemory),
            LZOError::NOT_COMPRESSIBLE => Err(DecompressError::NotCompressible),
            LZOError::INPUT_OVERRUN => Err(DecompressError::InputOverrun),
            LZOError::OUTPUT_OVERRUN => Err(DecompressError::OutputOverrun),
            LZOError::LOOKBEHIND_OVERRUN => Err(DecompressError::LookbehindOverrun),
            LZOError::EOF_NOT_FOUND => Err(DecompressError::MissingEndMarker),
            LZOError::INPUT_NOT_CONSUMED => Err(DecompressError::UnconsumedInput),
            LZOError::NOT_YET_IMPLEMENTED => Err(DecompressError::Failed),
            LZOError::INVALID_ARGUMENT => Err(DecompressError::Failed),
        }
    }
}

/// On-disk sizes of one block within a chunk. Each block is immediately
/// followed by its `compressed_size` bytes of payload.
#[derive(Debug, Clone, Copy, Default)]
struct BlockSizes {
    compressed_size: u32,
    uncompressed_size: u32,
}

deserialize_structure! {
    type BlockSizes {
        compressed_size,
        uncompressed_size,
    }
}

/// One decompressed block of a chunk.
#[derive(Clone)]
pub struct CompressedBlock {
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub data: Vec<u8>,
}

impl fmt::Debug for CompressedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedBlock")
            .field("compressed_size", &self.compressed_size)
            .field("uncompressed_size", &self.uncompressed_size)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

/// An independently compressed segment of payload data, split into
/// fixed-size blocks.
#[derive(Debug, Clone)]
pub struct CompressedChunk {
    pub block_size: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub blocks: Vec<CompressedBlock>,
}

fn block_count(uncompressed_size: u32, block_size: u32) -> u32 {
    uncompressed_size.div_ceil(block_size)
}

impl CompressedChunk {
    /// Reads one chunk at the cursor and decompresses its blocks. Chunks
    /// reuse the package magic as a framing sentinel, which is what lets a
    /// scanner tell "another chunk follows" from "end of data".
    pub fn read(
        deserializer: &mut Deserializer<impl Read>,
        decompressor: &impl BlockDecompressor,
    ) -> Result<Self, Error> {
        let signature = deserializer
            .deserialize::<u32>()
            .context("cannot read compressed chunk signature")?;
        if signature != PACKAGE_MAGIC {
            return Err(ErrorKind::InvalidSignature.make(format!(
                "expected compressed chunk signature {PACKAGE_MAGIC:08x}, got {signature:08x}"
            )));
        }
        let block_size = deserializer
            .deserialize::<u32>()
            .context("cannot read chunk block size")?;
        let compressed_size = deserializer
            .deserialize::<u32>()
            .context("cannot read chunk compressed size")?;
        let uncompressed_size = deserializer
            .deserialize::<u32>()
            .context("cannot read chunk uncompressed size")?;
        if block_size == 0 {
            return Err(ErrorKind::Deserialize.make("chunk block size is zero"));
        }

        let block_count = block_count(uncompressed_size, block_size);
        debug!(
            "Reading compressed chunk ({uncompressed_size} bytes in {block_count} blocks of \
             {block_size})"
        );
        let mut blocks = Vec::with_capacity(block_count as usize);
        for i in 0..block_count {
            let sizes = deserializer
                .deserialize::<BlockSizes>()
                .with_context(|| format!("cannot read sizes of block {i}"))?;
            trace!(
                "Block {i}: {} -> {} bytes",
                sizes.compressed_size,
                sizes.uncompressed_size
            );
            let mut compressed = vec![0; sizes.compressed_size as usize];
            deserializer
                .read_bytes(&mut compressed)
                .with_context(|| format!("cannot read payload of block {i}"))?;
            let mut data = vec![0; sizes.uncompressed_size as usize];
            decompressor
                .decompress(&compressed, &mut data)
                .map_err(|error| {
                    ErrorKind::Decompress.make(format!("cannot decompress block {i}: {error}"))
                })?;
            blocks.push(CompressedBlock {
                compressed_size: sizes.compressed_size,
                uncompressed_size: sizes.uncompressed_size,
                data,
            });
        }
        Ok(Self {
            block_size,
            compressed_size,
            uncompressed_size,
            blocks,
        })
    }

    /// All block payloads, concatenated.
    pub fn data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.uncompressed_size as usize);
        for block in &self.blocks {
            data.extend_from_slice(&block.data);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Treats the payload as stored: copies it through unchanged.
    struct StoredDecompressor;

    impl BlockDecompressor for StoredDecompressor {
        fn decompress(&self, compressed: &[u8], output: &mut [u8]) -> Result<(), DecompressError> {
            if compressed.len() != output.len() {
                return Err(DecompressError::ShortOutput);
            }
            output.copy_from_slice(compressed);
            Ok(())
        }
    }

    struct FailingDecompressor;

    impl BlockDecompressor for FailingDecompressor {
        fn decompress(&self, _: &[u8], _: &mut [u8]) -> Result<(), DecompressError> {
            Err(DecompressError::LookbehindOverrun)
        }
    }

    fn chunk_bytes(block_size: u32, payload: &[u8]) -> Vec<u8> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&PACKAGE_MAGIC.to_le_bytes());
        buffer.extend_from_slice(&block_size.to_le_bytes());
        buffer.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buffer.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        for block in payload.chunks(block_size as usize) {
            buffer.extend_from_slice(&(block.len() as u32).to_le_bytes());
            buffer.extend_from_slice(&(block.len() as u32).to_le_bytes());
            buffer.extend_from_slice(block);
        }
        buffer
    }

    #[test]
    fn block_count_rounds_up() {
        assert_eq!(block_count(0x30000, 0x20000), 2);
        assert_eq!(block_count(0x20000, 0x20000), 1);
        assert_eq!(block_count(1, 0x20000), 1);
    }

    #[test]
    fn chunk_splits_into_blocks_in_disk_order() {
        let payload = b"0123456789";
        let buffer = chunk_bytes(4, payload);
        let mut de = Deserializer::from_buffer(buffer.as_slice());
        let chunk = CompressedChunk::read(&mut de, &StoredDecompressor).unwrap();
        assert!(de.end_of_stream());
        assert_eq!(chunk.blocks.len(), 3);
        assert_eq!(chunk.blocks[0].data, b"0123");
        assert_eq!(chunk.blocks[2].data, b"89");
        assert_eq!(chunk.data(), payload);
    }

    #[test]
    fn bad_chunk_signature_is_fatal() {
        let mut buffer = chunk_bytes(4, b"data");
        buffer[0] ^= 0xFF;
        let mut de = Deserializer::from_buffer(buffer.as_slice());
        let error = CompressedChunk::read(&mut de, &StoredDecompressor).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidSignature);
    }

    #[test]
    fn decompression_failure_is_fatal_for_the_chunk() {
        let buffer = chunk_bytes(4, b"data");
        let mut de = Deserializer::from_buffer(buffer.as_slice());
        let error = CompressedChunk::read(&mut de, &FailingDecompressor).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Decompress);
        assert!(error.to_string().contains("look-behind"));
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&PACKAGE_MAGIC.to_le_bytes());
        buffer.extend_from_slice(&[0; 12]);
        let mut de = Deserializer::from_buffer(buffer.as_slice());
        let error = CompressedChunk::read(&mut de, &StoredDecompressor).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Deserialize);
    }
}
