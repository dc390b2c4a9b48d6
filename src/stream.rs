//! Async stream paths, cancellable at every chunk.

use std::any::type_name;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use wirecast_core::{BufferPool, PooledBuffer, Result, WireError};

use crate::Serializer;

/// Size of each pooled chunk read from a stream.
pub const READ_CHUNK: usize = 64 * 1024;

fn io_error(source: std::io::Error) -> WireError {
    WireError::Io { source }
}

impl Serializer {
    /// Serialize `value` and write it to `stream`, segment by segment.
    /// Returns the bytes written.
    ///
    /// The value is fully encoded before the first write, so a failed
    /// encoding never reaches the stream. Cancellation between or during
    /// segment writes fails with `Cancelled`; bytes already written stay
    /// written.
    pub async fn serialize_async<T, W>(
        &self,
        value: &T,
        stream: &mut W,
        cancel: &CancellationToken,
    ) -> Result<usize>
    where
        T: 'static,
        W: AsyncWrite + Unpin + ?Sized,
    {
        if cancel.is_cancelled() {
            return Err(WireError::Cancelled);
        }
        let mut state = self.checkout();
        let written = self.write_pooled(&mut state, value)?;

        for segment in state.buffer.segments() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WireError::Cancelled),
                result = stream.write_all(segment) => result.map_err(io_error)?,
            }
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WireError::Cancelled),
            result = stream.flush() => result.map_err(io_error)?,
        }

        tracing::debug!(
            type_name = type_name::<T>(),
            written,
            segments = state.buffer.segment_count(),
            "serialized to stream"
        );
        Ok(written)
    }

    /// Read `stream` to its end and deserialize one `T` from the bytes.
    ///
    /// Input is buffered in pooled chunks of [`READ_CHUNK`] bytes and
    /// decoded across chunk boundaries without joining them. More than
    /// `max_buffer_size` bytes fails with `CapacityExceeded`.
    pub async fn deserialize_async<T, R>(
        &self,
        stream: &mut R,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        T: Default + 'static,
        R: AsyncRead + Unpin + ?Sized,
    {
        let limit = self.options().max_buffer_size;
        let mut chunks: Vec<PooledBuffer> = Vec::new();
        let mut total = 0usize;

        loop {
            let mut chunk = BufferPool::global().rent(READ_CHUNK);
            let mut filled = 0;
            while filled < chunk.len() {
                let n = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(WireError::Cancelled),
                    result = stream.read(&mut chunk[filled..]) => result.map_err(io_error)?,
                };
                if n == 0 {
                    break;
                }
                filled += n;
                total += n;
                if total > limit {
                    return Err(WireError::CapacityExceeded {
                        requested: total,
                        limit,
                    });
                }
            }
            let at_end = filled < READ_CHUNK;
            chunk.set_len(filled);
            if filled > 0 {
                chunks.push(chunk);
            }
            if at_end {
                break;
            }
        }

        tracing::debug!(
            type_name = type_name::<T>(),
            total,
            chunks = chunks.len(),
            "read stream"
        );
        let segments: Vec<&[u8]> = chunks.iter().map(|chunk| &chunk[..]).collect();
        self.deserialize_segments(&segments)
    }
}
