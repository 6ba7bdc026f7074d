// Lossy temporal downsampling by block averaging

use crate::error::{MatrixError, Result};
use crate::matrix::{StateMatrix, PITCH_COUNT, SILENT_FRAME};

/// Replace each run of `batch_size` frames with its truncated per-pitch mean.
///
/// The final batch may be shorter and is averaged over its own length.
/// There is no inverse.
pub fn average_rows(matrix: &StateMatrix, batch_size: usize) -> Result<StateMatrix> {
    if batch_size == 0 {
        return Err(MatrixError::InvalidBatchSize { operation: "average_rows" });
    }

    let mut frames = Vec::with_capacity(matrix.len().div_ceil(batch_size));
    for batch in matrix.frames().chunks(batch_size) {
        let mut sums = [0u32; PITCH_COUNT];
        for frame in batch {
            for (sum, &velocity) in sums.iter_mut().zip(frame.iter()) {
                *sum += u32::from(velocity);
            }
        }

        let count = batch.len() as u32;
        let mut averaged = SILENT_FRAME;
        for (cell, sum) in averaged.iter_mut().zip(sums) {
            // mean of values <= 127 stays <= 127
            *cell = (sum / count) as u8;
        }
        frames.push(averaged);
    }

    log::debug!(
        "Averaged {} frames into {} (batch size {})",
        matrix.len(),
        frames.len(),
        batch_size
    );

    StateMatrix::from_frames(frames)
}
