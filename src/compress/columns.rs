// Lossless pruning of permanently silent pitch columns

use ndarray::Array2;

use crate::error::{MatrixError, Result};
use crate::matrix::{CompressedMatrix, StateMatrix, PITCH_COUNT, SILENT_FRAME};

/// Drop every pitch column that is zero in all frames.
///
/// `columns_present` lists the surviving pitches in ascending order and
/// column `i` of the result holds pitch `columns_present[i]`.
pub fn compress_columns(matrix: &StateMatrix) -> CompressedMatrix {
    let frames = matrix.frames();

    let columns_present: Vec<u8> = (0..PITCH_COUNT)
        .filter(|&pitch| frames.iter().any(|frame| frame[pitch] != 0))
        .map(|pitch| pitch as u8)
        .collect();

    let values = Array2::from_shape_fn((frames.len(), columns_present.len()), |(tick, column)| {
        frames[tick][usize::from(columns_present[column])]
    });

    log::debug!(
        "Pruned {} of {} pitch columns over {} frames",
        PITCH_COUNT - columns_present.len(),
        PITCH_COUNT,
        frames.len()
    );

    CompressedMatrix { values, columns_present }
}

/// Reinsert zero columns at their original positions.
///
/// Every output frame is a separately owned 128-wide buffer.
pub fn decompress_columns(compressed: &CompressedMatrix) -> Result<StateMatrix> {
    check_columns(compressed)?;

    let mut frames = vec![SILENT_FRAME; compressed.ticks()];
    for (frame, row) in frames.iter_mut().zip(compressed.values.rows()) {
        for (&pitch, &velocity) in compressed.columns_present.iter().zip(row.iter()) {
            frame[usize::from(pitch)] = velocity;
        }
    }

    StateMatrix::from_frames(frames).map_err(|err| match err {
        MatrixError::VelocityOutOfRange { index, pitch, value, .. } => MatrixError::VelocityOutOfRange {
            operation: "decompress_columns",
            index,
            pitch,
            value,
        },
        other => other,
    })
}

fn check_columns(compressed: &CompressedMatrix) -> Result<()> {
    let columns = &compressed.columns_present;

    if columns.len() != compressed.width() {
        return Err(MatrixError::DimensionMismatch {
            operation: "decompress_columns",
            reason: format!(
                "{} columns listed for a matrix {} wide",
                columns.len(),
                compressed.width()
            ),
        });
    }

    if let Some(position) = columns.iter().position(|&pitch| usize::from(pitch) >= PITCH_COUNT) {
        return Err(MatrixError::DimensionMismatch {
            operation: "decompress_columns",
            reason: format!("column {} at position {} is not a pitch", columns[position], position),
        });
    }

    if let Some(position) = columns.windows(2).position(|pair| pair[0] >= pair[1]) {
        return Err(MatrixError::DimensionMismatch {
            operation: "decompress_columns",
            reason: format!("columns not strictly increasing at position {}", position + 1),
        });
    }

    Ok(())
}
