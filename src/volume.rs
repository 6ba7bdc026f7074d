// Velocity binarization and its lossy inverse

use serde::{Deserialize, Serialize};

use crate::error::{MatrixError, Result};
use crate::matrix::{StateMatrix, MAX_VELOCITY};

/// Truncated mean of all nonzero velocities removed by [`binarize_volume`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VolumeAverage(u8);

impl VolumeAverage {
    pub fn new(velocity: u8) -> Result<Self> {
        if velocity > MAX_VELOCITY {
            return Err(MatrixError::VelocityOutOfRange {
                operation: "volume_average",
                index: 0,
                pitch: 0,
                value: velocity,
            });
        }
        Ok(Self(velocity))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for VolumeAverage {
    type Error = MatrixError;

    fn try_from(velocity: u8) -> Result<Self> {
        Self::new(velocity)
    }
}

impl From<VolumeAverage> for u8 {
    fn from(average: VolumeAverage) -> u8 {
        average.0
    }
}

/// Set every nonzero cell to 1 in place and return the truncated mean of
/// the velocities that were replaced.
///
/// Fails without touching the matrix if it has no frames or no sounding
/// cells.
pub fn binarize_volume(matrix: &mut StateMatrix) -> Result<VolumeAverage> {
    if matrix.is_empty() {
        return Err(MatrixError::EmptyMatrix { operation: "binarize_volume" });
    }
    matrix.check_velocities("binarize_volume")?;

    let mut total: u64 = 0;
    let mut count: u64 = 0;
    for frame in matrix.frames_mut() {
        for cell in frame.iter_mut().filter(|cell| **cell > 0) {
            total += u64::from(*cell);
            count += 1;
            *cell = 1;
        }
    }

    if count == 0 {
        return Err(MatrixError::NoNonzeroVelocity { operation: "binarize_volume" });
    }

    let average = (total / count) as u8;
    log::debug!("Binarized {} notes, average velocity {}", count, average);
    Ok(VolumeAverage(average))
}

/// Scale a binarized matrix back up in place: every sounding cell becomes
/// `average`, silent cells stay 0. Per-note dynamics are not recovered.
pub fn restore_volume(matrix: &mut StateMatrix, average: VolumeAverage) {
    for frame in matrix.frames_mut() {
        for cell in frame.iter_mut().filter(|cell| **cell > 0) {
            *cell = average.0;
        }
    }
}
