// State matrix: one 128-wide velocity frame per tick

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{MatrixError, Result};

/// Number of pitch channels in a frame
pub const PITCH_COUNT: usize = 128;

/// Largest legal velocity
pub const MAX_VELOCITY: u8 = 127;

/// Largest legal pitch
pub const MAX_PITCH: u8 = 127;

/// Velocity of every pitch at one tick. Index = pitch, 0 = silent.
pub type Frame = [u8; PITCH_COUNT];

/// The all-silent frame
pub const SILENT_FRAME: Frame = [0; PITCH_COUNT];

/// Time-ordered sequence of frames; index = absolute tick from track start.
///
/// Frames are stored by value, so every frame owns its storage and a
/// mutation through `frames_mut` never leaks into a neighbouring tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateMatrix {
    frames: Vec<Frame>,
}

impl StateMatrix {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Build a matrix from owned frames, rejecting velocities above 127.
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self> {
        for (index, frame) in frames.iter().enumerate() {
            check_frame("from_frames", index, frame)?;
        }
        Ok(Self { frames })
    }

    /// Build a matrix from a `ticks x 128` array.
    pub fn from_array(values: ArrayView2<'_, u8>) -> Result<Self> {
        if values.ncols() != PITCH_COUNT {
            return Err(MatrixError::ShapeMismatch {
                operation: "from_array",
                index: 0,
                width: values.ncols(),
            });
        }

        let mut frames = Vec::with_capacity(values.nrows());
        for (index, row) in values.rows().into_iter().enumerate() {
            let mut frame = SILENT_FRAME;
            for (pitch, &velocity) in row.iter().enumerate() {
                frame[pitch] = velocity;
            }
            check_frame("from_array", index, &frame)?;
            frames.push(frame);
        }
        Ok(Self { frames })
    }

    /// Copy the matrix into a `ticks x 128` array for numeric processing.
    pub fn to_array(&self) -> Array2<u8> {
        Array2::from_shape_fn((self.frames.len(), PITCH_COUNT), |(tick, pitch)| {
            self.frames[tick][pitch]
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    /// Append `count` copies of `frame`.
    pub(crate) fn push_repeated(&mut self, frame: &Frame, count: usize) {
        self.frames.extend(std::iter::repeat(*frame).take(count));
    }

    /// Concatenate another matrix after this one.
    pub fn append(&mut self, other: StateMatrix) {
        self.frames.extend(other.frames);
    }

    /// Verify every cell is a legal velocity.
    pub(crate) fn check_velocities(&self, operation: &'static str) -> Result<()> {
        for (index, frame) in self.frames.iter().enumerate() {
            check_frame(operation, index, frame)?;
        }
        Ok(())
    }
}

fn check_frame(operation: &'static str, index: usize, frame: &Frame) -> Result<()> {
    match frame.iter().position(|&v| v > MAX_VELOCITY) {
        Some(pitch) => Err(MatrixError::VelocityOutOfRange {
            operation,
            index,
            pitch,
            value: frame[pitch],
        }),
        None => Ok(()),
    }
}

/// A state matrix with permanently silent pitch columns removed.
///
/// `values` is `ticks x columns_present.len()`; column `i` of `values` holds
/// the original pitch `columns_present[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedMatrix {
    pub values: Array2<u8>,
    pub columns_present: Vec<u8>,
}

impl CompressedMatrix {
    pub fn ticks(&self) -> usize {
        self.values.nrows()
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }
}
