// Forward and inverse transform chains around the frame codec

use std::path::Path;

use anyhow::Context;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::codec::{self, TrackEvent, TrackMeta};
use crate::compress::{average_rows, compress_columns, decompress_columns};
use crate::config::PipelineConfig;
use crate::error::{MatrixError, Result};
use crate::matrix::{CompressedMatrix, StateMatrix};
use crate::volume::{binarize_volume, restore_volume, VolumeAverage};

/// Matrix values in the layout the pipeline left them in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum MatrixBody {
    /// All 128 pitch columns
    Full { values: Array2<u8> },
    /// Silent columns removed
    Pruned(CompressedMatrix),
}

impl MatrixBody {
    pub fn values(&self) -> &Array2<u8> {
        match self {
            MatrixBody::Full { values } => values,
            MatrixBody::Pruned(compressed) => &compressed.values,
        }
    }
}

/// A transformed matrix together with everything needed to undo the
/// transforms. This is what gets handed to external processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedMatrix {
    pub meta: TrackMeta,
    /// Set when rows were averaged; such a matrix cannot be restored
    pub row_batch_size: Option<usize>,
    pub volume_average: Option<VolumeAverage>,
    pub body: MatrixBody,
}

/// Apply the configured transforms: row averaging, then volume
/// binarization, then column pruning.
pub fn process(matrix: StateMatrix, meta: TrackMeta, config: &PipelineConfig) -> Result<ProcessedMatrix> {
    let mut matrix = match config.row_batch_size {
        Some(batch_size) => average_rows(&matrix, batch_size)?,
        None => matrix,
    };

    let volume_average = if config.binarize_volume {
        let average = binarize_volume(&mut matrix)?;
        log::info!("Binarized volume, average velocity {}", average.get());
        Some(average)
    } else {
        None
    };

    let body = if config.prune_columns {
        let compressed = compress_columns(&matrix);
        log::info!("Kept {} active pitch columns", compressed.width());
        MatrixBody::Pruned(compressed)
    } else {
        MatrixBody::Full { values: matrix.to_array() }
    };

    Ok(ProcessedMatrix {
        meta,
        row_batch_size: config.row_batch_size,
        volume_average,
        body,
    })
}

impl ProcessedMatrix {
    /// Undo pruning and binarization. Row averaging has no inverse.
    pub fn restore(&self) -> Result<StateMatrix> {
        if let Some(batch_size) = self.row_batch_size {
            return Err(MatrixError::NotInvertible { operation: "restore", batch_size });
        }

        let mut matrix = match &self.body {
            MatrixBody::Full { values } => StateMatrix::from_array(values.view())?,
            MatrixBody::Pruned(compressed) => decompress_columns(compressed)?,
        };

        if let Some(average) = self.volume_average {
            restore_volume(&mut matrix, average);
        }

        Ok(matrix)
    }

    /// Restore and encode back into an event list.
    pub fn to_events(&self) -> Result<Vec<TrackEvent>> {
        codec::encode(&self.restore()?)
    }

    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let contents = serde_json::to_string(self)?;
        std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let processed = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid processed matrix in {}", path.display()))?;
        Ok(processed)
    }
}

/// Run the invertible part of the pipeline forward and back, producing the
/// event list to write out. Row averaging is skipped.
pub fn round_trip(matrix: StateMatrix, meta: TrackMeta, config: &PipelineConfig) -> Result<Vec<TrackEvent>> {
    let mut config = config.clone();
    if let Some(batch_size) = config.row_batch_size.take() {
        log::warn!("Ignoring row batch size {} on round trip: averaging is not invertible", batch_size);
    }

    process(matrix, meta, &config)?.to_events()
}
