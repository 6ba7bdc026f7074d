// Pianola - MIDI event stream <-> piano-roll state matrix
// Main library entry point

pub mod cli;
pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod matrix;
pub mod midi_file;
pub mod pipeline;
pub mod volume;

pub use codec::{decode, decode_track, encode, state_diff, EventKind, Sequence, TrackEvent, TrackMeta};
pub use compress::{average_rows, compress_columns, decompress_columns};
pub use error::MatrixError;
pub use matrix::{CompressedMatrix, Frame, StateMatrix, PITCH_COUNT};
pub use volume::{binarize_volume, restore_volume, VolumeAverage};
