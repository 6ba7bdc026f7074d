// Event stream -> state matrix

use super::diff::apply_event;
use super::{EventKind, Sequence, TempoEvent, TrackEvent, TrackMeta};
use crate::error::{MatrixError, Result};
use crate::matrix::{StateMatrix, MAX_VELOCITY, PITCH_COUNT, SILENT_FRAME};

/// Only this many leading events of a track are searched for a SetTempo
const TEMPO_SCAN_LIMIT: usize = 10;

/// Decode every track of a sequence and concatenate the matrices in track
/// order. When several tracks carry a SetTempo, the last such track wins.
pub fn decode(sequence: &Sequence) -> Result<(StateMatrix, TrackMeta)> {
    if sequence.resolution == 0 {
        return Err(MatrixError::InvalidResolution { operation: "decode" });
    }

    let mut matrix = StateMatrix::new();
    let mut tempo = None;

    for (track_index, events) in sequence.tracks.iter().enumerate() {
        let (track_matrix, track_tempo) = decode_track(events)?;
        log::debug!(
            "Decoded track {} ({} events) into {} frames",
            track_index,
            events.len(),
            track_matrix.len()
        );

        matrix.append(track_matrix);
        if track_tempo.is_some() {
            tempo = track_tempo;
        }
    }

    Ok((matrix, TrackMeta { resolution: sequence.resolution, tempo }))
}

/// Decode a single track into frames.
///
/// A note event with delta `d` first emits `d` copies of the working frame
/// and then updates it. EndOfTrack emits one final copy and stops. The whole
/// track is validated before any frame is produced.
pub fn decode_track(events: &[TrackEvent]) -> Result<(StateMatrix, Option<TempoEvent>)> {
    validate_track(events)?;

    let mut matrix = StateMatrix::new();
    let mut state = SILENT_FRAME;
    let mut terminated = false;

    for event in events {
        match event.kind {
            EventKind::EndOfTrack => {
                matrix.push_repeated(&state, 1);
                terminated = true;
                break;
            }
            EventKind::NoteOn { .. } | EventKind::NoteOff { .. } => {
                if event.delta > 0 {
                    matrix.push_repeated(&state, event.delta as usize);
                }
                apply_event(&mut state, &event.kind);
            }
            EventKind::SetTempo { .. } | EventKind::Other => {}
        }
    }

    if !terminated {
        log::warn!("Track ended without EndOfTrack after {} frames", matrix.len());
    }

    Ok((matrix, find_tempo(events)))
}

fn find_tempo(events: &[TrackEvent]) -> Option<TempoEvent> {
    events.iter().take(TEMPO_SCAN_LIMIT).find_map(|event| match event.kind {
        EventKind::SetTempo { microseconds_per_beat } => Some(TempoEvent {
            delta: event.delta,
            microseconds_per_beat,
        }),
        _ => None,
    })
}

fn validate_track(events: &[TrackEvent]) -> Result<()> {
    for (index, event) in events.iter().enumerate() {
        if let EventKind::NoteOn { pitch, velocity } | EventKind::NoteOff { pitch, velocity } =
            event.kind
        {
            if usize::from(pitch) >= PITCH_COUNT {
                return Err(MatrixError::MalformedEvent {
                    operation: "decode",
                    index,
                    reason: format!("pitch {} outside 0..=127", pitch),
                });
            }
            if velocity > MAX_VELOCITY {
                return Err(MatrixError::MalformedEvent {
                    operation: "decode",
                    index,
                    reason: format!("velocity {} outside 0..=127", velocity),
                });
            }
        }
    }
    Ok(())
}
