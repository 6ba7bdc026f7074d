// State matrix -> minimal event stream

use super::diff::state_diff;
use super::TrackEvent;
use crate::error::{MatrixError, Result};
use crate::matrix::{Frame, StateMatrix, SILENT_FRAME};

/// Encode a matrix into the shortest event list that decodes back to it.
///
/// The silent frame is the implicit predecessor of tick 0. Each run of
/// identical frames becomes one boundary whose first event carries the run
/// length; the rest of the boundary is simultaneous (delta 0). The last
/// frame is reproduced by the terminal EndOfTrack (delta 1).
pub fn encode(matrix: &StateMatrix) -> Result<Vec<TrackEvent>> {
    let frames = matrix.frames();
    let Some(last) = frames.len().checked_sub(1) else {
        return Err(MatrixError::EmptyMatrix { operation: "encode" });
    };
    if u32::try_from(frames.len()).is_err() {
        return Err(MatrixError::DimensionMismatch {
            operation: "encode",
            reason: format!("{} frames do not fit a 32-bit tick delta", frames.len()),
        });
    }
    matrix.check_velocities("encode")?;

    let mut events = state_diff(&SILENT_FRAME, &frames[0]).to_events(0);

    let mut current = 0;
    while current < last {
        let next = next_distinct_frame(frames, current, last);
        let delta = (next - current) as u32;

        let diff = state_diff(&frames[current], &frames[next]);
        if diff.is_empty() {
            // only the final run can be unchanged; something must carry its ticks
            events.push(hold_event(delta, &frames[current]));
        } else {
            events.extend(diff.to_events(delta));
        }

        current = next;
    }

    events.push(TrackEvent::end_of_track(1));

    log::debug!("Encoded {} frames into {} events", frames.len(), events.len());
    Ok(events)
}

/// First index after `current` whose frame differs, capped at `last`.
fn next_distinct_frame(frames: &[Frame], current: usize, last: usize) -> usize {
    (current + 1..last)
        .find(|&index| frames[index] != frames[current])
        .unwrap_or(last)
}

/// An event that leaves `frame` unchanged when applied.
fn hold_event(delta: u32, frame: &Frame) -> TrackEvent {
    match frame.iter().position(|&velocity| velocity == 0) {
        Some(pitch) => TrackEvent::note_off(delta, pitch as u8),
        None => TrackEvent::note_on(delta, 0, frame[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_track, EventKind};
    use crate::matrix::PITCH_COUNT;
    use std::collections::HashSet;

    fn frame(notes: &[(usize, u8)]) -> Frame {
        let mut frame = SILENT_FRAME;
        for &(pitch, velocity) in notes {
            frame[pitch] = velocity;
        }
        frame
    }

    fn round_trip(frames: Vec<Frame>) {
        let matrix = StateMatrix::from_frames(frames).unwrap();
        let events = encode(&matrix).unwrap();
        let (decoded, _) = decode_track(&events).unwrap();
        assert_eq!(decoded, matrix);
    }

    fn scenario_events() -> Vec<TrackEvent> {
        vec![
            TrackEvent::note_on(0, 48, 105),
            TrackEvent::note_on(0, 60, 105),
            TrackEvent::note_off(2, 60),
            TrackEvent::note_on(1, 60, 80),
            TrackEvent::note_off(2, 48),
            TrackEvent::note_off(0, 60),
            TrackEvent::note_on(1, 48, 95),
            TrackEvent::note_on(0, 65, 95),
            TrackEvent::note_off(2, 65),
            TrackEvent::end_of_track(1),
        ]
    }

    /// Group events by boundary so simultaneous ordering does not matter.
    fn boundaries(events: &[TrackEvent]) -> Vec<(u32, HashSet<EventKind>)> {
        let mut grouped: Vec<(u32, HashSet<EventKind>)> = Vec::new();
        for event in events {
            match grouped.last_mut() {
                Some((_, set)) if event.delta == 0 => {
                    set.insert(event.kind);
                }
                _ => grouped.push((event.delta, HashSet::from([event.kind]))),
            }
        }
        grouped
    }

    #[test]
    fn test_scenario_decodes_and_reencodes() {
        let events = scenario_events();
        let (matrix, _) = decode_track(&events).unwrap();

        assert_eq!(matrix.len(), 9);
        assert_eq!(matrix.frames()[0], frame(&[(48, 105), (60, 105)]));
        assert_eq!(matrix.frames()[2], frame(&[(48, 105)]));
        assert_eq!(matrix.frames()[3], frame(&[(48, 105), (60, 80)]));
        assert_eq!(matrix.frames()[5], SILENT_FRAME);
        assert_eq!(matrix.frames()[8], frame(&[(48, 95)]));

        let encoded = encode(&matrix).unwrap();
        assert_eq!(boundaries(&encoded), boundaries(&events));
    }

    #[test]
    fn test_empty_matrix_rejected() {
        assert_eq!(
            encode(&StateMatrix::new()).unwrap_err(),
            MatrixError::EmptyMatrix { operation: "encode" }
        );
    }

    #[test]
    fn test_single_silent_frame() {
        let matrix = StateMatrix::from_frames(vec![SILENT_FRAME]).unwrap();
        assert_eq!(encode(&matrix).unwrap(), vec![TrackEvent::end_of_track(1)]);
    }

    #[test]
    fn test_round_trip_trailing_silence() {
        round_trip(vec![frame(&[(60, 100)]), frame(&[(60, 100)]), SILENT_FRAME, SILENT_FRAME, SILENT_FRAME]);
    }

    #[test]
    fn test_round_trip_leading_silence_and_held_end() {
        round_trip(vec![SILENT_FRAME, SILENT_FRAME, frame(&[(20, 5)]), frame(&[(20, 5)])]);
    }

    #[test]
    fn test_round_trip_all_silent() {
        round_trip(vec![SILENT_FRAME; 4]);
    }

    #[test]
    fn test_round_trip_velocity_change_without_release() {
        round_trip(vec![frame(&[(72, 100)]), frame(&[(72, 40)]), frame(&[(72, 40), (73, 1)])]);
    }

    #[test]
    fn test_round_trip_every_pitch_sounding() {
        let full = [127u8; PITCH_COUNT];
        round_trip(vec![full, full, full]);
    }

    #[test]
    fn test_round_trip_alternating_frames() {
        let a = frame(&[(0, 1), (127, 127)]);
        let b = frame(&[(64, 64)]);
        round_trip(vec![a, b, a, b, b, a, SILENT_FRAME, a]);
    }

    #[test]
    fn test_out_of_range_cell_rejected() {
        let mut matrix = StateMatrix::from_frames(vec![SILENT_FRAME, SILENT_FRAME]).unwrap();
        matrix.frames_mut()[1][3] = 128;
        assert!(matches!(
            encode(&matrix),
            Err(MatrixError::VelocityOutOfRange { operation: "encode", index: 1, pitch: 3, value: 128 })
        ));
    }
}
