// Per-pitch difference between two consecutive frames

use super::{EventKind, TrackEvent};
use crate::matrix::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub pitch: u8,
    pub velocity: u8,
}

/// Pitches that change between two frames.
///
/// `notes_on` holds every pitch whose new velocity is nonzero (including a
/// change from one nonzero velocity to another), `notes_off` every pitch
/// that falls silent. The two sets are disjoint and together cover every
/// differing pitch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDiff {
    pub notes_on: Vec<Note>,
    pub notes_off: Vec<u8>,
}

/// Compute the notes that change from `current` to `next`.
pub fn state_diff(current: &Frame, next: &Frame) -> StateDiff {
    let mut diff = StateDiff::default();

    for (pitch, (&before, &after)) in current.iter().zip(next.iter()).enumerate() {
        if before == after {
            continue;
        }
        let pitch = pitch as u8;
        if after == 0 {
            diff.notes_off.push(pitch);
        } else {
            diff.notes_on.push(Note { pitch, velocity: after });
        }
    }

    diff
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.notes_on.is_empty() && self.notes_off.is_empty()
    }

    /// Events realizing this diff: note-ons first, then note-offs.
    /// Only the first event carries `delta`; the rest are simultaneous.
    pub fn to_events(&self, delta: u32) -> Vec<TrackEvent> {
        let ons = self.notes_on.iter().map(|n| TrackEvent::note_on(0, n.pitch, n.velocity));
        let offs = self.notes_off.iter().map(|&pitch| TrackEvent::note_off(0, pitch));

        let mut events: Vec<TrackEvent> = ons.chain(offs).collect();
        if let Some(first) = events.first_mut() {
            first.delta = delta;
        }
        events
    }

    /// Apply the diff to `frame` in place.
    pub fn apply(&self, frame: &mut Frame) {
        for note in &self.notes_on {
            frame[usize::from(note.pitch)] = note.velocity;
        }
        for &pitch in &self.notes_off {
            frame[usize::from(pitch)] = 0;
        }
    }
}

/// Apply one note event to the working frame. Non-note events are ignored.
///
/// Callers must have validated the pitch range.
pub(crate) fn apply_event(frame: &mut Frame, kind: &EventKind) {
    match *kind {
        // velocity 0 doubles as a note-off
        EventKind::NoteOn { pitch, velocity } => frame[usize::from(pitch)] = velocity,
        EventKind::NoteOff { pitch, .. } => frame[usize::from(pitch)] = 0,
        EventKind::EndOfTrack | EventKind::SetTempo { .. } | EventKind::Other => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SILENT_FRAME;

    fn frame(notes: &[(usize, u8)]) -> Frame {
        let mut frame = SILENT_FRAME;
        for &(pitch, velocity) in notes {
            frame[pitch] = velocity;
        }
        frame
    }

    #[test]
    fn test_diff_partitions_changes() {
        let a = frame(&[(10, 50), (20, 60), (30, 70)]);
        let b = frame(&[(10, 50), (20, 90), (40, 100)]);

        let diff = state_diff(&a, &b);
        assert_eq!(
            diff.notes_on,
            vec![Note { pitch: 20, velocity: 90 }, Note { pitch: 40, velocity: 100 }]
        );
        assert_eq!(diff.notes_off, vec![30]);
        assert!(diff
            .notes_on
            .iter()
            .all(|n| !diff.notes_off.contains(&n.pitch)));

        let mut applied = a;
        diff.apply(&mut applied);
        assert_eq!(applied, b);
    }

    #[test]
    fn test_diff_of_equal_frames_is_empty() {
        let a = frame(&[(64, 80)]);
        assert!(state_diff(&a, &a).is_empty());
    }

    #[test]
    fn test_events_share_first_delta() {
        let diff = state_diff(&frame(&[(5, 10)]), &frame(&[(7, 20), (9, 30)]));
        let events = diff.to_events(4);

        assert_eq!(
            events,
            vec![
                TrackEvent::note_on(4, 7, 20),
                TrackEvent::note_on(0, 9, 30),
                TrackEvent::note_off(0, 5),
            ]
        );
    }

    #[test]
    fn test_events_replayed_reproduce_target() {
        let a = frame(&[(0, 1), (127, 127), (60, 64)]);
        let b = frame(&[(1, 2), (127, 100)]);

        let mut replay = a;
        for event in state_diff(&a, &b).to_events(3) {
            apply_event(&mut replay, &event.kind);
        }
        assert_eq!(replay, b);
    }
}
