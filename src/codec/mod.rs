// Frame codec: event stream <-> state matrix

pub mod decode;
pub mod diff;
pub mod encode;

pub use decode::*;
pub use diff::*;
pub use encode::*;

use serde::{Deserialize, Serialize};

/// One raw track event with its tick-delta from the previous event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackEvent {
    pub delta: u32,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8, velocity: u8 },
    EndOfTrack,
    SetTempo { microseconds_per_beat: u32 },
    /// Anything else the source carries; ignored by the codec
    Other,
}

impl TrackEvent {
    pub fn note_on(delta: u32, pitch: u8, velocity: u8) -> Self {
        Self { delta, kind: EventKind::NoteOn { pitch, velocity } }
    }

    pub fn note_off(delta: u32, pitch: u8) -> Self {
        Self { delta, kind: EventKind::NoteOff { pitch, velocity: 0 } }
    }

    pub fn end_of_track(delta: u32) -> Self {
        Self { delta, kind: EventKind::EndOfTrack }
    }
}

/// SetTempo event captured during decode and threaded through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoEvent {
    pub delta: u32,
    pub microseconds_per_beat: u32,
}

impl TempoEvent {
    pub fn to_event(self) -> TrackEvent {
        TrackEvent {
            delta: self.delta,
            kind: EventKind::SetTempo { microseconds_per_beat: self.microseconds_per_beat },
        }
    }
}

/// Metadata needed to write a decoded matrix back out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMeta {
    /// Ticks per quarter note
    pub resolution: u16,
    pub tempo: Option<TempoEvent>,
}

/// Ordered tracks plus the global resolution, as read from an event source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub resolution: u16,
    pub tracks: Vec<Vec<TrackEvent>>,
}
