// Standard MIDI File source/sink for the frame codec, built on midly

use std::path::{Path, PathBuf};

use anyhow::Context;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use walkdir::WalkDir;

use crate::codec::{self, EventKind, Sequence, TrackEvent, TrackMeta};
use crate::matrix::{StateMatrix, MAX_PITCH, MAX_VELOCITY};

/// Largest delta representable as an SMF variable-length quantity
const MAX_DELTA: u32 = (1 << 28) - 1;

/// Largest tempo (microseconds per quarter) a SetTempo meta event holds
const MAX_TEMPO: u32 = (1 << 24) - 1;

/// Largest metrical resolution an SMF header holds
const MAX_RESOLUTION: u16 = (1 << 15) - 1;

/// Parse SMF bytes into a sequence of codec events.
pub fn parse_sequence(data: &[u8]) -> anyhow::Result<Sequence> {
    let smf = Smf::parse(data).map_err(|e| anyhow::anyhow!("Failed to parse MIDI: {}", e))?;

    let resolution = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(..) => anyhow::bail!("SMPTE timecode timing is not supported"),
    };

    let tracks = smf
        .tracks
        .iter()
        .map(|track| track.iter().map(convert_event).collect())
        .collect();

    Ok(Sequence { resolution, tracks })
}

fn convert_event(event: &midly::TrackEvent<'_>) -> TrackEvent {
    let kind = match event.kind {
        TrackEventKind::Midi { message: MidiMessage::NoteOn { key, vel }, .. } => EventKind::NoteOn {
            pitch: key.as_int(),
            velocity: vel.as_int(),
        },
        TrackEventKind::Midi { message: MidiMessage::NoteOff { key, vel }, .. } => EventKind::NoteOff {
            pitch: key.as_int(),
            velocity: vel.as_int(),
        },
        TrackEventKind::Meta(MetaMessage::EndOfTrack) => EventKind::EndOfTrack,
        TrackEventKind::Meta(MetaMessage::Tempo(t)) => EventKind::SetTempo {
            microseconds_per_beat: t.as_int(),
        },
        _ => EventKind::Other,
    };

    TrackEvent { delta: event.delta.as_int(), kind }
}

/// Read and parse a MIDI file.
pub fn read_sequence(path: &Path) -> anyhow::Result<Sequence> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_sequence(&data).with_context(|| format!("Invalid MIDI file {}", path.display()))
}

/// Serialize one encoded track as a format-0 SMF. The tempo event, if any,
/// is written first with its original delta.
pub fn to_smf_bytes(events: &[TrackEvent], meta: &TrackMeta) -> anyhow::Result<Vec<u8>> {
    if meta.resolution == 0 || meta.resolution > MAX_RESOLUTION {
        anyhow::bail!("Resolution {} cannot be stored in a MIDI header", meta.resolution);
    }

    let mut track = Vec::with_capacity(events.len() + 1);
    if let Some(tempo) = meta.tempo {
        track.push(convert_back(&tempo.to_event())?);
    }
    for event in events {
        track.push(convert_back(event)?);
    }

    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(meta.resolution))),
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

fn convert_back(event: &TrackEvent) -> anyhow::Result<midly::TrackEvent<'static>> {
    if event.delta > MAX_DELTA {
        anyhow::bail!("Tick delta {} exceeds the MIDI limit", event.delta);
    }

    let kind = match event.kind {
        EventKind::NoteOn { pitch, velocity } => note_kind(pitch, velocity, true)?,
        EventKind::NoteOff { pitch, velocity } => note_kind(pitch, velocity, false)?,
        EventKind::EndOfTrack => TrackEventKind::Meta(MetaMessage::EndOfTrack),
        EventKind::SetTempo { microseconds_per_beat } => {
            if microseconds_per_beat > MAX_TEMPO {
                anyhow::bail!("Tempo {} does not fit a SetTempo event", microseconds_per_beat);
            }
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(microseconds_per_beat)))
        }
        EventKind::Other => anyhow::bail!("Opaque events cannot be written back"),
    };

    Ok(midly::TrackEvent { delta: u28::new(event.delta), kind })
}

fn note_kind(pitch: u8, velocity: u8, on: bool) -> anyhow::Result<TrackEventKind<'static>> {
    if pitch > MAX_PITCH || velocity > MAX_VELOCITY {
        anyhow::bail!("Note {} with velocity {} is out of MIDI range", pitch, velocity);
    }

    let key = u7::new(pitch);
    let vel = u7::new(velocity);
    let message = if on {
        MidiMessage::NoteOn { key, vel }
    } else {
        MidiMessage::NoteOff { key, vel }
    };

    Ok(TrackEventKind::Midi { channel: u4::new(0), message })
}

/// Write an encoded track plus its metadata to disk.
pub fn write_sequence(path: &Path, events: &[TrackEvent], meta: &TrackMeta) -> anyhow::Result<()> {
    let bytes = to_smf_bytes(events, meta)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Wrote {} events ({} bytes) to {}", events.len(), bytes.len(), path.display());
    Ok(())
}

fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
        .unwrap_or(false)
}

/// All MIDI files under `dir`, recursively, in sorted path order.
pub fn midi_files_in(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_midi_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Decode a MIDI file, or every MIDI file under a directory concatenated in
/// path order. Metadata comes from the first file.
pub fn load_matrix(path: &Path) -> anyhow::Result<(StateMatrix, TrackMeta)> {
    if !path.is_dir() {
        let sequence = read_sequence(path)?;
        return Ok(codec::decode(&sequence)?);
    }

    let files = midi_files_in(path);
    let Some((first, rest)) = files.split_first() else {
        anyhow::bail!("No MIDI files found under {}", path.display());
    };

    log::info!("Loading {}", first.display());
    let (mut matrix, meta) = codec::decode(&read_sequence(first)?)
        .with_context(|| format!("Failed to decode {}", first.display()))?;

    for file in rest {
        log::info!("Loading {}", file.display());
        let (file_matrix, _) = codec::decode(&read_sequence(file)?)
            .with_context(|| format!("Failed to decode {}", file.display()))?;
        matrix.append(file_matrix);
    }

    log::info!("Loaded {} files into {} frames", files.len(), matrix.len());
    Ok((matrix, meta))
}
