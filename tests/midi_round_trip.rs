// End-to-end checks through real MIDI files on disk

use std::path::Path;

use pianola::cli::{self, Command};
use pianola::codec::{TempoEvent, TrackEvent, TrackMeta};
use pianola::config::PipelineConfig;
use pianola::midi_file;
use pianola::pipeline::ProcessedMatrix;

fn melody() -> Vec<TrackEvent> {
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

fn meta() -> TrackMeta {
    TrackMeta {
        resolution: 480,
        tempo: Some(TempoEvent { delta: 0, microseconds_per_beat: 600_000 }),
    }
}

fn write_melody(path: &Path) {
    midi_file::write_sequence(path, &melody(), &meta()).unwrap();
}

#[test]
fn test_file_decodes_and_reencodes_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("melody.mid");
    write_melody(&path);

    let (matrix, read_meta) = midi_file::load_matrix(&path).unwrap();
    assert_eq!(matrix.len(), 9);
    assert_eq!(read_meta, meta());

    assert_eq!(pianola::encode(&matrix).unwrap(), melody());
}

#[test]
fn test_directory_is_concatenated_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    write_melody(&dir.path().join("a.mid"));
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    midi_file::write_sequence(
        &dir.path().join("sub").join("b.midi"),
        &[TrackEvent::note_on(0, 70, 33), TrackEvent::end_of_track(1)],
        &TrackMeta { resolution: 96, tempo: None },
    )
    .unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not midi").unwrap();

    let (matrix, read_meta) = midi_file::load_matrix(dir.path()).unwrap();
    assert_eq!(matrix.len(), 10);
    assert_eq!(matrix.frames()[9][70], 33);
    assert_eq!(read_meta.resolution, 480);
}

#[test]
fn test_empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(midi_file::load_matrix(dir.path()).is_err());
}

#[test]
fn test_cli_round_trip_preserves_notes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.mid");
    let output = dir.path().join("out").join("round.mid");
    write_melody(&input);

    cli::run(Command::RoundTrip { input: input.clone(), output: output.clone(), config: None }).unwrap();

    let (original, _) = midi_file::load_matrix(&input).unwrap();
    let (round, round_meta) = midi_file::load_matrix(&output).unwrap();
    assert_eq!(round, original);
    assert_eq!(round_meta, meta());
}

#[test]
fn test_cli_export_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.mid");
    let exported = dir.path().join("matrix.json");
    let imported = dir.path().join("back.mid");
    let config_path = dir.path().join("pipeline.toml");
    write_melody(&input);

    PipelineConfig { prune_columns: true, binarize_volume: true, row_batch_size: None }
        .save(&config_path)
        .unwrap();

    cli::run(Command::Export {
        input: input.clone(),
        output: exported.clone(),
        config: Some(config_path),
    })
    .unwrap();

    let processed = ProcessedMatrix::load_json(&exported).unwrap();
    // (105 * 7 + 80 * 2 + 95 * 5) / 14
    assert_eq!(processed.volume_average.map(|v| v.get()), Some(97));
    assert_eq!(processed.body.values().ncols(), 3);

    cli::run(Command::Import { input: exported, output: imported.clone() }).unwrap();

    let (original, _) = midi_file::load_matrix(&input).unwrap();
    let (back, _) = midi_file::load_matrix(&imported).unwrap();
    assert_eq!(back.len(), original.len());
    for (a, b) in original.frames().iter().zip(back.frames()) {
        for (&before, &after) in a.iter().zip(b.iter()) {
            assert_eq!(before == 0, after == 0);
            if after != 0 {
                assert_eq!(after, 97);
            }
        }
    }
}

#[test]
fn test_cli_import_refuses_row_averaged_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.mid");
    let exported = dir.path().join("matrix.json");
    let config_path = dir.path().join("pipeline.toml");
    write_melody(&input);

    PipelineConfig { row_batch_size: Some(4), ..PipelineConfig::default() }
        .save(&config_path)
        .unwrap();
    cli::run(Command::Export { input, output: exported.clone(), config: Some(config_path) }).unwrap();

    let processed = ProcessedMatrix::load_json(&exported).unwrap();
    assert_eq!(processed.body.values().nrows(), 3);

    let result = cli::run(Command::Import { input: exported, output: dir.path().join("x.mid") });
    assert!(result.is_err());
}
