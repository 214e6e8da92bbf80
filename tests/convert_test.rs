//! Integration tests for file conversion.

use std::fs;
use std::path::{Path, PathBuf};

use qbank::convert::{batch_stats, convert_batch, convert_file, is_missing_source, OUTPUT_FILE};
use qbank::{BlockRecord, Error, ExtractOptions, OutputLayout, SourceKind};

const PAGE_1: &str = "11900 電腦軟體設計 丙級 工作項目01：電腦概論\n1. 看圖作答(3)\n";

fn write_records(dir: &Path, name: &str, records: &[BlockRecord]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(records).unwrap()).unwrap();
    path
}

fn png() -> Vec<u8> {
    vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00]
}

#[test]
fn test_convert_paginated_writes_json_and_images() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_records(
        dir.path(),
        "11900.json",
        &[
            BlockRecord::text(1, PAGE_1),
            BlockRecord::image(1, png(), "png"),
        ],
    );
    let output = dir.path().join("out");

    let result = convert_file(&input, &output, &ExtractOptions::default()).unwrap();

    assert_eq!(result.kind, SourceKind::Paginated);
    assert_eq!(result.record_count, 1);
    assert_eq!(result.question_count(), 1);
    assert_eq!(result.images_written, 1);
    assert_eq!(result.json_path, output.join(OUTPUT_FILE));

    let json = fs::read_to_string(&result.json_path).unwrap();
    assert!(json.contains("\"section_title\": \"電腦概論\""));
    assert!(json.contains("\"images/p1_i1.png\""));
    assert_eq!(fs::read(output.join("images/p1_i1.png")).unwrap(), png());
}

#[test]
fn test_convert_without_images() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_records(
        dir.path(),
        "bank.json",
        &[
            BlockRecord::text(1, PAGE_1),
            BlockRecord::image(1, png(), "png"),
        ],
    );
    let output = dir.path().join("out");

    let result = convert_file(&input, &output, &ExtractOptions::new().with_images(false)).unwrap();

    assert_eq!(result.images_written, 0);
    assert!(!output.join("images").exists());
    assert!(output.join(OUTPUT_FILE).exists());
}

#[test]
fn test_convert_big5_form_page() {
    let dir = tempfile::tempdir().unwrap();
    let html = r#"<table><tr><td align="center">3</td>
        <td>題目<input type="radio" value="1">(1) 是<input type="radio" value="2">(2) 否</td>
        <td><input type="hidden" id="ans3_correct" value="1"></td></tr></table>"#;
    let (encoded, _, had_errors) = encoding_rs::BIG5.encode(html);
    assert!(!had_errors);

    let input = dir.path().join("exam.asp");
    fs::write(&input, &encoded[..]).unwrap();

    let options = ExtractOptions::new().with_layout(OutputLayout::Review).compact();
    let result = convert_file(&input, dir.path().join("out"), &options).unwrap();

    assert_eq!(result.kind, SourceKind::Markup);
    let json = fs::read_to_string(&result.json_path).unwrap();
    assert_eq!(
        json,
        r#"[{"id":"3","title":"題目","options":[{"value":"1","text":"是"},{"value":"2","text":"否"}],"correct_answer":"1"}]"#
    );
}

#[test]
fn test_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let result = convert_file(
        dir.path().join("missing.json"),
        dir.path().join("out"),
        &ExtractOptions::default(),
    );

    assert!(matches!(result, Err(Error::SourceNotFound(_))));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_unknown_source_kind() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "just some notes").unwrap();

    let result = convert_file(&input, dir.path().join("out"), &ExtractOptions::default());
    assert!(matches!(result, Err(Error::UnknownSourceKind(_))));
}

#[test]
fn test_forced_kind_overrides_detection() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records.txt");
    fs::write(
        &input,
        serde_json::to_string(&[BlockRecord::text(1, PAGE_1)]).unwrap(),
    )
    .unwrap();

    let options = ExtractOptions::new().with_source_kind(SourceKind::Paginated);
    let result = convert_file(&input, dir.path().join("out"), &options).unwrap();
    assert_eq!(result.question_count(), 1);
}

#[test]
fn test_batch_continues_after_failures() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_records(dir.path(), "good.json", &[BlockRecord::text(1, PAGE_1)]);
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "[{\"page\": 1, \"kind\": ").unwrap();
    let missing = dir.path().join("missing.json");
    let other = write_records(
        dir.path(),
        "other.json",
        &[BlockRecord::text(2, PAGE_1)],
    );

    let inputs = vec![good, broken, missing, other];
    let root = dir.path().join("batch");
    let results = convert_batch(&inputs, &root, &ExtractOptions::default());

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::Json(_))));
    assert!(is_missing_source(&results[2]));
    assert!(results[3].is_ok());

    assert!(root.join("good").join(OUTPUT_FILE).exists());
    assert!(root.join("other").join(OUTPUT_FILE).exists());

    let stats = batch_stats(&results);
    assert_eq!(stats.section_count, 2);
    assert_eq!(stats.question_count, 2);
}

#[test]
fn test_sequential_batch_matches_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = (0..4)
        .map(|i| {
            write_records(
                dir.path(),
                &format!("doc{}.json", i),
                &[BlockRecord::text(1, PAGE_1)],
            )
        })
        .collect();

    let parallel = convert_batch(&inputs, &dir.path().join("p"), &ExtractOptions::default());
    let sequential = convert_batch(
        &inputs,
        &dir.path().join("s"),
        &ExtractOptions::default().sequential(),
    );

    let sources = |results: &[qbank::Result<qbank::ConvertResult>]| -> Vec<PathBuf> {
        results
            .iter()
            .map(|r| r.as_ref().unwrap().source.clone())
            .collect()
    };
    assert_eq!(sources(&parallel), inputs);
    assert_eq!(sources(&sequential), inputs);
}

#[test]
fn test_format_tag_cannot_leave_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_records(
        dir.path(),
        "bank.json",
        &[
            BlockRecord::text(1, PAGE_1),
            BlockRecord::image(1, png(), "png/../../../escaped.txt"),
        ],
    );
    let output = dir.path().join("nested").join("out");

    let result = convert_file(&input, &output, &ExtractOptions::default()).unwrap();

    let question = &result.sections[0].questions[0];
    assert_eq!(question.images[0].path, "images/p1_i1.png");
    assert!(output.join("images/p1_i1.png").exists());
    assert!(!dir.path().join("escaped.txt").exists());
    assert!(!dir.path().join("nested").join("escaped.txt").exists());
}
