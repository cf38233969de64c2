// Unit tests for transcript preprocessing.
//
// Sentence splitting on interview-style text, and the file-level
// sentence and pair transforms (written under the system temp dir).

use std::path::PathBuf;

use claimscape::preprocess::{build_pairs, pairs_file, transform_file, SentenceSplitter};
use serde_json::{json, Value};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("claimscape_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn split(text: &str) -> Vec<String> {
    SentenceSplitter::new().unwrap().split_into_sentences(text)
}

// ============================================================
// Sentence splitting
// ============================================================

#[test]
fn splits_plain_sentences() {
    assert_eq!(
        split("We started in 1998. Funding was scarce! Did it matter? Not really."),
        vec![
            "We started in 1998.",
            "Funding was scarce!",
            "Did it matter?",
            "Not really."
        ]
    );
}

#[test]
fn does_not_split_before_lowercase() {
    assert_eq!(split("It cost 3.5 million. and then"), vec!["It cost 3.5 million. and then"]);
}

#[test]
fn keeps_citations_together() {
    let out = split("Smith et al. Showed this. Then we moved on.");
    assert_eq!(out, vec!["Smith et al. Showed this.", "Then we moved on."]);
}

// ============================================================
// File transforms
// ============================================================

#[test]
fn transform_file_writes_numbered_sentences() {
    let dir = temp_dir("sentences");
    let input = dir.join("Interview.json");
    let utterances = json!([
        {"speaker_name": "A", "role": "Interviewer", "utterance": "Hello. How are you?", "order": 1},
        {"speaker_name": "B", "role": "Interviewee", "utterance": "Fine.", "order": 2}
    ]);
    std::fs::write(&input, utterances.to_string()).unwrap();

    let output = transform_file(&input, None).unwrap();
    assert_eq!(output, dir.join("Interview_sentences.json"));

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written[0]["utterance_order"], 1);
    assert_eq!(written[0]["sentences"][1]["sentence"], "How are you?");
    assert_eq!(written[0]["sentences"][1]["sentence_order"], "1-2");
    assert_eq!(written[1]["sentences"][0]["sentence_order"], "2-1");
}

#[test]
fn pairs_skip_out_of_pattern_utterances() {
    let items = vec![
        json!({"role": "Interviewee", "utterance_order": 0}),
        json!({"role": "Interviewer", "utterance_order": 1}),
        json!({"role": "Interviewee", "utterance_order": 2}),
        json!({"role": "Interviewer", "utterance_order": 3}),
        json!({"role": "Interviewee", "utterance_order": 4}),
    ];
    let pairs = build_pairs(&items);
    assert_eq!(pairs.len(), 2);
    assert!(pairs[0].previous_utterances.is_none());
    assert_eq!(pairs[0].current_utterance[0]["utterance_order"], 1);
    assert_eq!(
        pairs[1].previous_utterances.as_ref().unwrap()[1]["utterance_order"],
        2
    );
}

#[test]
fn pairs_file_writes_one_file_per_pair() {
    let dir = temp_dir("pairs");
    let input = dir.join("Interview_sentences.json");
    let items = json!([
        {"role": "Interviewer", "utterance_order": 1},
        {"role": "Interviewee", "utterance_order": 2},
        {"role": "Interviewer", "utterance_order": 3},
        {"role": "Interviewee", "utterance_order": 4}
    ]);
    std::fs::write(&input, items.to_string()).unwrap();

    let out_dir = dir.join("pairs");
    let (count, written_to) = pairs_file(&input, Some(&out_dir)).unwrap();
    assert_eq!(count, 2);
    assert_eq!(written_to, out_dir);

    let second: Value = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join("Previous-current pair - 2.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(second["previous_utterances"][0]["utterance_order"], 1);
    assert_eq!(second["current_utterance"][1]["utterance_order"], 4);

    let first: Value = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join("Previous-current pair - 1.json")).unwrap(),
    )
    .unwrap();
    assert!(first["previous_utterances"].is_null());
}
