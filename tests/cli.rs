use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const TOKENIZER_JSON: &str = r#"{
    "class_name": "Tokenizer",
    "config": {
        "num_words": null,
        "lower": true,
        "split": " ",
        "char_level": false,
        "oov_token": null,
        "word_index": "{\"aaaaaaaaa\": 1, \"ccccccccc\": 2}"
    }
}"#;

const MODEL_JSON: &str = r#"{
    "embedding": [[0.0, 0.0], [5.0, 0.0], [0.0, 5.0]],
    "layers": [
        {"weights": [[1.0, 0.0], [0.0, 1.0]], "bias": [0.0, 0.0], "activation": "softmax"}
    ]
}"#;

const LABELS_JSON: &str = r#"{"classes": ["Human", "Sars_cov_2"]}"#;

fn run_pacific(dir: &Path, reads: &str) -> Output {
    fs::write(dir.join("tokenizer.json"), TOKENIZER_JSON).unwrap();
    fs::write(dir.join("model.json"), MODEL_JSON).unwrap();
    fs::write(dir.join("labels.json"), LABELS_JSON).unwrap();
    fs::write(dir.join("reads.fasta"), reads).unwrap();

    Command::new(env!("CARGO_BIN_EXE_pacific"))
        .arg("-i")
        .arg(dir.join("reads.fasta"))
        .arg("-m")
        .arg(dir.join("model.json"))
        .arg("-t")
        .arg(dir.join("tokenizer.json"))
        .arg("-l")
        .arg(dir.join("labels.json"))
        .arg("-o")
        .arg(dir)
        .args(["-L", "warn"])
        .output()
        .unwrap()
}

#[test]
fn short_reads_only_exit_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_pacific(dir.path(), ">s1\nACGT\n>s2\nNNNN\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("None processed reads"));
    assert!(!stdout.contains("Thank you for using PACIFIC"));
    assert!(!dir.path().join("output_PACIFIC.txt").exists());
}

#[test]
fn classified_reads_produce_the_summary_table() {
    let dir = tempfile::tempdir().unwrap();
    let reads = format!(">r1\n{}\n>r2\n{}\n", "A".repeat(150), "C".repeat(150));
    let output = run_pacific(dir.path(), &reads);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("From a total of 2 reads, 0 were discarded"));
    assert!(stdout.contains("Thank you for using PACIFIC =^)"));
    let table = fs::read_to_string(dir.path().join("output_PACIFIC.txt")).unwrap();
    assert!(table.contains("Human\t1\t50.0000"));
}
