// Kept in its own test binary so no other test opens files while descriptors are counted.
#![cfg(target_os = "linux")]

use std::fs;

use pacific_rs::output::{AnnotatedFastaWriter, ANNOTATED_FASTA_NAME};
use pacific_rs::types::{AnnotatedRead, Prediction, VirusClass};

fn open_descriptors() -> usize {
    fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
fn chunk_files_do_not_hold_open_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let record = AnnotatedRead {
        read_id: "r1".to_string(),
        prediction: Prediction {
            class: VirusClass::Rhinovirus,
            probability: 0.9,
        },
        sequence: "A".repeat(150),
    };

    let before = open_descriptors();
    let mut writer = AnnotatedFastaWriter::new(dir.path());
    for _ in 0..2000 {
        writer.write_chunk(std::slice::from_ref(&record)).unwrap();
    }
    assert!(open_descriptors() <= before + 2);

    let dest = dir.path().join(ANNOTATED_FASTA_NAME);
    writer.finish(&dest).unwrap();
    let text = fs::read_to_string(&dest).unwrap();
    assert_eq!(text.lines().count(), 4000);
    assert!(open_descriptors() <= before);
}
