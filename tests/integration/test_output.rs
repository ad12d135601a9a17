//! Tests for the output record format

use anyhow::Result;
use release_stage::stage::output::{self, OutputRecord, OutputValue};

#[test]
fn test_escape_round_trip_over_all_combinations() {
  let alphabet = ['%', '\r', '\n', 'a', '0', 'A', 'D', '2', '5'];
  // Every string of length <= 4 over the alphabet
  let mut samples = vec![String::new()];
  for _ in 0..4 {
    let next: Vec<String> = samples
      .iter()
      .flat_map(|s| alphabet.iter().map(move |c| format!("{}{}", s, c)))
      .collect();
    samples.extend(next.into_iter().filter(|s| s.chars().count() <= 4));
    samples.sort();
    samples.dedup();
  }

  for sample in samples {
    let escaped = output::escape(&sample);
    assert!(!escaped.contains('\n') && !escaped.contains('\r'));
    assert_eq!(output::unescape(&escaped), sample);
  }
}

#[test]
fn test_lines_block_survives_round_trip() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let path = temp.path().join("out");
  let record: OutputRecord = vec![
    ("files".to_string(), OutputValue::Lines(vec!["a b".to_string(), "c=d".to_string()])),
    ("note".to_string(), OutputValue::Scalar("50%\r\ndone".to_string())),
  ];

  output::write_outputs(&path, &record)?;
  output::write_outputs(&path, &record)?;

  let parsed = output::parse(&std::fs::read_to_string(&path)?)?;
  assert_eq!(parsed.len(), 4);
  assert_eq!(parsed[..2], record[..]);
  assert_eq!(parsed[2..], record[..]);
  Ok(())
}
