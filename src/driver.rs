//! Streams a JSONL file of sentences through the detector in batches and
//! writes one [`SentenceRecord`] per sentence.

use crate::annotator::Annotator;
use crate::detector::MultiwordTermDetector;
use crate::error::ConfigError;
use crate::output::SentenceRecord;
use crate::progress::progress_bar;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Sentences read before results are written out.
    pub batch_size: usize,
    /// Sentences being annotated at the same time within a batch.
    pub concurrency: usize,
    /// Keep the existing output file and skip sentences already in it.
    pub resume: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            concurrency: 100,
            resume: false,
        }
    }
}

/// What happened to the input lines of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    /// Records written.
    pub processed: usize,
    /// Sentences already present in the output file (resume mode).
    pub skipped_existing: usize,
    /// Sentences the annotator could not analyze.
    pub failed: usize,
    /// Lines that were not a JSON string.
    pub invalid_lines: usize,
}

/// Only the field needed to recognize sentences that were already written.
#[derive(Deserialize)]
struct WrittenSentence {
    sentence: String,
}

pub async fn process_sentences<A: Annotator>(
    detector: &MultiwordTermDetector<A>,
    sentences_path: &Path,
    output_path: &Path,
    config: &DriverConfig,
) -> Result<DriverSummary> {
    info!("Counting sentences...");
    let total = count_sentences(sentences_path)?;
    info!("Found {total} sentences to process");

    let already_written = if config.resume {
        load_written_sentences(output_path)?
    } else {
        HashSet::new()
    };

    let input = File::open(sentences_path)
        .with_context(|| format!("Failed to open sentences file {}", sentences_path.display()))?;
    let output = OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.resume)
        .truncate(!config.resume)
        .open(output_path)
        .with_context(|| format!("Failed to open output file {}", output_path.display()))?;
    let mut writer = BufWriter::new(output);

    let pb = progress_bar(total, "sentences")?;
    let mut summary = DriverSummary::default();
    let batch_size = config.batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);

    for (line_no, line) in BufReader::new(input).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", sentences_path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let sentence: String = match serde_json::from_str(&line) {
            Ok(sentence) => sentence,
            Err(e) => {
                warn!(
                    "Skipping line {} of {}: {e}",
                    line_no + 1,
                    sentences_path.display()
                );
                summary.invalid_lines += 1;
                pb.inc(1);
                continue;
            }
        };

        if already_written.contains(&sentence) {
            summary.skipped_existing += 1;
            pb.inc(1);
            continue;
        }

        batch.push(sentence);
        if batch.len() >= batch_size {
            let last_failure =
                write_batch(detector, &mut batch, &mut writer, config, &mut summary, &pb).await?;
            ensure_annotator_works(&summary, last_failure)?;
        }
    }
    if !batch.is_empty() {
        let last_failure =
            write_batch(detector, &mut batch, &mut writer, config, &mut summary, &pb).await?;
        ensure_annotator_works(&summary, last_failure)?;
    }

    writer.flush()?;
    pb.finish_and_clear();
    info!(
        "Processing complete: {} written, {} already present, {} failed, {} invalid lines. Output written to {}",
        summary.processed,
        summary.skipped_existing,
        summary.failed,
        summary.invalid_lines,
        output_path.display()
    );

    Ok(summary)
}

async fn write_batch<A: Annotator, W: Write>(
    detector: &MultiwordTermDetector<A>,
    batch: &mut Vec<String>,
    writer: &mut W,
    config: &DriverConfig,
    summary: &mut DriverSummary,
    pb: &ProgressBar,
) -> Result<Option<anyhow::Error>> {
    let mut last_failure = None;
    let results = detector
        .find_multiword_terms_batch(batch, config.concurrency)
        .await;

    for (sentence, result) in batch.drain(..).zip(results) {
        match result {
            Ok((parse, detected)) => {
                let record = SentenceRecord::new(sentence, &parse, &detected);
                serde_json::to_writer(&mut *writer, &record)?;
                writeln!(writer)?;
                summary.processed += 1;
            }
            Err(e) => {
                warn!("Failed to analyze sentence {sentence:?}: {e:#}");
                summary.failed += 1;
                last_failure = Some(e);
            }
        }
        pb.inc(1);
    }

    Ok(last_failure)
}

/// A first batch with no successful sentence means the annotator is down,
/// not that the sentences are bad.
fn ensure_annotator_works(summary: &DriverSummary, last_failure: Option<anyhow::Error>) -> Result<()> {
    match last_failure {
        Some(e) if summary.processed == 0 => Err(ConfigError::AnnotatorUnavailable {
            attempted: summary.failed,
            reason: format!("{e:#}"),
        }
        .into()),
        _ => Ok(()),
    }
}

fn count_sentences(path: &Path) -> Result<u64> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open sentences file {}", path.display()))?;
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

fn load_written_sentences(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    info!("Loading already processed sentences...");
    let file = File::open(path)
        .with_context(|| format!("Failed to open existing output {}", path.display()))?;
    let written: HashSet<String> = BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<WrittenSentence>(&line).ok())
        .map(|written| written.sentence)
        .collect();
    info!("Found {} already processed sentences", written.len());

    Ok(written)
}
