use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Timestamp layout used in both the transcript and the feedback log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Line closing every feedback block
pub const FEEDBACK_SEPARATOR: &str = "--------------------------------------------------";

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn append(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

/// Render one exchange as it appears in the transcript
pub fn format_exchange<Tz: TimeZone>(user: &str, reply: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "User ({}): {}\nBot: {}\n\n",
        at.format(TIMESTAMP_FORMAT),
        user,
        reply
    )
}

/// Render one feedback block, separator included
pub fn format_feedback_block<Tz: TimeZone>(
    review: &str,
    rating: u8,
    sentiment: &str,
    at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Timestamp: {}\nRating: {}/5\nReview: {}\nSentiment: {}\n{}\n",
        at.format(TIMESTAMP_FORMAT),
        rating,
        review,
        sentiment,
        FEEDBACK_SEPARATOR
    )
}

/// Append-only, human-readable chat transcript
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    path: PathBuf,
}

impl TranscriptWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one successful exchange, stamped with the local time
    pub fn append_exchange(&self, user: &str, reply: &str) -> io::Result<()> {
        append(&self.path, &format_exchange(user, reply, &Local::now()))
    }
}

/// Append-only feedback log, one separator-terminated block per submission.
///
/// Takes the fields individually so this crate stays independent of the
/// feedback types.
#[derive(Debug, Clone)]
pub struct FeedbackWriter {
    path: PathBuf,
}

impl FeedbackWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, review: &str, rating: u8, sentiment: &str) -> io::Result<()> {
        let block = format_feedback_block(review, rating, sentiment, &Local::now());
        append(&self.path, &block)
    }
}

/// One block read back from the feedback log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub rating: u8,
    pub review: String,
    pub sentiment: String,
}

/// Parse the feedback log.
///
/// Blocks missing a valid `Rating: n/5` line are skipped.
pub fn parse_feedback_log(content: &str) -> Vec<FeedbackRecord> {
    let mut records = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim() == FEEDBACK_SEPARATOR {
            if let Some(record) = parse_block(&block) {
                records.push(record);
            }
            block.clear();
        } else {
            block.push(line);
        }
    }
    // A trailing block without separator is an interrupted write
    if block.iter().any(|l| !l.trim().is_empty()) {
        debug!(lines = block.len(), "Ignoring unterminated feedback block");
    }

    records
}

fn parse_block(lines: &[&str]) -> Option<FeedbackRecord> {
    let mut timestamp = None;
    let mut rating = None;
    let mut review = None;
    let mut sentiment = None;

    for line in lines {
        if let Some(rest) = line.strip_prefix("Timestamp: ") {
            timestamp = NaiveDateTime::parse_from_str(rest.trim(), TIMESTAMP_FORMAT).ok();
        } else if let Some(rest) = line.strip_prefix("Rating: ") {
            rating = rest
                .trim()
                .strip_suffix("/5")
                .and_then(|n| n.trim().parse::<u8>().ok())
                .filter(|n| (1..=5).contains(n));
        } else if let Some(rest) = line.strip_prefix("Review: ") {
            review = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("Sentiment: ") {
            sentiment = Some(rest.trim().to_string());
        }
    }

    match rating {
        Some(rating) => Some(FeedbackRecord {
            timestamp,
            rating,
            review: review.unwrap_or_default(),
            sentiment: sentiment.unwrap_or_else(|| "Unknown".to_string()),
        }),
        None => {
            debug!(lines = lines.len(), "Skipping feedback block without a rating");
            None
        }
    }
}

/// Read and parse the feedback log; a missing file has no records
pub fn read_feedback_log(path: &Path) -> Result<Vec<FeedbackRecord>, RecordError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_feedback_log(&content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(RecordError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Aggregate view over the feedback log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub count: usize,
    pub mean_rating: Option<f64>,
    pub ratings: BTreeMap<u8, usize>,
    pub sentiments: BTreeMap<String, usize>,
}

impl FeedbackStats {
    pub fn from_records(records: &[FeedbackRecord]) -> Self {
        let mut ratings: BTreeMap<u8, usize> = (1..=5).map(|r| (r, 0)).collect();
        let mut sentiments = BTreeMap::new();
        let mut total: u32 = 0;

        for record in records {
            *ratings.entry(record.rating).or_insert(0) += 1;
            *sentiments.entry(record.sentiment.clone()).or_insert(0) += 1;
            total += u32::from(record.rating);
        }

        let mean_rating = if records.is_empty() {
            None
        } else {
            Some(f64::from(total) / records.len() as f64)
        };

        Self {
            count: records.len(),
            mean_rating,
            ratings,
            sentiments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_format_exchange() {
        assert_eq!(
            format_exchange("Hello", "Hi there", &at()),
            "User (2024-03-09 14:05:07): Hello\nBot: Hi there\n\n"
        );
    }

    #[test]
    fn test_format_feedback_block() {
        let block = format_feedback_block("Great chat", 5, "Positive", &at());
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Timestamp: 2024-03-09 14:05:07",
                "Rating: 5/5",
                "Review: Great chat",
                "Sentiment: Positive",
                FEEDBACK_SEPARATOR,
            ]
        );
        assert_eq!(FEEDBACK_SEPARATOR.len(), 50);
    }

    #[test]
    fn test_parse_skips_blocks_without_rating() {
        let content = format!(
            "Timestamp: 2024-03-09 14:05:07\nRating: 9/5\nReview: x\nSentiment: Neutral\n{sep}\n\
             Rating: 2/5\nReview: slow: but fine\n{sep}\n\
             Rating: 4/5\nReview: cut off",
            sep = FEEDBACK_SEPARATOR
        );
        let records = parse_feedback_log(&content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rating, 2);
        assert_eq!(records[0].review, "slow: but fine");
        assert_eq!(records[0].sentiment, "Unknown");
        assert_eq!(records[0].timestamp, None);
    }

    #[test]
    fn test_stats() {
        let record = |rating: u8, sentiment: &str| FeedbackRecord {
            timestamp: None,
            rating,
            review: "r".into(),
            sentiment: sentiment.into(),
        };
        let stats = FeedbackStats::from_records(&[
            record(5, "Positive"),
            record(4, "Positive"),
            record(1, "Negative"),
        ]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_rating, Some(10.0 / 3.0));
        assert_eq!(stats.ratings[&5], 1);
        assert_eq!(stats.ratings[&3], 0);
        assert_eq!(stats.sentiments["Positive"], 2);

        let empty = FeedbackStats::from_records(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean_rating, None);
    }
}
