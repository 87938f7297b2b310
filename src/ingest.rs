//! Ingestion of analysis results.
//!
//! Tracks reach the engine either as a one-shot batch (a JSON array) or as
//! an incremental stream of newline-delimited JSON events from the analysis
//! collaborator:
//!
//! ```text
//! {"type": "progress", "msg": "Fetching playlist..."}
//! {"type": "update", "track": {...}, "percent": 40, "msg": "Analyzed 2/5: ..."}
//! {"type": "done", "msg": "Analysis Complete"}
//! {"type": "error", "msg": "..."}
//! ```
//!
//! [`consume`] reads the stream one message at a time, awaiting between
//! messages, and merges every track into the session by id. Malformed or
//! unknown messages are logged and skipped. A terminal event, a transport
//! error or the channel closing ends consumption; tracks merged so far stay
//! as they are.

use crate::error::Result;
use crate::session::{MergeOutcome, OrderingSession};
use crate::track::Track;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

/// Buffered messages between a reader task and the consumer.
pub const CHANNEL_CAPACITY: usize = 64;

/// One raw message off the delivery channel.
pub type Delivery = std::io::Result<String>;

/// Event emitted by the analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// Status text only.
    Progress {
        #[serde(default)]
        msg: String,
    },
    /// A single analyzed track.
    #[serde(alias = "track")]
    Update {
        track: Track,
        #[serde(default)]
        percent: Option<f64>,
        #[serde(default)]
        msg: String,
    },
    /// Terminal, successful.
    Done {
        #[serde(default)]
        msg: String,
    },
    /// Terminal, failed.
    Error {
        #[serde(default)]
        msg: String,
    },
    /// Any tag this engine does not know.
    #[serde(other)]
    Unknown,
}

/// How a delivery channel ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The collaborator sent `done`.
    Completed { message: String },
    /// The collaborator sent `error`, or the transport failed.
    Failed { message: String },
    /// The channel closed without a terminal event.
    Interrupted,
}

impl IngestOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, IngestOutcome::Completed { .. })
    }
}

/// Summary of one consumed channel
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    /// Records that replaced a known track.
    pub replaced: usize,
    /// Records that were appended.
    pub appended: usize,
    /// Malformed messages skipped.
    pub skipped: usize,
    /// Last completion percentage reported.
    pub percent: Option<f64>,
    /// Last status text reported.
    pub status: String,
}

impl Default for IngestReport {
    fn default() -> Self {
        Self {
            outcome: IngestOutcome::Interrupted,
            replaced: 0,
            appended: 0,
            skipped: 0,
            percent: None,
            status: String::new(),
        }
    }
}

impl IngestReport {
    #[must_use]
    pub fn merged(&self) -> usize {
        self.replaced + self.appended
    }
}

/// Apply one event to the session. Returns the terminal outcome if the event
/// ends the stream.
pub fn apply_event(session: &mut OrderingSession, event: AnalysisEvent, report: &mut IngestReport) -> Option<IngestOutcome> {
    match event {
        AnalysisEvent::Progress { msg } => {
            info!("{msg}");
            report.status = msg;
            None
        }
        AnalysisEvent::Update { track, percent, msg } => {
            debug!("Update for {} ({msg})", track.id);
            match session.merge(track) {
                MergeOutcome::Replaced(_) => report.replaced += 1,
                MergeOutcome::Appended(_) => report.appended += 1,
            }
            if percent.is_some() {
                report.percent = percent;
            }
            if !msg.is_empty() {
                report.status = msg;
            }
            None
        }
        AnalysisEvent::Done { msg } => {
            info!("Analysis finished: {msg}");
            report.status = msg.clone();
            Some(IngestOutcome::Completed { message: msg })
        }
        AnalysisEvent::Error { msg } => {
            warn!("Analysis failed: {msg}");
            report.status = msg.clone();
            Some(IngestOutcome::Failed { message: msg })
        }
        AnalysisEvent::Unknown => {
            warn!("Ignoring event with unknown type");
            report.skipped += 1;
            None
        }
    }
}

/// Consume a delivery channel until a terminal event, a transport error or
/// the channel closes, merging every track into `session`.
///
/// Holding `&mut session` for the whole run means a full analysis and a
/// targeted re-analysis cannot interleave on one session; callers run them
/// one after the other.
pub async fn consume(session: &mut OrderingSession, mut rx: mpsc::Receiver<Delivery>) -> IngestReport {
    let mut report = IngestReport::default();

    while let Some(delivery) = rx.recv().await {
        let line = match delivery {
            Ok(line) => line,
            Err(e) => {
                warn!("Delivery channel failed: {e}");
                report.outcome = IngestOutcome::Failed { message: e.to_string() };
                return report;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<AnalysisEvent>(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed event: {e}");
                report.skipped += 1;
                continue;
            }
        };

        if let Some(outcome) = apply_event(session, event, &mut report) {
            report.outcome = outcome;
            return report;
        }
    }

    warn!("Delivery channel closed before a terminal event");
    report
}

/// Forward lines from `reader` into a new delivery channel on a background
/// task. Read errors are forwarded once and end the task.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<Delivery>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            let delivery = match lines.next_line().await {
                Ok(Some(line)) => Ok(line),
                Ok(None) => break,
                Err(e) => Err(e),
            };
            let failed = delivery.is_err();
            if tx.send(delivery).await.is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Parse a one-shot batch of track records.
///
/// # Errors
///
/// Returns an error if `json` is not an array of track records.
pub fn parse_batch(json: &str) -> Result<Vec<Track>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackStatus;

    async fn feed(lines: &[&str]) -> mpsc::Receiver<Delivery> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        for line in lines {
            tx.send(Ok((*line).to_string())).await.unwrap();
        }
        rx
    }

    #[test]
    fn test_event_tags_parse() {
        let update: AnalysisEvent =
            serde_json::from_str(r#"{"type":"track","track":{"id":"a"},"percent":50}"#).unwrap();
        assert!(matches!(update, AnalysisEvent::Update { percent: Some(p), .. } if p == 50.0));

        let unknown: AnalysisEvent = serde_json::from_str(r#"{"type":"heartbeat","at":1}"#).unwrap();
        assert_eq!(unknown, AnalysisEvent::Unknown);

        assert!(serde_json::from_str::<AnalysisEvent>(r#"{"type":"update","percent":5}"#).is_err());
    }

    #[tokio::test]
    async fn test_update_then_error_keeps_merged_track() {
        let rx = feed(&[
            r#"{"type":"update","track":{"id":"a","name":"A","bpm":120,"status":"ok"},"percent":50,"msg":"1/2"}"#,
            r#"{"type":"error","msg":"rate limited"}"#,
            r#"{"type":"update","track":{"id":"b","name":"B"},"percent":100}"#,
        ])
        .await;
        let mut session = OrderingSession::default();

        let report = consume(&mut session, rx).await;

        assert_eq!(report.outcome, IngestOutcome::Failed { message: "rate limited".into() });
        assert_eq!(session.len(), 1);
        assert_eq!(session.tracks()[0].status, TrackStatus::Ok);
        assert_eq!(report.percent, Some(50.0));
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_are_skipped() {
        let rx = feed(&[
            r#"{"type":"progress","msg":"Starting"}"#,
            "not json at all",
            "",
            r#"{"type":"telemetry"}"#,
            r#"{"type":"update","track":{"id":"a","status":"pending"}}"#,
            r#"{"type":"update","track":{"id":"a","status":"no_preview"},"msg":"1/1"}"#,
            r#"{"type":"done","msg":"Analysis Complete"}"#,
        ])
        .await;
        let mut session = OrderingSession::default();

        let report = consume(&mut session, rx).await;

        assert!(report.outcome.is_success());
        assert_eq!(report.skipped, 2);
        assert_eq!((report.appended, report.replaced), (1, 1));
        assert_eq!(session.tracks()[0].status, TrackStatus::NoPreview);
        assert_eq!(report.status, "Analysis Complete");
    }

    #[tokio::test]
    async fn test_closed_channel_is_interrupted() {
        let rx = feed(&[r#"{"type":"update","track":{"id":"a"}}"#]).await;
        let mut session = OrderingSession::default();

        let report = consume(&mut session, rx).await;
        assert_eq!(report.outcome, IngestOutcome::Interrupted);
        assert_eq!(report.merged(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tx.send(Ok(r#"{"type":"update","track":{"id":"a"}}"#.to_string())).await.unwrap();
        tx.send(Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")))
            .await
            .unwrap();
        tx.send(Ok(r#"{"type":"update","track":{"id":"b"}}"#.to_string())).await.unwrap();
        drop(tx);

        let mut session = OrderingSession::default();
        let report = consume(&mut session, rx).await;

        assert!(matches!(report.outcome, IngestOutcome::Failed { .. }));
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn test_line_reader_feeds_consumer() {
        let input = concat!(
            r#"{"type":"update","track":{"id":"a","bpm":100}}"#,
            "\n",
            r#"{"type":"update","track":{"id":"b","bpm":90}}"#,
            "\n",
            r#"{"type":"done","msg":"ok"}"#,
            "\n",
        );
        let rx = spawn_line_reader(tokio::io::BufReader::new(input.as_bytes()));
        let mut session = OrderingSession::default();

        let report = consume(&mut session, rx).await;
        assert!(report.outcome.is_success());
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_parse_batch() {
        let tracks = parse_batch(r#"[{"id":"a","bpm":128},{"id":"b"}]"#).unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(parse_batch(r#"{"id":"a"}"#).is_err());
    }
}
