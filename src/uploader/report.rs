//! Aggregated results of an upload run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Job, Outcome, ProgressEvent};

/// Done/error tallies and timestamps of one run
///
/// Only the coordinator's control loop writes to a report.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    errors: HashMap<Job, u16>,
    done_count: usize,
    processed: usize,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Classify an outcome and return the event describing it
    pub(crate) fn record(&mut self, outcome: Outcome) -> ProgressEvent {
        self.processed += 1;
        if outcome.is_success() {
            self.done_count += 1;
        } else {
            self.errors.insert(outcome.job.clone(), outcome.code);
        }
        ProgressEvent::from(outcome)
    }

    pub(crate) fn mark_started(&mut self) {
        self.start_time = Some(Utc::now());
    }

    pub(crate) fn mark_ended(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }

    /// Failed jobs and the status code each failed with
    pub fn errors(&self) -> &HashMap<Job, u16> {
        &self.errors
    }

    /// Number of jobs uploaded successfully
    pub fn done_count(&self) -> usize {
        self.done_count
    }

    /// Number of outcomes processed so far
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// When `start()` began, if it has
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// When the run ended, if it has
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Run duration in seconds; 0 until the run has ended
    pub fn elapsed_seconds(&self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes() -> Vec<Outcome> {
        vec![
            Outcome::new(Job::from("0.txt"), 200, "OK"),
            Outcome::new(Job::from("7.txt"), 403, "Forbidden"),
            Outcome::new(Job::from("9.txt"), 404, "Not Found"),
            Outcome::new(Job::from("1.txt"), 200, "OK"),
        ]
    }

    #[test]
    fn record_counts_successes_and_failures() {
        let mut report = RunReport::default();

        for outcome in outcomes() {
            report.record(outcome);
        }

        assert_eq!(report.done_count(), 2);
        assert_eq!(report.errors().len(), 2);
        assert_eq!(report.errors()[&Job::from("7.txt")], 403);
        assert_eq!(report.errors()[&Job::from("9.txt")], 404);
        assert_eq!(report.processed(), 4);
    }

    #[test]
    fn classification_does_not_depend_on_completion_order() {
        let mut forward = RunReport::default();
        let mut reverse = RunReport::default();

        for outcome in outcomes() {
            forward.record(outcome);
        }
        for outcome in outcomes().into_iter().rev() {
            reverse.record(outcome);
        }

        assert_eq!(forward.done_count(), reverse.done_count());
        assert_eq!(forward.errors(), reverse.errors());
    }

    #[test]
    fn record_returns_matching_event() {
        let mut report = RunReport::default();

        let event = report.record(Outcome::new(Job::from("7.txt"), 403, "Forbidden"));

        assert_eq!(
            event,
            ProgressEvent::Error {
                job: Job::from("7.txt"),
                error: "Forbidden".to_string()
            }
        );
    }

    #[test]
    fn elapsed_is_zero_until_ended() {
        let mut report = RunReport::default();
        assert_eq!(report.elapsed_seconds(), 0.0);

        report.mark_started();
        assert_eq!(report.elapsed_seconds(), 0.0);

        report.mark_ended();
        assert!(report.elapsed_seconds() >= 0.0);
        assert!(report.end_time().unwrap() >= report.start_time().unwrap());
    }

    #[test]
    fn end_time_is_set_once() {
        let mut report = RunReport::default();
        report.mark_started();
        report.mark_ended();
        let first = report.end_time();

        std::thread::sleep(std::time::Duration::from_millis(5));
        report.mark_ended();

        assert_eq!(report.end_time(), first);
    }

    #[test]
    fn report_serializes_errors_by_path() {
        let mut report = RunReport::default();
        report.record(Outcome::new(Job::from("7.txt"), 403, "Forbidden"));

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["errors"]["7.txt"], 403);
        assert_eq!(json["done_count"], 0);
    }
}
