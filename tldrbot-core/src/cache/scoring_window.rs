// File: src/cache/scoring_window.rs

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};
use crate::Error;
use crate::models::{MessageRecord, TriggerEvent, TriggerReason};
use crate::services::notification_dispatch::NotificationCallback;

/// A fetched message plus the votes strategies have given it.
#[derive(Debug, Clone)]
pub struct ScoredMessage {
    message: MessageRecord,
    score: u32,
}

impl ScoredMessage {
    fn new(message: MessageRecord) -> Self {
        Self { message, score: 0 }
    }

    pub fn message(&self) -> &MessageRecord {
        &self.message
    }

    pub fn score(&self) -> u32 {
        self.score
    }
}

/// Bounded FIFO of scored messages for one channel.
///
/// Messages appended by the latest `extend` form the *current batch*; everything
/// before it has already been scanned. Strategies vote with [`ScoringWindow::upvote`]
/// and the window fires its callbacks once per message, on the vote that brings the
/// score to exactly `threshold`.
pub struct ScoringWindow {
    messages: Vec<ScoredMessage>,
    threshold: u32,
    max_length: usize,
    /// Index of the first unread message; equals `messages.len()` when nothing is unread.
    batch_start: usize,
    callbacks: Vec<Arc<dyn NotificationCallback>>,
}

impl ScoringWindow {
    pub fn new(threshold: u32, max_length: usize) -> Self {
        Self {
            messages: Vec::new(),
            threshold,
            max_length,
            batch_start: 0,
            callbacks: Vec::new(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: Vec<Arc<dyn NotificationCallback>>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn register_callback(&mut self, callback: Arc<dyn NotificationCallback>) {
        self.callbacks.push(callback);
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ScoredMessage] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&ScoredMessage> {
        self.messages.get(index)
    }

    /// Appends a chronological batch with zero scores.
    ///
    /// A batch larger than `max_length` grows the window so none of it is lost.
    /// Otherwise the oldest messages are evicted once the window is over capacity.
    pub fn extend<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = MessageRecord>,
    {
        let incoming: Vec<ScoredMessage> = incoming.into_iter().map(ScoredMessage::new).collect();

        if incoming.len() > self.max_length {
            debug!(
                "Growing scoring window from {} to {} to fit incoming batch",
                self.max_length,
                incoming.len()
            );
            self.max_length = incoming.len();
        }

        self.batch_start = self.messages.len();
        self.messages.extend(incoming);

        if self.messages.len() > self.max_length {
            let evicted = self.messages.len() - self.max_length;
            self.messages.drain(..evicted);
            self.batch_start = self.batch_start.saturating_sub(evicted);
        }
    }

    /// Messages appended by the most recent `extend`.
    pub fn current_batch(&self) -> &[ScoredMessage] {
        &self.messages[self.batch_start..]
    }

    /// Window index of the first message in the current batch.
    pub fn batch_start(&self) -> usize {
        self.batch_start
    }

    /// Index of the newest already-scanned message, `None` when everything is unread.
    pub fn last_read(&self) -> Option<usize> {
        self.batch_start.checked_sub(1)
    }

    /// The message immediately before the current batch.
    pub fn previous_message(&self) -> Option<&ScoredMessage> {
        self.last_read().and_then(|i| self.messages.get(i))
    }

    pub fn newest_timestamp(&self) -> Option<f64> {
        self.messages.last().map(|m| m.message.timestamp)
    }

    /// Adds one vote to the message at `index` and returns its new score.
    pub fn upvote(&mut self, index: usize) -> Result<u32, Error> {
        let threshold = self.threshold;
        let scored = self.messages.get_mut(index).ok_or_else(|| {
            Error::Strategy(format!("upvote index {} out of range", index))
        })?;

        scored.score += 1;
        let score = scored.score;
        if score == threshold {
            let event = TriggerEvent::new(scored.message.clone(), TriggerReason::Threshold { score });
            self.dispatch(&event);
        }
        Ok(score)
    }

    /// Hands the message at `index` straight to the callbacks, ignoring its score.
    pub fn trigger(&mut self, index: usize, reason: TriggerReason) -> Result<(), Error> {
        let message = self
            .messages
            .get(index)
            .map(|m| m.message.clone())
            .ok_or_else(|| Error::Strategy(format!("trigger index {} out of range", index)))?;
        self.dispatch(&TriggerEvent::new(message, reason));
        Ok(())
    }

    fn dispatch(&self, event: &TriggerEvent) {
        for (i, callback) in self.callbacks.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| callback.on_trigger(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        "Notification callback #{} failed for message at {}: {:?}",
                        i, event.message.timestamp, e
                    );
                }
                Err(_) => {
                    warn!(
                        "Notification callback #{} panicked for message at {}",
                        i, event.message.timestamp
                    );
                }
            }
        }
    }
}

impl fmt::Display for ScoringWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .messages
            .iter()
            .map(|m| format!("{}\t{:.125}", m.score, m.message.text_or_empty()))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn msg(ts: f64) -> MessageRecord {
        MessageRecord::new(ts, Some("U1"), Some(&format!("message at {}", ts)))
    }

    fn recording_callback() -> (Arc<Mutex<Vec<TriggerEvent>>>, Arc<dyn NotificationCallback>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: Arc<dyn NotificationCallback> = Arc::new(move |event: &TriggerEvent| -> Result<(), Error> {
            sink.lock().push(event.clone());
            Ok(())
        });
        (seen, callback)
    }

    #[test]
    fn length_never_exceeds_max_length() {
        let mut window = ScoringWindow::new(1, 5);
        for round in 0..10 {
            let batch: Vec<_> = (0..3).map(|i| msg((round * 3 + i) as f64)).collect();
            window.extend(batch);
            assert!(window.len() <= window.max_length());
        }
        assert_eq!(window.len(), 5);
        assert_eq!(window.messages()[0].message().timestamp, 25.0);
    }

    #[test]
    fn oversized_batch_grows_capacity() {
        let mut window = ScoringWindow::new(1, 3);
        window.extend(vec![msg(0.0), msg(1.0)]);
        window.extend((10..17).map(|i| msg(i as f64)));

        assert_eq!(window.max_length(), 7);
        assert_eq!(window.len(), 7);
        assert_eq!(window.current_batch().len(), 7);
        assert_eq!(window.last_read(), None);
    }

    #[test]
    fn cursor_tracks_new_batch_across_eviction() {
        let mut window = ScoringWindow::new(1, 4);
        window.extend(vec![msg(1.0), msg(2.0), msg(3.0)]);
        assert_eq!(window.last_read(), None);
        assert_eq!(window.current_batch().len(), 3);

        window.extend(vec![msg(4.0), msg(5.0)]);
        // one message evicted: [2, 3, 4, 5]
        assert_eq!(window.len(), 4);
        assert_eq!(window.last_read(), Some(1));
        let batch: Vec<f64> = window.current_batch().iter().map(|m| m.message().timestamp).collect();
        assert_eq!(batch, vec![4.0, 5.0]);
        assert_eq!(window.previous_message().unwrap().message().timestamp, 3.0);
    }

    #[test]
    fn empty_extend_leaves_empty_batch() {
        let mut window = ScoringWindow::new(1, 4);
        window.extend(vec![msg(1.0)]);
        window.extend(Vec::new());
        assert!(window.current_batch().is_empty());
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn reversed_fetch_is_chronological() {
        let newest_first = vec![msg(30.0), msg(20.0), msg(10.0)];
        let mut window = ScoringWindow::new(1, 10);
        window.extend(newest_first.into_iter().rev());

        let ts: Vec<f64> = window.messages().iter().map(|m| m.message().timestamp).collect();
        assert_eq!(ts, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn callback_fires_once_on_reaching_threshold() {
        let (seen, callback) = recording_callback();
        let mut window = ScoringWindow::new(2, 10).with_callbacks(vec![callback]);
        window.extend(vec![msg(1.0)]);

        assert_eq!(window.upvote(0).unwrap(), 1);
        assert!(seen.lock().is_empty());
        assert_eq!(window.upvote(0).unwrap(), 2);
        assert_eq!(window.upvote(0).unwrap(), 3);

        let events = seen.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, TriggerReason::Threshold { score: 2 });
        assert_eq!(events[0].message.timestamp, 1.0);
    }

    #[test]
    fn failing_callback_does_not_block_others() {
        let (seen, good) = recording_callback();
        let bad: Arc<dyn NotificationCallback> =
            Arc::new(|_: &TriggerEvent| -> Result<(), Error> { Err(Error::Callback("boom".into())) });
        let panicky: Arc<dyn NotificationCallback> =
            Arc::new(|_: &TriggerEvent| -> Result<(), Error> { panic!("callback exploded") });

        let mut window = ScoringWindow::new(1, 10);
        window.register_callback(bad);
        window.register_callback(panicky);
        window.register_callback(good);
        window.extend(vec![msg(1.0)]);

        assert_eq!(window.upvote(0).unwrap(), 1);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(window.get(0).unwrap().score(), 1);
    }

    #[test]
    fn direct_trigger_ignores_score() {
        let (seen, callback) = recording_callback();
        let mut window = ScoringWindow::new(5, 10).with_callbacks(vec![callback]);
        window.extend(vec![msg(1.0), msg(2.0)]);

        window
            .trigger(1, TriggerReason::Burst { messages: 10, span_seconds: 12.0 })
            .unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(window.get(1).unwrap().score(), 0);
        assert!(window.trigger(7, TriggerReason::Threshold { score: 1 }).is_err());
    }

    #[test]
    fn out_of_range_upvote_is_an_error() {
        let mut window = ScoringWindow::new(1, 10);
        assert!(matches!(window.upvote(0), Err(Error::Strategy(_))));
    }

    #[test]
    fn display_truncates_text() {
        let mut window = ScoringWindow::new(1, 10);
        let long = "x".repeat(200);
        window.extend(vec![MessageRecord::new(1.0, None, Some(&long)), MessageRecord::new(2.0, None, None)]);
        window.upvote(0).unwrap();

        let dump = window.to_string();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("1\t{}", "x".repeat(125)));
        assert_eq!(lines[1], "0\t");
    }
}
