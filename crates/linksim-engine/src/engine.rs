//! The per-frame retry state machine and end-of-run checksum.
//!
//! [`transmit`] is the synchronous core: it drives every frame of a set
//! through the channel in index order, attempt by attempt, and emits
//! events as it goes. [`crate::DataLink`] wraps it in a worker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use linksim_frame::{destuff, stuff, FailureKind, Frame, FrameStatus, FRAME_SIZE_BITS};

use crate::channel::{Channel, Sampler};
use crate::event::{Checksum, Event, Summary};

/// Maximum transmission attempts per frame.
pub const MAX_RETRIES: u32 = 3;

/// Which accumulation rule the aggregate checksum uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumMode {
    /// 32-bit wrapping sum of per-frame CRCs. Canonical.
    #[default]
    Sum32,
    /// 8-bit modulo-256 sum. Legacy alternate.
    Modulo256,
}

/// Engine timing and checksum configuration.
///
/// The channel probabilities and retry bound are protocol constants;
/// only the simulated latencies and the checksum mode vary (tests run
/// with zero delays).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Pause after a failed attempt before the retry.
    pub retry_delay: Duration,
    /// Pause after a successful acknowledgment.
    pub ack_delay: Duration,
    pub checksum_mode: ChecksumMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(100),
            ack_delay: Duration::from_millis(200),
            checksum_mode: ChecksumMode::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration with no simulated latency, for tests and batch use.
    pub fn immediate() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            ack_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Drive every frame through the channel until terminal, then compute
/// and "send" the aggregate checksum.
///
/// Returns the summary of a completed run, or `None` when cancelled.
/// Cancellation is checked before each frame, not between retries;
/// unreached frames stay `Waiting` and no summary is emitted. Event
/// sends are best-effort: a disconnected observer does not stop the
/// run.
pub fn transmit<S: Sampler>(
    frames: &mut [Frame],
    channel: &mut Channel<S>,
    config: &EngineConfig,
    events: &Sender<Event>,
    cancel: &AtomicBool,
) -> Option<Summary> {
    tracing::debug!(frames = frames.len(), "starting transmission");

    for frame in frames.iter_mut() {
        if cancel.load(Ordering::SeqCst) {
            tracing::debug!(next = frame.index(), "transmission cancelled");
            let _ = events.send(Event::StatusUpdate("Transmission stopped".to_string()));
            return None;
        }
        process_frame(frame, channel, config, events);
    }

    let checksum = compute_checksum(frames, config.checksum_mode);
    let _ = events.send(Event::ChecksumCalculated(checksum));

    // The checksum travels as its own stuffed trailer frame.
    let trailer = stuff(&checksum.to_bytes());
    tracing::debug!(checksum = %checksum, wire_len = trailer.len(), "checksum frame sent");
    let _ = events.send(Event::ChecksumFrameSent(checksum));

    let checksum_frame_corrupted = channel.checksum_corrupted();
    if checksum_frame_corrupted {
        let _ = events.send(Event::Error(
            "checksum frame corrupted during transmission".to_string(),
        ));
    }

    let summary = Summary {
        total_frames: frames.len(),
        acked: count_status(frames, FrameStatus::Acked),
        failed: count_status(frames, FrameStatus::Failed),
        problem_frames: frames
            .iter()
            .filter(|f| !f.error_log().is_empty())
            .map(Frame::index)
            .collect(),
        checksum,
        checksum_frame_corrupted,
    };
    let _ = events.send(Event::TransmissionComplete(summary.clone()));
    Some(summary)
}

/// Run one frame's bounded-retry state machine to a terminal status.
fn process_frame<S: Sampler>(
    frame: &mut Frame,
    channel: &mut Channel<S>,
    config: &EngineConfig,
    events: &Sender<Event>,
) {
    let index = frame.index();
    let canonical = frame.payload().clone();
    let mut attempt = 0u32;

    while attempt < MAX_RETRIES {
        attempt += 1;
        tracing::debug!(frame = index, attempt, "attempting frame");

        // Refresh the CRC on the canonical payload, then put the
        // stuffed wire form in its place.
        frame.set_status(FrameStatus::Sending);
        frame.set_payload_bits(canonical.clone(), FRAME_SIZE_BITS);
        frame.set_payload(stuff(&canonical));

        if channel.frame_lost() {
            retry(
                frame,
                FailureKind::Lost,
                FrameStatus::Lost,
                format!("Frame {index} lost during transmission (attempt {attempt}/{MAX_RETRIES})"),
                attempt,
                &canonical,
                config,
                events,
            );
            continue;
        }

        if channel.frame_corrupted() {
            retry(
                frame,
                FailureKind::Corrupted,
                FrameStatus::Corrupted,
                format!(
                    "Frame {index} corrupted during transmission (attempt {attempt}/{MAX_RETRIES})"
                ),
                attempt,
                &canonical,
                config,
                events,
            );
            continue;
        }

        // Delivered: the observer sees the wire form before the ACK
        // outcome is known.
        let _ = events.send(Event::FrameProcessed(frame.clone()));

        // The round-trip law guarantees destuff succeeds on our own
        // stuffing; the kept canonical copy is the identical fallback.
        let restored = destuff(frame.payload()).unwrap_or_else(|_| canonical.clone());
        frame.set_payload_bits(restored, FRAME_SIZE_BITS);

        if channel.ack_lost() {
            retry(
                frame,
                FailureKind::AckLost,
                FrameStatus::AckLost,
                format!("ACK lost for frame {index} (attempt {attempt}/{MAX_RETRIES})"),
                attempt,
                &canonical,
                config,
                events,
            );
            continue;
        }

        frame.set_status(FrameStatus::Acked);
        tracing::debug!(frame = index, attempt, "frame acknowledged");
        let _ = events.send(Event::StatusUpdate(format!(
            "Frame {index} successfully transmitted and acknowledged"
        )));
        pause(config.ack_delay);
        return;
    }

    frame.set_status(FrameStatus::Failed);
    frame.log_failure(
        FailureKind::RetryExhausted,
        format!("Maximum retry attempts ({MAX_RETRIES}) reached"),
        MAX_RETRIES,
    );
    tracing::debug!(frame = index, "retries exhausted");
    let _ = events.send(Event::StatusUpdate(format!(
        "Frame {index} transmission failed after {MAX_RETRIES} attempts"
    )));
}

/// Record a channel event, restore the canonical payload, and narrate.
#[allow(clippy::too_many_arguments)]
fn retry(
    frame: &mut Frame,
    kind: FailureKind,
    status: FrameStatus,
    message: String,
    attempt: u32,
    canonical: &bytes::Bytes,
    config: &EngineConfig,
    events: &Sender<Event>,
) {
    tracing::debug!(frame = frame.index(), attempt, %kind, "channel event");
    frame.set_status(status);
    frame.log_failure(kind, message.clone(), attempt);
    frame.set_payload_bits(canonical.clone(), FRAME_SIZE_BITS);
    let _ = events.send(Event::StatusUpdate(message));
    pause(config.retry_delay);
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

fn count_status(frames: &[Frame], status: FrameStatus) -> usize {
    frames.iter().filter(|f| f.status() == status).count()
}

/// Sum every frame's canonical CRC in frame order.
fn compute_checksum(frames: &[Frame], mode: ChecksumMode) -> Checksum {
    match mode {
        ChecksumMode::Sum32 => Checksum::Sum32(
            frames
                .iter()
                .fold(0u32, |acc, f| acc.wrapping_add(u32::from(f.crc()))),
        ),
        ChecksumMode::Modulo256 => Checksum::Modulo256(
            frames
                .iter()
                .fold(0u8, |acc, f| acc.wrapping_add(f.crc() as u8)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::mpsc;

    use linksim_frame::{segment, FLAG};

    use super::*;
    use crate::channel::Sampler;

    struct Fixed(f64);

    impl Sampler for Fixed {
        fn sample_unit(&mut self) -> f64 {
            self.0
        }
    }

    // Replays a scripted sequence, then stays clear of every threshold.
    struct Scripted(VecDeque<f64>);

    impl Scripted {
        fn new(values: &[f64]) -> Self {
            Self(values.iter().copied().collect())
        }
    }

    impl Sampler for Scripted {
        fn sample_unit(&mut self) -> f64 {
            self.0.pop_front().unwrap_or(0.5)
        }
    }

    fn run_with<S: Sampler>(
        data: &[u8],
        sampler: S,
    ) -> (Vec<Frame>, Vec<Event>, Option<Summary>) {
        let mut frames = segment(data).unwrap();
        let mut channel = Channel::new(sampler);
        let (tx, rx) = mpsc::channel();
        let summary = transmit(
            &mut frames,
            &mut channel,
            &EngineConfig::immediate(),
            &tx,
            &AtomicBool::new(false),
        );
        (frames, rx.try_iter().collect(), summary)
    }

    #[test]
    fn clear_channel_acks_everything_first_attempt() {
        let (frames, events, summary) = run_with(&[0x41u8; 13], Fixed(0.5));

        assert!(frames.iter().all(|f| f.status() == FrameStatus::Acked));
        assert!(frames.iter().all(|f| f.error_log().is_empty()));

        let summary = summary.unwrap();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.acked, 2);
        assert_eq!(summary.failed, 0);
        assert!(summary.problem_frames.is_empty());
        assert_eq!(summary.checksum, Checksum::Sum32(0x0000906E));
        assert!(!summary.checksum_frame_corrupted);

        let processed = events
            .iter()
            .filter(|e| matches!(e, Event::FrameProcessed(_)))
            .count();
        assert_eq!(processed, 2);
        let complete = events
            .iter()
            .filter(|e| matches!(e, Event::TransmissionComplete(_)))
            .count();
        assert_eq!(complete, 1);
    }

    #[test]
    fn frame_processed_snapshot_is_wire_form() {
        let (_, events, _) = run_with(b"A", Fixed(0.5));
        let Some(Event::FrameProcessed(snapshot)) = events
            .iter()
            .find(|e| matches!(e, Event::FrameProcessed(_)))
        else {
            panic!("no FrameProcessed event");
        };
        let wire = snapshot.payload();
        assert_eq!(wire[0], FLAG);
        assert_eq!(wire[wire.len() - 1], FLAG);
        // Stuffed form also refreshes the CRC.
        assert!(snapshot.verify_crc());
    }

    #[test]
    fn lost_frame_retries_and_recovers() {
        // Attempt 1: loss roll hits. Attempt 2: clear.
        let (frames, _, summary) = run_with(b"A", Scripted::new(&[0.05]));
        let frame = &frames[0];
        assert_eq!(frame.status(), FrameStatus::Acked);
        assert_eq!(frame.error_log().len(), 1);
        assert_eq!(frame.error_log()[0].kind, FailureKind::Lost);
        assert_eq!(frame.error_log()[0].attempt, 1);
        assert_eq!(summary.unwrap().problem_frames, vec![0]);
    }

    #[test]
    fn corrupted_frame_retries() {
        // Attempt 1: no loss (0.5), corruption hits (0.15). Attempt 2: clear.
        let (frames, _, _) = run_with(b"A", Scripted::new(&[0.5, 0.15]));
        let frame = &frames[0];
        assert_eq!(frame.status(), FrameStatus::Acked);
        assert_eq!(frame.error_log().len(), 1);
        assert_eq!(frame.error_log()[0].kind, FailureKind::Corrupted);
    }

    #[test]
    fn ack_loss_retries_after_delivery() {
        // Attempt 1: delivered (0.5, 0.5) but ACK lost (0.1). Attempt 2: clear.
        let (frames, events, _) = run_with(b"A", Scripted::new(&[0.5, 0.5, 0.1]));
        let frame = &frames[0];
        assert_eq!(frame.status(), FrameStatus::Acked);
        assert_eq!(frame.error_log().len(), 1);
        assert_eq!(frame.error_log()[0].kind, FailureKind::AckLost);

        // Delivered twice: once for the ACK-lost attempt, once for the
        // successful one.
        let processed = events
            .iter()
            .filter(|e| matches!(e, Event::FrameProcessed(_)))
            .count();
        assert_eq!(processed, 2);
    }

    #[test]
    fn retries_exhaust_into_failed() {
        let (frames, events, summary) = run_with(b"A", Fixed(0.0));
        let frame = &frames[0];
        assert_eq!(frame.status(), FrameStatus::Failed);

        // Three loss entries plus the terminal record.
        let log = frame.error_log();
        assert_eq!(log.len(), 4);
        for (i, entry) in log[..3].iter().enumerate() {
            assert_eq!(entry.kind, FailureKind::Lost);
            assert_eq!(entry.attempt, i as u32 + 1);
        }
        assert_eq!(log[3].kind, FailureKind::RetryExhausted);

        // A frame that is never delivered is never reported processed.
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::FrameProcessed(_))));

        let summary = summary.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.acked, 0);
        assert!(summary.checksum_frame_corrupted); // 0.0 < 0.05 too
        assert!(events.iter().any(|e| matches!(e, Event::Error(_))));
    }

    #[test]
    fn failed_frame_does_not_stop_the_run() {
        // 13 zero bytes -> 2 frames. Frame 0 loses all three attempts,
        // frame 1 goes through clean, checksum roll clear.
        let script = Scripted::new(&[0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 0.5]);
        let (frames, _, summary) = run_with(&[0u8; 13], script);

        assert_eq!(frames[0].status(), FrameStatus::Failed);
        assert_eq!(frames[1].status(), FrameStatus::Acked);

        let summary = summary.unwrap();
        assert_eq!(summary.acked + summary.failed, summary.total_frames);
        assert_eq!(summary.problem_frames, vec![0]);
        assert!(!summary.checksum_frame_corrupted);
    }

    #[test]
    fn canonical_payload_restored_after_run() {
        let data = [0x7Eu8; 13]; // all flag bytes, stuffing doubles them
        let (frames, _, _) = run_with(&data, Fixed(0.5));
        for frame in &frames {
            assert_eq!(frame.bit_len(), FRAME_SIZE_BITS);
            assert_eq!(frame.payload().len(), 13);
            assert!(frame.verify_crc());
        }
    }

    #[test]
    fn checksum_is_sum_of_canonical_crcs() {
        let (frames, events, summary) = run_with(&[0x41u8; 13], Fixed(0.5));
        let expected = frames
            .iter()
            .fold(0u32, |acc, f| acc.wrapping_add(u32::from(f.crc())));
        assert_eq!(summary.unwrap().checksum, Checksum::Sum32(expected));

        // Calculated before sent, both before completion.
        let order: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                Event::ChecksumCalculated(_) => Some(0),
                Event::ChecksumFrameSent(_) => Some(1),
                Event::TransmissionComplete(_) => Some(2),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn legacy_checksum_mode() {
        let mut frames = segment(&[0x41u8; 13]).unwrap();
        let mut channel = Channel::new(Fixed(0.5));
        let (tx, _rx) = mpsc::channel();
        let config = EngineConfig {
            checksum_mode: ChecksumMode::Modulo256,
            ..EngineConfig::immediate()
        };
        let summary = transmit(
            &mut frames,
            &mut channel,
            &config,
            &tx,
            &AtomicBool::new(false),
        )
        .unwrap();
        // (0x4B0B + 0x4563) & 0xFF
        assert_eq!(summary.checksum, Checksum::Modulo256(0x6E));
    }

    #[test]
    fn cancellation_before_start_leaves_everything_waiting() {
        let mut frames = segment(&[0u8; 63]).unwrap(); // 504 bits -> 6 frames
        let mut channel = Channel::new(Fixed(0.5));
        let (tx, rx) = mpsc::channel();
        let summary = transmit(
            &mut frames,
            &mut channel,
            &EngineConfig::immediate(),
            &tx,
            &AtomicBool::new(true),
        );

        assert!(summary.is_none());
        assert!(frames.iter().all(|f| f.status() == FrameStatus::Waiting));
        let events: Vec<Event> = rx.try_iter().collect();
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::TransmissionComplete(_))));
    }

    // Clear sampler that trips a cancellation flag after a fixed
    // number of rolls.
    struct CancelAfter {
        remaining: usize,
        cancel: std::sync::Arc<AtomicBool>,
    }

    impl Sampler for CancelAfter {
        fn sample_unit(&mut self) -> f64 {
            if self.remaining == 0 {
                self.cancel.store(true, Ordering::SeqCst);
            } else {
                self.remaining -= 1;
            }
            0.5
        }
    }

    #[test]
    fn stop_after_two_of_six_frames() {
        let cancel = std::sync::Arc::new(AtomicBool::new(false));
        // 63 zero bytes -> 504 bits -> 6 frames; a clear frame costs
        // three rolls (loss, corruption, ACK), so the flag trips during
        // frame 2 and is honored before frame 3.
        let mut frames = segment(&[0u8; 63]).unwrap();
        let mut channel = Channel::new(CancelAfter {
            remaining: 5,
            cancel: std::sync::Arc::clone(&cancel),
        });
        let (tx, rx) = mpsc::channel();
        let summary = transmit(
            &mut frames,
            &mut channel,
            &EngineConfig::immediate(),
            &tx,
            &cancel,
        );

        assert!(summary.is_none());
        assert_eq!(frames[0].status(), FrameStatus::Acked);
        assert_eq!(frames[1].status(), FrameStatus::Acked);
        for frame in &frames[2..] {
            assert_eq!(frame.status(), FrameStatus::Waiting);
        }
        let events: Vec<Event> = rx.try_iter().collect();
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::TransmissionComplete(_))));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data = [0x5Au8; 40];
        let run = |seed: u64| {
            let mut frames = segment(&data).unwrap();
            let mut channel = Channel::from_seed(seed);
            let (tx, rx) = mpsc::channel();
            let summary = transmit(
                &mut frames,
                &mut channel,
                &EngineConfig::immediate(),
                &tx,
                &AtomicBool::new(false),
            );
            (frames, rx.try_iter().collect::<Vec<Event>>(), summary)
        };

        let (frames_a, events_a, summary_a) = run(1234);
        let (frames_b, events_b, summary_b) = run(1234);
        assert_eq!(frames_a, frames_b);
        assert_eq!(events_a, events_b);
        assert_eq!(summary_a, summary_b);
    }
}
