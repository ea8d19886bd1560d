use std::collections::VecDeque;

use tracing::debug;

use super::{BITS_PER_BATCH, BIT_RATE, IDLE, PREAMBLE, PREAMBLE_WORDS, SYNC, WORDS_PER_BATCH};
use crate::core::{Codeword, Message};

/// Result of one encoder invocation
#[derive(Debug)]
pub struct EncodeOutput {
    /// Framed sequence: 18 preamble words followed by whole 17-word batches
    pub codewords: Vec<Codeword>,
    /// Messages ejected after exhausting their delivery attempts
    pub rejected: Vec<Message>,
}

/// Maximum number of batches that fit into `slot_count` contiguous
/// authorized slots, reduced by the accumulated timing correction `delay`
/// (100 ms units).
///
/// Each slot offers 6.4 s of air time, of which 0.48 s is lost to guard
/// and preamble overhead; at 1200 bit/s and 544 bits per batch that caps
/// the batch count for the window. The result may be zero or negative,
/// which means no message may be dequeued this call.
pub fn max_batches(slot_count: usize, delay: i32) -> i32 {
    let usable_secs = 6.40 * slot_count as f64 - 0.48 - f64::from(delay) / 10.0;
    (usable_secs * f64::from(BIT_RATE) / f64::from(BITS_PER_BATCH)).floor() as i32
}

/// Drains `queue` head-first into a framed codeword sequence.
///
/// The 18-word preamble is always emitted. A head message whose projected
/// batch count exceeds the window capacity is put back at the head and
/// ends the pass; messages behind it are never sent out of order. A
/// message that has been deferred `max_attempts` times is moved to the
/// rejected list instead of requeued, so an oversized page cannot starve
/// the queue behind it.
pub fn encode(
    slot_count: usize,
    delay: i32,
    queue: &mut VecDeque<Message>,
    max_attempts: u32,
) -> EncodeOutput {
    let max_batch = max_batches(slot_count, delay);

    let mut data = vec![PREAMBLE; PREAMBLE_WORDS];
    let mut rejected = Vec::new();

    while let Some(mut message) = queue.pop_front() {
        let batches_used = (data.len() - PREAMBLE_WORDS) / WORDS_PER_BATCH;
        let projected = batches_used + message.batches_required();

        if projected as i64 > i64::from(max_batch) {
            message.record_deferral();
            if message.deferrals() >= max_attempts {
                rejected.push(message);
                continue;
            }
            queue.push_front(message);
            break;
        }

        // every batch starts with a sync codeword
        data.push(SYNC);

        // idle words until the message's frame position is reached
        for _ in 0..message.frame_pos() {
            data.push(IDLE);
            data.push(IDLE);
        }

        for &word in message.words() {
            // continue into the next batch mid-message
            if (data.len() - PREAMBLE_WORDS) % WORDS_PER_BATCH == 0 {
                data.push(SYNC);
            }
            data.push(word);
        }

        // fill the final batch with idle words
        while (data.len() - PREAMBLE_WORDS) % WORDS_PER_BATCH != 0 {
            data.push(IDLE);
        }
    }

    debug!(
        used = (data.len() - PREAMBLE_WORDS) / WORDS_PER_BATCH,
        max_batch, "batches encoded"
    );

    EncodeOutput {
        codewords: data,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(messages: Vec<Message>) -> VecDeque<Message> {
        messages.into_iter().collect()
    }

    /// Message of exactly `n` batches at frame position 0
    fn message_of_batches(n: usize) -> Message {
        Message::new(0, vec![0x1111_1111; (n - 1) * 16]).unwrap()
    }

    #[test]
    fn test_max_batches_table() {
        // (slot_count, delay) -> floor((6.40 * slots - 0.48 - delay/10) * 1200 / 544)
        assert_eq!(max_batches(1, 0), 13);
        assert_eq!(max_batches(2, 0), 27);
        assert_eq!(max_batches(16, 0), 224);
        assert_eq!(max_batches(1, 20), 8);
        assert_eq!(max_batches(1, -20), 17);
        // no slots at all goes negative, not zero
        assert_eq!(max_batches(0, 0), -2);
        assert_eq!(max_batches(1, 100), -9);
    }

    #[test]
    fn test_empty_queue_is_preamble_only() {
        let mut queue = VecDeque::new();
        let output = encode(5, 0, &mut queue, 8);
        assert_eq!(output.codewords.len(), PREAMBLE_WORDS);
        assert!(output.codewords.iter().all(|&w| w == PREAMBLE));
        assert!(output.rejected.is_empty());
    }

    #[test]
    fn test_single_message_framing() {
        let mut queue = queue_of(vec![Message::new(0, vec![0xA, 0xB, 0xC]).unwrap()]);
        let output = encode(1, 0, &mut queue, 8);

        // 18 preamble + 1 sync + 3 payload + 13 idle
        assert_eq!(output.codewords.len(), 35);
        assert!(output.codewords[..18].iter().all(|&w| w == PREAMBLE));
        assert_eq!(output.codewords[18], SYNC);
        assert_eq!(&output.codewords[19..22], &[0xA, 0xB, 0xC]);
        assert!(output.codewords[22..].iter().all(|&w| w == IDLE));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_frame_position_idle_fill() {
        let mut queue = queue_of(vec![Message::new(3, vec![0xF00D]).unwrap()]);
        let output = encode(1, 0, &mut queue, 8);

        let body = &output.codewords[18..];
        assert_eq!(body[0], SYNC);
        // frames 0-2 are idle-filled, two words each
        assert!(body[1..7].iter().all(|&w| w == IDLE));
        assert_eq!(body[7], 0xF00D);
        assert_eq!(body.len(), 17);
    }

    #[test]
    fn test_mid_message_batch_continuation() {
        // frame 7 leaves room for 2 payload words in the first batch, so a
        // 4-word payload spills into a second batch behind a fresh sync
        let mut queue = queue_of(vec![Message::new(7, vec![0x1, 0x2, 0x3, 0x4]).unwrap()]);
        let output = encode(1, 0, &mut queue, 8);

        let body = &output.codewords[18..];
        assert_eq!(body.len(), 34);
        assert_eq!(body[0], SYNC);
        assert!(body[1..15].iter().all(|&w| w == IDLE));
        assert_eq!(&body[15..17], &[0x1, 0x2]);
        assert_eq!(body[17], SYNC);
        assert_eq!(&body[18..20], &[0x3, 0x4]);
        assert!(body[20..].iter().all(|&w| w == IDLE));
    }

    #[test]
    fn test_batch_alignment_after_mixed_messages() {
        let mut queue = queue_of(vec![
            Message::new(2, vec![0x1; 5]).unwrap(),
            Message::new(0, vec![0x2; 20]).unwrap(),
            Message::new(6, vec![0x3; 2]).unwrap(),
        ]);
        let output = encode(4, 0, &mut queue, 8);

        assert!(queue.is_empty());
        assert_eq!((output.codewords.len() - PREAMBLE_WORDS) % WORDS_PER_BATCH, 0);
        let used = (output.codewords.len() - PREAMBLE_WORDS) / WORDS_PER_BATCH;
        assert!(used as i32 <= max_batches(4, 0));
    }

    #[test]
    fn test_messages_emitted_in_order() {
        let mut queue = queue_of(vec![
            Message::new(0, vec![0xAAA1]).unwrap(),
            Message::new(0, vec![0xAAA2]).unwrap(),
        ]);
        let output = encode(1, 0, &mut queue, 8);

        let first = output.codewords.iter().position(|&w| w == 0xAAA1).unwrap();
        let second = output.codewords.iter().position(|&w| w == 0xAAA2).unwrap();
        assert!(first < second);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_oversized_head_defers_and_blocks() {
        // 14 batches against a 13-batch window: nothing is sent, and the
        // small message behind the head stays queued in order
        let mut queue = queue_of(vec![
            message_of_batches(14),
            Message::new(0, vec![0xBEEF]).unwrap(),
        ]);
        let output = encode(1, 0, &mut queue, 8);

        assert_eq!(output.codewords.len(), PREAMBLE_WORDS);
        assert!(output.rejected.is_empty());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].words().len(), 13 * 16);
        assert_eq!(queue[1].words(), &[0xBEEF]);
    }

    #[test]
    fn test_partial_window_defers_second_message() {
        // the head projects 13 batches and emits 12, leaving one batch of
        // capacity; a two-batch page must wait for the next pass
        let mut queue = queue_of(vec![
            message_of_batches(13),
            Message::new(0, vec![0xBEEF; 17]).unwrap(),
        ]);
        let output = encode(1, 0, &mut queue, 8);

        assert_eq!(
            (output.codewords.len() - PREAMBLE_WORDS) / WORDS_PER_BATCH,
            12
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].words().len(), 17);
        assert!(queue[0].words().iter().all(|&w| w == 0xBEEF));
    }

    #[test]
    fn test_non_positive_capacity_sends_nothing() {
        let mut queue = queue_of(vec![Message::new(0, vec![0x1]).unwrap()]);
        let output = encode(0, 0, &mut queue, 8);
        assert_eq!(output.codewords.len(), PREAMBLE_WORDS);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_starved_message_is_rejected_and_unblocks() {
        let mut queue = queue_of(vec![
            message_of_batches(14),
            Message::new(0, vec![0xBEEF]).unwrap(),
        ]);

        // two deferrals tolerated, rejected on the third pass
        for _ in 0..2 {
            let output = encode(1, 0, &mut queue, 3);
            assert_eq!(output.codewords.len(), PREAMBLE_WORDS);
            assert!(output.rejected.is_empty());
            assert_eq!(queue.len(), 2);
        }

        let output = encode(1, 0, &mut queue, 3);
        assert_eq!(output.rejected.len(), 1);
        assert_eq!(output.rejected[0].words().len(), 13 * 16);
        // the message behind the starved head goes out in the same pass
        assert!(output.codewords.contains(&0xBEEF));
        assert!(queue.is_empty());
    }
}
