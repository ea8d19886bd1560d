use serde::{Deserialize, Serialize};

use super::{Error, Result};
use crate::protocol::{DATA_WORDS_PER_BATCH, FRAMES_PER_BATCH};

/// One 32-bit POCSAG protocol unit (preamble, sync, idle or payload word).
/// The scheduler never looks inside a codeword beyond its role.
pub type Codeword = u32;

/// A page ready for transmission: a frame position plus pre-encoded
/// payload codewords.
///
/// Address and message encoding (BCH, parity) happen upstream; by the time
/// a page reaches the queue it is an opaque word sequence pinned to the
/// frame its address hashes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Frame (0-7) within a batch at which the payload must start
    frame_pos: u8,
    /// Pre-encoded 32-bit payload codewords
    words: Vec<Codeword>,
    /// Times the encoder has deferred this message for lack of capacity
    #[serde(skip)]
    deferrals: u32,
}

impl Message {
    /// Creates a new message from a frame position and payload codewords
    pub fn new(frame_pos: u8, words: Vec<Codeword>) -> Result<Self> {
        if frame_pos as usize >= FRAMES_PER_BATCH {
            return Err(Error::InvalidFramePosition(frame_pos));
        }
        if words.is_empty() {
            return Err(Error::EmptyMessage);
        }
        Ok(Message {
            frame_pos,
            words,
            deferrals: 0,
        })
    }

    /// Parses the raw producer shape where element 0 carries the frame
    /// position and the remaining elements are the payload
    pub fn from_codewords(raw: &[Codeword]) -> Result<Self> {
        let (&pos, words) = raw.split_first().ok_or(Error::EmptyMessage)?;
        let pos = u8::try_from(pos).unwrap_or(u8::MAX);
        Message::new(pos, words.to_vec())
    }

    /// Returns the frame position (0-7)
    pub fn frame_pos(&self) -> u8 {
        self.frame_pos
    }

    /// Returns the payload codewords
    pub fn words(&self) -> &[Codeword] {
        &self.words
    }

    /// Number of 17-word batches this message occupies when it opens a
    /// fresh batch: idle-filled frames before the payload, the payload
    /// itself, and the final partial batch
    pub fn batches_required(&self) -> usize {
        (self.words.len() + 2 * self.frame_pos as usize) / DATA_WORDS_PER_BATCH + 1
    }

    /// Times this message has been deferred back to the queue head
    pub(crate) fn deferrals(&self) -> u32 {
        self.deferrals
    }

    /// Records one more deferral
    pub(crate) fn record_deferral(&mut self) {
        self.deferrals += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_validation() {
        assert!(Message::new(0, vec![0x1234]).is_ok());
        assert!(Message::new(7, vec![0x1234]).is_ok());

        let err = Message::new(8, vec![0x1234]).unwrap_err();
        assert!(matches!(err, Error::InvalidFramePosition(8)));

        let err = Message::new(0, vec![]).unwrap_err();
        assert!(matches!(err, Error::EmptyMessage));
    }

    #[test]
    fn test_from_codewords() {
        let msg = Message::from_codewords(&[3, 0xAAAA, 0xBBBB]).unwrap();
        assert_eq!(msg.frame_pos(), 3);
        assert_eq!(msg.words(), &[0xAAAA, 0xBBBB]);

        assert!(Message::from_codewords(&[]).is_err());
        assert!(Message::from_codewords(&[9, 0xAAAA]).is_err());
        // frame position far outside u8 range
        assert!(Message::from_codewords(&[0x1_0000, 0xAAAA]).is_err());
    }

    #[test]
    fn test_batches_required() {
        // 3 payload words at frame 0 fit in a single batch
        let msg = Message::new(0, vec![1, 2, 3]).unwrap();
        assert_eq!(msg.batches_required(), 1);

        // frame 7 pushes 14 idle words ahead of the payload
        let msg = Message::new(7, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(msg.batches_required(), 2);

        // exactly one full batch of payload
        let msg = Message::new(0, vec![0; 16]).unwrap();
        assert_eq!(msg.batches_required(), 2);
    }

    #[test]
    fn test_serde_round_trip() {
        let msg = Message::new(5, vec![0xDEADBEEF, 0x12345678]).unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }
}
