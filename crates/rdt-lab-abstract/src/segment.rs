use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical endpoint a segment is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Sender,
    Receiver,
}

impl Endpoint {
    pub fn peer(&self) -> Self {
        match self {
            Endpoint::Sender => Endpoint::Receiver,
            Endpoint::Receiver => Endpoint::Sender,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Sender => f.write_str("sender"),
            Endpoint::Receiver => f.write_str("receiver"),
        }
    }
}

/// Bytes a naive receiver hands upward when it is given a corrupted segment.
pub const CORRUPTION_MARKER: &[u8] = b"<CORRUPTED>";

/// What a segment carries. The network substitutes `Corrupted` in-band when it
/// damages a segment in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Data(Vec<u8>),
    Ack,
    Corrupted,
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Data(data) => data,
            Payload::Ack => b"ACK",
            Payload::Corrupted => CORRUPTION_MARKER,
        }
    }
}

/// The unit exchanged over the simulated network.
///
/// Segments are plain values: every transmission hands the network its own
/// clone, so whatever happens to that copy in transit never touches the
/// sender's retained original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub payload: Payload,
    pub destination: Endpoint,
    /// One-bit sequence tag used by the alternating-bit protocol.
    pub sequence_bit: Option<u8>,
    /// Unbounded sequence number used by Go-Back-N.
    pub sequence_number: Option<u64>,
}

impl Segment {
    pub fn new(payload: Payload, destination: Endpoint) -> Self {
        Self {
            payload,
            destination,
            sequence_bit: None,
            sequence_number: None,
        }
    }

    /// A data segment carrying an application message.
    pub fn data(message: &[u8], destination: Endpoint) -> Self {
        Self::new(Payload::Data(message.to_vec()), destination)
    }

    /// An acknowledgment stamped with a sequence bit, addressed to the sender.
    pub fn ack_bit(bit: u8) -> Self {
        Self::new(Payload::Ack, Endpoint::Sender).with_bit(bit)
    }

    /// An acknowledgment stamped with a sequence number, addressed to the sender.
    pub fn ack_number(number: u64) -> Self {
        Self::new(Payload::Ack, Endpoint::Sender).with_number(number)
    }

    pub fn with_bit(mut self, bit: u8) -> Self {
        self.sequence_bit = Some(bit);
        self
    }

    pub fn with_number(mut self, number: u64) -> Self {
        self.sequence_number = Some(number);
        self
    }

    pub fn is_ack(&self) -> bool {
        self.payload == Payload::Ack
    }

    /// Application bytes, if this is an intact data segment.
    pub fn message(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Whichever sequence identifier the segment carries, number first.
    pub fn sequence_id(&self) -> Option<u64> {
        self.sequence_number
            .or(self.sequence_bit.map(u64::from))
    }

    pub fn len(&self) -> usize {
        self.message().map_or(0, <[u8]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// True when the network replaced the segment's content with the corruption marker.
pub fn is_corrupt(segment: &Segment) -> bool {
    segment.payload == Payload::Corrupted
}

/// The other value of a one-bit sequence tag.
pub fn flip(bit: u8) -> u8 {
    (bit + 1) % 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_constructors_address_the_sender() {
        let ack = Segment::ack_bit(1);
        assert!(ack.is_ack());
        assert_eq!(ack.destination, Endpoint::Sender);
        assert_eq!(ack.sequence_bit, Some(1));
        assert_eq!(ack.sequence_number, None);

        let ack = Segment::ack_number(7);
        assert_eq!(ack.sequence_number, Some(7));
        assert_eq!(ack.sequence_id(), Some(7));
    }

    #[test]
    fn corruption_is_detected_by_marker_only() {
        let mut seg = Segment::data(b"hello", Endpoint::Receiver).with_bit(0);
        assert!(!is_corrupt(&seg));
        assert_eq!(seg.message(), Some(&b"hello"[..]));

        seg.payload = Payload::Corrupted;
        assert!(is_corrupt(&seg));
        assert_eq!(seg.message(), None);
        // Header fields survive; only the content is untrustworthy.
        assert_eq!(seg.sequence_bit, Some(0));
    }

    #[test]
    fn clone_is_independent_of_original() {
        let original = Segment::data(b"A", Endpoint::Receiver).with_number(1);
        let mut copy = original.clone();
        copy.payload = Payload::Corrupted;
        assert_eq!(original.message(), Some(&b"A"[..]));
    }

    #[test]
    fn flip_toggles_between_zero_and_one() {
        assert_eq!(flip(0), 1);
        assert_eq!(flip(1), 0);
    }
}
