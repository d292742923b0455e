use serde::{Deserialize, Serialize};

/// Every packet carries exactly this many payload bytes. Framing is fixed;
/// shorter application messages are zero-padded before submission.
pub const PAYLOAD_SIZE: usize = 20;

/// The single wire unit exchanged between sender and receiver.
///
/// Data packets carry a sequence number and payload; acknowledgments carry
/// an ack number and a zeroed payload. Immutable once constructed: the
/// checksum is computed at build time and never patched afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Sequence number (0 on pure acknowledgments).
    pub seq_num: u32,
    /// Acknowledgment number (0 on data packets).
    pub ack_num: u32,
    /// Fixed-size payload (zeroed on acknowledgments).
    pub payload: [u8; PAYLOAD_SIZE],
    /// Additive checksum over seq_num, ack_num and payload.
    pub checksum: u32,
}

/// Fit arbitrary application data into the fixed payload frame:
/// truncate past `PAYLOAD_SIZE`, zero-pad the remainder.
pub fn pad_payload(data: &[u8]) -> [u8; PAYLOAD_SIZE] {
    let mut payload = [0u8; PAYLOAD_SIZE];
    let n = data.len().min(PAYLOAD_SIZE);
    payload[..n].copy_from_slice(&data[..n]);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_payload_truncates_and_zero_fills() {
        let short = pad_payload(b"hi");
        assert_eq!(&short[..2], b"hi");
        assert!(short[2..].iter().all(|b| *b == 0));

        let long = pad_payload(&[7u8; 64]);
        assert_eq!(long, [7u8; PAYLOAD_SIZE]);
    }
}
