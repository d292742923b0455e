//! Additive checksum over a packet's header fields and payload.
//! Detects channel corruption only; it makes no tamper-resistance claims.

use sr_lab_abstract::{PAYLOAD_SIZE, Packet};

/// Sum of seq_num, ack_num and every payload byte, wrapping on overflow.
pub fn compute(seq_num: u32, ack_num: u32, payload: &[u8; PAYLOAD_SIZE]) -> u32 {
    let mut sum = seq_num.wrapping_add(ack_num);
    for &byte in payload {
        sum = sum.wrapping_add(byte as u32);
    }
    sum
}

/// Recompute the checksum and compare it with the carried field.
/// A mismatch is indistinguishable from channel corruption.
pub fn is_valid(packet: &Packet) -> bool {
    compute(packet.seq_num, packet.ack_num, &packet.payload) == packet.checksum
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_lab_abstract::pad_payload;

    #[test]
    fn compute_sums_header_and_payload() {
        let payload = pad_payload(&[1, 2, 3]);
        assert_eq!(compute(5, 7, &payload), 5 + 7 + 1 + 2 + 3);
        assert_eq!(compute(0, 0, &[0u8; PAYLOAD_SIZE]), 0);
    }

    #[test]
    fn flipped_payload_byte_fails_validation() {
        let payload = pad_payload(b"some message");
        let mut packet = Packet {
            seq_num: 3,
            ack_num: 0,
            checksum: compute(3, 0, &payload),
            payload,
        };
        assert!(is_valid(&packet));

        packet.payload[4] ^= 0x01;
        assert!(!is_valid(&packet));
    }

    #[test]
    fn altered_header_fails_validation() {
        let payload = [0u8; PAYLOAD_SIZE];
        let mut packet = Packet {
            seq_num: 0,
            ack_num: 9,
            checksum: compute(0, 9, &payload),
            payload,
        };
        assert!(is_valid(&packet));

        packet.ack_num = 10;
        assert!(!is_valid(&packet));
    }
}
