//! Selective Repeat receive-side state machine.
//!
//! Buffers packets that arrive ahead of `expected_seq` and releases the
//! maximal contiguous run to the application as soon as the gap below them
//! closes. Every validly received packet is acknowledged, duplicates
//! included: the retransmission that produced the duplicate means the
//! original ack was lost, and only a fresh ack can stop the resends.

use sr_lab_abstract::{PAYLOAD_SIZE, Packet, SystemContext, TransportProtocol};

use crate::checksum;
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;

/// Receive-side state for one protocol instance.
pub struct SrReceiver {
    config: ProtocolConfig,
    /// Lowest sequence number not yet delivered to the application.
    expected_seq: u32,
    /// Ring of out-of-order packets awaiting a gap fill.
    slots: Vec<Option<Packet>>,
}

impl SrReceiver {
    pub fn new(config: ProtocolConfig) -> Self {
        config.check();
        let capacity = config.buffer_capacity as usize;
        Self {
            config,
            expected_seq: 1,
            slots: vec![None; capacity],
        }
    }

    fn reset(&mut self) {
        self.expected_seq = 1;
        self.slots.fill(None);
    }

    fn slot(&self, seq: u32) -> usize {
        (seq % self.config.buffer_capacity) as usize
    }

    /// Lowest sequence number not yet delivered.
    pub fn expected_seq(&self) -> u32 {
        self.expected_seq
    }

    /// Number of packets buffered above a gap.
    pub fn buffered(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn send_ack(&self, ctx: &mut dyn SystemContext, seq: u32) {
        let payload = [0u8; PAYLOAD_SIZE];
        let ack = Packet {
            seq_num: 0,
            ack_num: seq,
            checksum: checksum::compute(0, seq, &payload),
            payload,
        };
        ctx.send_packet(ack);
    }

    /// Process one data packet from the channel.
    ///
    /// Corrupted packets are dropped before anything else happens: no ack,
    /// no buffering. Valid packets are always acknowledged; in-window ones
    /// are buffered and the contiguous run starting at `expected_seq` is
    /// delivered, duplicates below the window are re-acked only, and
    /// anything else is noise.
    pub fn handle_data(
        &mut self,
        ctx: &mut dyn SystemContext,
        packet: &Packet,
    ) -> Result<(), ProtocolError> {
        if !checksum::is_valid(packet) {
            return Err(ProtocolError::CorruptedPacket);
        }

        let seq = packet.seq_num;
        self.send_ack(ctx, seq);

        let window = self.config.window_size;
        if seq >= self.expected_seq && seq < self.expected_seq + window {
            let idx = self.slot(seq);
            self.slots[idx] = Some(*packet);

            loop {
                let idx = self.slot(self.expected_seq);
                let Some(ready) = self.slots[idx].take() else {
                    break;
                };
                ctx.deliver_data(&ready.payload);
                self.expected_seq += 1;
            }
        } else if seq >= self.expected_seq.saturating_sub(window) && seq < self.expected_seq {
            // Already delivered; the earlier ack was presumably lost.
            ctx.log(&format!("duplicate packet seq {seq}, re-acknowledged"));
        } else {
            ctx.log(&format!("packet seq {seq} outside both windows, ignored"));
        }

        Ok(())
    }
}

impl TransportProtocol for SrReceiver {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        self.reset();
        ctx.log("SR receiver ready");
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        if let Err(err) = self.handle_data(ctx, &packet) {
            ctx.log(&format!("packet seq {}: {err}", packet.seq_num));
        }
    }

    fn on_timer(&mut self, _ctx: &mut dyn SystemContext, _timer_id: u32) {
        // The receiver never originates timers in this unidirectional design.
    }

    fn on_app_data(&mut self, _ctx: &mut dyn SystemContext, _data: &[u8]) {
        // Data flows A to B only; the receiver has nothing to send.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingContext;
    use sr_lab_abstract::pad_payload;

    fn receiver() -> SrReceiver {
        SrReceiver::new(ProtocolConfig::default())
    }

    fn data(seq: u32, text: &str) -> Packet {
        let payload = pad_payload(text.as_bytes());
        Packet {
            seq_num: seq,
            ack_num: 0,
            checksum: checksum::compute(seq, 0, &payload),
            payload,
        }
    }

    fn delivered_texts(ctx: &RecordingContext) -> Vec<String> {
        ctx.delivered
            .iter()
            .map(|d| {
                let end = d.iter().position(|b| *b == 0).unwrap_or(d.len());
                String::from_utf8_lossy(&d[..end]).into_owned()
            })
            .collect()
    }

    #[test]
    fn in_order_packets_are_delivered_and_acked() {
        let mut r = receiver();
        let mut ctx = RecordingContext::default();

        r.handle_data(&mut ctx, &data(1, "M1")).unwrap();
        r.handle_data(&mut ctx, &data(2, "M2")).unwrap();

        assert_eq!(delivered_texts(&ctx), ["M1", "M2"]);
        assert_eq!(r.expected_seq(), 3);
        let acks: Vec<u32> = ctx.sent.iter().map(|p| p.ack_num).collect();
        assert_eq!(acks, [1, 2]);
        assert!(ctx.sent.iter().all(|p| checksum::is_valid(p)));
    }

    #[test]
    fn out_of_order_packet_is_buffered_until_the_gap_closes() {
        let mut r = receiver();
        let mut ctx = RecordingContext::default();

        r.handle_data(&mut ctx, &data(3, "M3")).unwrap();
        assert!(ctx.delivered.is_empty(), "seq 3 must wait for 1 and 2");
        assert_eq!(r.buffered(), 1);
        assert_eq!(ctx.sent.last().unwrap().ack_num, 3, "buffered packet still acked");

        r.handle_data(&mut ctx, &data(1, "M1")).unwrap();
        assert_eq!(delivered_texts(&ctx), ["M1"]);

        r.handle_data(&mut ctx, &data(2, "M2")).unwrap();
        assert_eq!(delivered_texts(&ctx), ["M1", "M2", "M3"]);
        assert_eq!(r.expected_seq(), 4);
        assert_eq!(r.buffered(), 0);
    }

    #[test]
    fn duplicate_of_delivered_packet_is_reacked_but_not_redelivered() {
        let mut r = receiver();
        let mut ctx = RecordingContext::default();

        r.handle_data(&mut ctx, &data(1, "M1")).unwrap();
        assert_eq!(ctx.delivered.len(), 1);

        r.handle_data(&mut ctx, &data(1, "M1")).unwrap();
        assert_eq!(ctx.delivered.len(), 1, "no duplicate delivery");
        assert_eq!(r.expected_seq(), 2);
        let acks: Vec<u32> = ctx.sent.iter().map(|p| p.ack_num).collect();
        assert_eq!(acks, [1, 1], "duplicates are re-acknowledged");
    }

    #[test]
    fn corrupted_packet_produces_no_ack_and_no_delivery() {
        let mut r = receiver();
        let mut ctx = RecordingContext::default();

        let mut bad = data(1, "M1");
        bad.payload[3] ^= 0x80;
        let err = r.handle_data(&mut ctx, &bad).unwrap_err();

        assert_eq!(err, ProtocolError::CorruptedPacket);
        assert!(ctx.sent.is_empty());
        assert!(ctx.delivered.is_empty());
        assert_eq!(r.expected_seq(), 1);
    }

    #[test]
    fn packet_beyond_both_windows_is_acked_but_ignored() {
        let mut r = receiver();
        let mut ctx = RecordingContext::default();

        r.handle_data(&mut ctx, &data(40, "far future")).unwrap();
        assert_eq!(ctx.sent.len(), 1);
        assert_eq!(ctx.sent[0].ack_num, 40);
        assert!(ctx.delivered.is_empty());
        assert_eq!(r.buffered(), 0, "out-of-window packet must not be buffered");
        assert_eq!(r.expected_seq(), 1);
    }

    #[test]
    fn delivery_order_is_strictly_increasing_under_reordering_and_duplication() {
        let mut r = receiver();
        let mut ctx = RecordingContext::default();

        for seq in [2u32, 4, 2, 1, 1, 3] {
            r.handle_data(&mut ctx, &data(seq, &format!("M{seq}")))
                .unwrap();
        }

        assert_eq!(delivered_texts(&ctx), ["M1", "M2", "M3", "M4"]);
        assert_eq!(r.expected_seq(), 5);
    }
}
