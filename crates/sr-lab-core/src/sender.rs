//! Selective Repeat send-side state machine.
//!
//! Maintains a sliding window `[base, next_seq)` of at most `window_size`
//! unacknowledged packets, stored in a ring indexed by sequence number
//! modulo `buffer_capacity`. Acknowledgments retire individual slots; only
//! an ack for `base` advances the window, through the contiguous run of
//! already-acked slots above it.
//!
//! Retransmission uses a single logical timer always bound to the oldest
//! unacknowledged packet, rather than one timer per packet. On expiry only
//! the bound packet is resent; canonical per-packet SR timing would need a
//! deadline queue keyed by sequence number, which this design trades away
//! for a much smaller state surface.

use sr_lab_abstract::{Packet, SystemContext, TransportProtocol, pad_payload};

use crate::checksum;
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;

/// Timer id of the single sender-side retransmission timer.
pub const RETRANSMIT_TIMER: u32 = 0;

/// Send-side state for one protocol instance.
pub struct SrSender {
    config: ProtocolConfig,
    /// Oldest unacknowledged sequence number.
    base: u32,
    /// Next sequence number to assign.
    next_seq: u32,
    /// Ring of in-flight packets; `None` marks a free slot.
    slots: Vec<Option<Packet>>,
    /// Ring of acknowledgment flags, parallel to `slots`.
    acked: Vec<bool>,
    timer_active: bool,
    /// Sequence number the timer is currently bound to. Meaningful only
    /// while `timer_active`.
    timer_for_packet: u32,
}

impl SrSender {
    pub fn new(config: ProtocolConfig) -> Self {
        config.check();
        let capacity = config.buffer_capacity as usize;
        Self {
            config,
            base: 1,
            next_seq: 1,
            slots: vec![None; capacity],
            acked: vec![false; capacity],
            timer_active: false,
            timer_for_packet: 0,
        }
    }

    fn reset(&mut self) {
        self.base = 1;
        self.next_seq = 1;
        self.slots.fill(None);
        self.acked.fill(false);
        self.timer_active = false;
        self.timer_for_packet = 0;
    }

    fn slot(&self, seq: u32) -> usize {
        (seq % self.config.buffer_capacity) as usize
    }

    /// Oldest unacknowledged sequence number.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Next sequence number that will be assigned.
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Number of packets currently in flight.
    pub fn in_flight(&self) -> u32 {
        self.next_seq - self.base
    }

    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn timer_for_packet(&self) -> u32 {
        self.timer_for_packet
    }

    /// Admit one application message into the window.
    ///
    /// Rejects with [`ProtocolError::WindowFull`] when `window_size`
    /// packets are already outstanding, without mutating any state. On
    /// admission the packet is stored for retransmission, handed to the
    /// channel, and the timer is started if it was idle.
    pub fn submit(
        &mut self,
        ctx: &mut dyn SystemContext,
        data: &[u8],
    ) -> Result<u32, ProtocolError> {
        if self.next_seq >= self.base + self.config.window_size {
            return Err(ProtocolError::WindowFull);
        }

        let seq = self.next_seq;
        let payload = pad_payload(data);
        let packet = Packet {
            seq_num: seq,
            ack_num: 0,
            checksum: checksum::compute(seq, 0, &payload),
            payload,
        };

        let idx = self.slot(seq);
        self.slots[idx] = Some(packet);
        self.acked[idx] = false;

        ctx.send_packet(packet);

        if !self.timer_active {
            ctx.start_timer(self.config.timeout_ms, RETRANSMIT_TIMER);
            self.timer_active = true;
            self.timer_for_packet = seq;
        }

        self.next_seq += 1;
        Ok(seq)
    }

    /// Process one acknowledgment from the channel.
    ///
    /// A corrupted ack is dropped outright. A valid ack marks its slot;
    /// an ack for `base` additionally advances the window through the
    /// contiguous acked run, clearing each retired slot. The timer is then
    /// reconciled: stopped when everything in `[base, next_seq)` is acked,
    /// or re-armed on the lowest unacked sequence number when the ack was
    /// for the packet the timer tracked. The all-acked scan runs before
    /// the binding comparison on every ack; both live on the same path so
    /// the timer is never left bound to a retired sequence number.
    pub fn handle_ack(
        &mut self,
        ctx: &mut dyn SystemContext,
        packet: &Packet,
    ) -> Result<(), ProtocolError> {
        if !checksum::is_valid(packet) {
            return Err(ProtocolError::CorruptedPacket);
        }

        let ack = packet.ack_num;
        let stale = ack < self.base || ack >= self.next_seq;

        let idx = self.slot(ack);
        self.acked[idx] = true;

        if ack == self.base {
            while self.acked[self.slot(self.base)] && self.slots[self.slot(self.base)].is_some() {
                let idx = self.slot(self.base);
                self.slots[idx] = None;
                self.base += 1;
            }
        }

        let all_acked = (self.base..self.next_seq).all(|seq| self.acked[self.slot(seq)]);
        if all_acked {
            ctx.cancel_timer(RETRANSMIT_TIMER);
            self.timer_active = false;
        } else if ack == self.timer_for_packet {
            ctx.cancel_timer(RETRANSMIT_TIMER);
            self.timer_active = false;
            if let Some(seq) = (self.base..self.next_seq).find(|&s| !self.acked[self.slot(s)]) {
                self.timer_for_packet = seq;
                ctx.start_timer(self.config.timeout_ms, RETRANSMIT_TIMER);
                self.timer_active = true;
            }
        }

        if stale {
            return Err(ProtocolError::StaleAcknowledgment);
        }
        Ok(())
    }

    /// Timer expiry: retransmit the single packet the timer is bound to,
    /// if it is still in flight (it may have been acked and retired
    /// between arming and firing), then unconditionally re-arm.
    pub fn handle_timeout(&mut self, ctx: &mut dyn SystemContext) {
        if self.timer_for_packet >= self.base && self.timer_for_packet < self.next_seq {
            if let Some(packet) = self.slots[self.slot(self.timer_for_packet)] {
                ctx.log(&format!("timeout, retransmitting seq {}", packet.seq_num));
                ctx.send_packet(packet);
            }
        }

        ctx.start_timer(self.config.timeout_ms, RETRANSMIT_TIMER);
        self.timer_active = true;
    }
}

impl TransportProtocol for SrSender {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        self.reset();
        ctx.log(&format!(
            "SR sender ready, window {} of {} slots",
            self.config.window_size, self.config.buffer_capacity
        ));
    }

    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, data: &[u8]) {
        match self.submit(ctx, data) {
            Ok(seq) => ctx.log(&format!("sent packet seq {seq}")),
            Err(err) => ctx.log(&format!("submission rejected: {err}")),
        }
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        match self.handle_ack(ctx, &packet) {
            Ok(()) => ctx.log(&format!("ack {} accepted, base now {}", packet.ack_num, self.base)),
            Err(err) => ctx.log(&format!("ack {}: {err}", packet.ack_num)),
        }
    }

    fn on_timer(&mut self, ctx: &mut dyn SystemContext, timer_id: u32) {
        if timer_id == RETRANSMIT_TIMER {
            self.handle_timeout(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingContext;

    fn sender() -> SrSender {
        SrSender::new(ProtocolConfig::default())
    }

    fn ack(num: u32) -> Packet {
        let payload = [0u8; sr_lab_abstract::PAYLOAD_SIZE];
        Packet {
            seq_num: 0,
            ack_num: num,
            checksum: checksum::compute(0, num, &payload),
            payload,
        }
    }

    fn fill_window(sender: &mut SrSender, ctx: &mut RecordingContext, count: u32) {
        for i in 0..count {
            sender
                .submit(ctx, format!("message {}", i + 1).as_bytes())
                .unwrap();
        }
    }

    #[test]
    fn submissions_beyond_window_are_rejected_without_mutation() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();

        fill_window(&mut s, &mut ctx, 8);
        assert_eq!(s.next_seq(), 9);
        assert_eq!(ctx.sent.len(), 8);

        let err = s.submit(&mut ctx, b"one too many").unwrap_err();
        assert_eq!(err, ProtocolError::WindowFull);
        assert_eq!(s.next_seq(), 9);
        assert_eq!(s.base(), 1);
        assert_eq!(ctx.sent.len(), 8, "rejected submission must not transmit");
    }

    #[test]
    fn only_first_submission_starts_the_timer() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();

        fill_window(&mut s, &mut ctx, 3);
        assert_eq!(ctx.timers_started.len(), 1);
        assert!(s.timer_active());
        assert_eq!(s.timer_for_packet(), 1);
    }

    #[test]
    fn ack_of_base_advances_through_contiguous_acked_run() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 5);

        s.handle_ack(&mut ctx, &ack(2)).unwrap();
        s.handle_ack(&mut ctx, &ack(3)).unwrap();
        assert_eq!(s.base(), 1, "non-base acks must not advance the window");

        s.handle_ack(&mut ctx, &ack(1)).unwrap();
        assert_eq!(s.base(), 4);
        assert_eq!(s.in_flight(), 2, "seqs 4 and 5 remain outstanding");
    }

    #[test]
    fn timer_rebinds_past_a_contiguously_retired_run() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 5);

        // Acks 2 and 3 arrive while the timer still tracks seq 1; the ack
        // for 1 then retires seqs 1..=3 in one contiguous advance and the
        // timer must land on seq 4, not stay on a retired number.
        s.handle_ack(&mut ctx, &ack(2)).unwrap();
        s.handle_ack(&mut ctx, &ack(3)).unwrap();
        assert_eq!(s.timer_for_packet(), 1);

        s.handle_ack(&mut ctx, &ack(1)).unwrap();
        assert_eq!(s.base(), 4);
        assert!(s.timer_active());
        assert_eq!(s.timer_for_packet(), 4);

        ctx.sent.clear();
        s.handle_timeout(&mut ctx);
        assert_eq!(ctx.sent.len(), 1);
        assert_eq!(ctx.sent[0].seq_num, 4, "expiry must resend seq 4 alone");
    }

    #[test]
    fn duplicate_ack_is_idempotent() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 3);

        s.handle_ack(&mut ctx, &ack(1)).unwrap();
        assert_eq!(s.base(), 2);

        let err = s.handle_ack(&mut ctx, &ack(1)).unwrap_err();
        assert_eq!(err, ProtocolError::StaleAcknowledgment);
        assert_eq!(s.base(), 2, "base must not advance twice for one ack");
        assert_eq!(s.in_flight(), 2);
    }

    #[test]
    fn corrupted_ack_is_dropped_without_state_change() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 2);

        let mut bad = ack(1);
        bad.payload[0] ^= 0x40;
        let err = s.handle_ack(&mut ctx, &bad).unwrap_err();
        assert_eq!(err, ProtocolError::CorruptedPacket);
        assert_eq!(s.base(), 1);
        assert!(s.timer_active());
        assert_eq!(s.timer_for_packet(), 1);
    }

    #[test]
    fn base_ack_rebinds_timer_to_next_unacked() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 3);
        assert_eq!(s.timer_for_packet(), 1);

        s.handle_ack(&mut ctx, &ack(1)).unwrap();
        assert!(s.timer_active());
        assert_eq!(s.timer_for_packet(), 2);
        assert_eq!(ctx.timers_cancelled.len(), 1);
        assert_eq!(ctx.timers_started.len(), 2);

        ctx.sent.clear();
        s.handle_timeout(&mut ctx);
        assert_eq!(ctx.sent.len(), 1);
        assert_eq!(ctx.sent[0].seq_num, 2, "expiry must retransmit seq 2, not seq 1");
    }

    #[test]
    fn timeout_retransmits_only_the_bound_packet() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 5);

        // Everything but seq 3 gets acked; the rebind lands on 3.
        for n in [1, 2, 4, 5] {
            s.handle_ack(&mut ctx, &ack(n)).unwrap();
        }
        assert_eq!(s.base(), 3);
        assert!(s.timer_active());
        assert_eq!(s.timer_for_packet(), 3);

        ctx.sent.clear();
        s.handle_timeout(&mut ctx);
        assert_eq!(ctx.sent.len(), 1, "selective repeat resends one packet");
        assert_eq!(ctx.sent[0].seq_num, 3);
    }

    #[test]
    fn all_acked_stops_the_timer() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 2);

        s.handle_ack(&mut ctx, &ack(2)).unwrap();
        assert!(s.timer_active());

        s.handle_ack(&mut ctx, &ack(1)).unwrap();
        assert!(!s.timer_active());
        assert_eq!(s.base(), 3);
        assert_eq!(s.in_flight(), 0);
    }

    #[test]
    fn timeout_with_empty_window_resends_nothing() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();

        s.handle_timeout(&mut ctx);
        assert!(ctx.sent.is_empty());
        assert!(s.timer_active(), "expiry always re-arms");
    }

    #[test]
    fn window_reopens_after_base_advance() {
        let mut s = sender();
        let mut ctx = RecordingContext::default();
        fill_window(&mut s, &mut ctx, 8);
        assert!(s.submit(&mut ctx, b"stalled").is_err());

        s.handle_ack(&mut ctx, &ack(1)).unwrap();
        let seq = s.submit(&mut ctx, b"admitted").unwrap();
        assert_eq!(seq, 9);
        assert_eq!(s.in_flight(), 8);
    }
}
