use crate::packet::Packet;

/// The capability provided by the channel harness to a protocol endpoint.
/// State machines interact with the network, the timer service and the
/// application layer exclusively through this trait.
pub trait SystemContext {
    /// Hand a packet to the unreliable channel. Fire-and-forget.
    fn send_packet(&mut self, packet: Packet);

    /// Request a timer-expiry event `delay_ms` from now.
    /// `timer_id` identifies the timer; the harness keeps at most one
    /// pending expiry per (endpoint, id), so re-arming cancels and restarts.
    fn start_timer(&mut self, delay_ms: u64, timer_id: u32);

    /// Cancel a pending timer. Cancelling a timer that is not running is
    /// legal and has no effect.
    fn cancel_timer(&mut self, timer_id: u32);

    /// Deliver a payload to the application layer.
    fn deliver_data(&mut self, data: &[u8]);

    /// Log a message through the harness's debug output. Observational
    /// only; must never influence protocol state.
    fn log(&mut self, message: &str);

    /// Current simulation time in ms.
    fn now(&self) -> u64;
}

/// The event-handler surface of a protocol endpoint. The harness delivers
/// one event at a time and each handler runs to completion before the next
/// event is processed.
pub trait TransportProtocol {
    /// Called once when the simulation starts.
    fn init(&mut self, _ctx: &mut dyn SystemContext) {}

    /// Called when a packet arrives from the channel.
    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet);

    /// Called when a previously started timer expires.
    fn on_timer(&mut self, ctx: &mut dyn SystemContext, timer_id: u32);

    /// Called when the application layer submits data for reliable transfer.
    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, data: &[u8]);
}
