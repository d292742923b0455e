pub mod config;
pub mod interface;
pub mod packet;
pub mod scenario;

pub use config::SimConfig;
pub use interface::{SystemContext, TransportProtocol};
pub use packet::{PAYLOAD_SIZE, Packet, pad_payload};
pub use scenario::{SimConfigOverride, TestAction, TestAssertion, TestScenario};
