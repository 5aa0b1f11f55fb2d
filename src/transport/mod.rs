pub mod backend;
pub mod loopback;

pub use backend::{
    AgentState, CaptureOptions, ConnectionState, MediaDeviceError, RemoteParticipant, RpcRequest,
    Subscription, TrackKind, TrackPublication, TranscriptAuthor, TranscriptEntry, Transport,
    TransportEvent,
};
pub use loopback::{LoopbackTransport, TransportCall};
