//! Client-side engine for interactive remote-rendering sessions: camera
//! control over a WebSocket, progressive frames and sample-count telemetry
//! back.

pub mod codec;
pub mod connection;
pub mod error;
pub mod export;
pub mod input;
pub mod presentation;
pub mod session;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

pub use connection::{ConnectionManager, ConnectionPhase};
pub use error::{ConnectionError, ExportError, FrameDecodeError};
pub use input::PointerButton;
pub use presentation::{Canvas, ConnectionStatus, PresentationSink};
pub use session::{SessionController, SessionSettings};
