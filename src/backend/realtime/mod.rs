//! Real-time Update Module
//!
//! Live delivery of note edits over WebSocket.
//!
//! # Architecture
//!
//! - **`registry`** - `ConnectionRegistry`: live connections, identity, fan-out
//! - **`rooms`** - `RoomIndex`: bidirectional connection ↔ note membership
//! - **`pipeline`** - `note-update` processing: identify, authorize, persist, broadcast
//! - **`socket`** - Axum WebSocket handler for `/ws`
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── registry.rs  - Connection registry
//! ├── rooms.rs     - Room membership index
//! ├── pipeline.rs  - Update pipeline
//! └── socket.rs    - WebSocket transport
//! ```
//!
//! # Delivery
//!
//! Best effort: a frame reaches the connections that are room members at the
//! moment of the broadcast. There is no replay, queuing for offline clients or
//! cross-process fan-out. Each connection may hold at most `OUTBOX_CAPACITY`
//! undelivered frames; a connection that falls further behind is dropped.

pub mod registry;

pub mod rooms;

pub mod pipeline;

pub mod socket;

pub use registry::{AuthState, ConnectionId, ConnectionRegistry, Frame, Outbox, OUTBOX_CAPACITY};
pub use rooms::RoomIndex;
pub use pipeline::{apply_note_update, broadcast_note_state, UpdateOutcome, UpdateRejection};
pub use socket::{handle_frame, handle_socket_upgrade, Flow};
