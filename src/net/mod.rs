pub mod handler;
pub mod listener;
pub mod sender;

pub use listener::Listener;

/// Fixed read size used as the message-boundary heuristic: a read
/// shorter than this marks "message complete" on the sender side.
pub(crate) const RECV_CHUNK: usize = 4096;
