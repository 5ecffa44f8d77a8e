pub mod gateway;
pub mod storage;
pub mod terminal;

pub use gateway::HttpGateway;
pub use storage::FileStorage;
pub use terminal::{DirectorySaveSink, TerminalConfirmation};
