//! Serial connection handling: line framing, the per-connection reader, and
//! the reconnecting supervisor.

pub mod framer;
pub mod port;
pub mod reader;
pub mod supervisor;

pub use framer::LineFramer;
pub use port::{Connector, PortSettings, SerialConnector, open_port};
pub use reader::{Generation, ReaderExit};
pub use supervisor::{ConnectionState, Supervisor};
