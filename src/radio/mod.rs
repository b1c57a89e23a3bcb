// Radio layer: pulse-level codec, bit-to-byte framing and the transceiver
// that binds them to a GPIO driver.
pub mod framer;
pub mod io;
pub mod medium;
pub mod pulse;
pub mod transceiver;

pub use framer::DecodeError;
pub use io::{DriverError, Edge, EdgeCallback, Level, Pulse, RawIo};
pub use pulse::{modulate, Demodulator, Symbol, TransmissionClass};
pub use transceiver::{Transceiver, TransceiverConfig};
