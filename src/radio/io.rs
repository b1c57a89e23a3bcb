use thiserror::Error;

/// Line level after an edge, as reported by the GPIO driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// A level transition with its microsecond timestamp. The tick counter is
/// 32 bits and wraps; consumers must difference with wrapping arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub level: Level,
    pub tick: u32,
}

/// One step of an output waveform: which pins go high, which go low, and for
/// how long the line holds before the next step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pulse {
    pub on_mask: u32,
    pub off_mask: u32,
    pub micros: u32,
}

impl Pulse {
    pub fn on(pin: u8, micros: u32) -> Pulse {
        Pulse {
            on_mask: 1u32 << pin,
            off_mask: 0,
            micros,
        }
    }

    pub fn off(pin: u8, micros: u32) -> Pulse {
        Pulse {
            on_mask: 0,
            off_mask: 1u32 << pin,
            micros,
        }
    }
}

/// Edge callbacks are invoked serially from the driver's callback context.
pub type EdgeCallback = Box<dyn FnMut(Edge) + Send>;

#[derive(Clone, Debug, Error)]
pub enum DriverError {
    #[error("receiver or transmitter pin is required")]
    NotConfigured,
    #[error("receiver is not configured")]
    NotReceiver,
    #[error("transmitter is not configured")]
    NotTransmitter,
    #[error("receive pipe closed")]
    Closed,
    #[error("pulse transmission failed: {0}")]
    PulseQueue(String),
}

/// The GPIO driver boundary. Implementations must apply a 50 µs glitch
/// filter before delivering edges.
pub trait RawIo: Send + Sync {
    fn register_edge_callback(&self, cb: EdgeCallback) -> Result<(), DriverError>;
    fn emit_pulses(&self, pulses: &[Pulse]) -> Result<(), DriverError>;
}
