use std::sync::Arc;

use log::{debug, trace};
use tokio::sync::mpsc;

use crate::protocol::Message;

use super::framer;
use super::io::{DriverError, RawIo};
use super::pulse::{modulate, Demodulator, TransmissionClass};

/// GPIO pin assignment for one transceiver. At least one direction must be
/// configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransceiverConfig {
    pub rx_pin: Option<u8>,
    pub tx_pin: Option<u8>,
}

/// Binds the pulse codec and framer to a GPIO driver.
///
/// The receive path runs entirely inside the driver's edge callback: the
/// demodulator accumulates symbols per edge and completed frames are framed,
/// parsed and handed to `recv()` through a channel. Codec and parse failures
/// are logged and dropped there; the radio keeps listening. Multiple radios
/// are multiplexed by selecting over their `recv()` futures.
pub struct Transceiver {
    io: Arc<dyn RawIo>,
    tx_pin: Option<u8>,
    incoming: mpsc::UnboundedReceiver<Message>,
}

impl Transceiver {
    pub fn new(io: Arc<dyn RawIo>, config: TransceiverConfig) -> Result<Transceiver, DriverError> {
        if config.rx_pin.is_none() && config.tx_pin.is_none() {
            return Err(DriverError::NotConfigured);
        }
        let (sender, incoming) = mpsc::unbounded_channel();
        if config.rx_pin.is_some() {
            let mut demod = Demodulator::new();
            io.register_edge_callback(Box::new(move |edge| {
                let Some(bits) = demod.edge(edge.level, edge.tick) else {
                    return;
                };
                match framer::decode(&bits) {
                    Ok(bytes) => {
                        trace!("rx frame: {:02X?}", bytes);
                        match Message::parse(&bytes) {
                            Ok(msg) => {
                                debug!("received {}", msg);
                                let _ = sender.send(msg);
                            }
                            Err(e) => debug!("dropping frame ({}): {:02X?}", e, bytes),
                        }
                    }
                    Err(e) => debug!("dropping transmission: {}", e),
                }
            }))?;
        }
        Ok(Transceiver {
            io,
            tx_pin: config.tx_pin,
            incoming,
        })
    }

    /// Waits for the next decoded message. Fails only when the driver is
    /// gone, which is fatal for this transceiver.
    pub async fn recv(&mut self) -> Result<Message, DriverError> {
        self.incoming.recv().await.ok_or(DriverError::Closed)
    }

    /// Encodes and transmits one message. Sensor-class retransmission runs
    /// at the device layer, not here.
    pub fn send(&self, msg: &Message) -> Result<(), DriverError> {
        let pin = self.tx_pin.ok_or(DriverError::NotTransmitter)?;
        let class = match msg {
            Message::BaseStation(_) => TransmissionClass::BaseStation,
            Message::Keypad(_) => TransmissionClass::Keypad,
            Message::Sensor(_) => TransmissionClass::Sensor,
        };
        let bytes = msg.encode();
        trace!("tx frame: {:02X?}", bytes);
        self.io.emit_pulses(&modulate(&bytes, class, pin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{KeypadEvent, KeypadMessage, SerialNumber};
    use crate::radio::medium::{Medium, Radio};

    fn pair() -> (Transceiver, Transceiver) {
        let band = Medium::new();
        let a = Radio::new(None, Some(band.clone())).unwrap();
        let b = Radio::new(Some(band), None).unwrap();
        let a = Transceiver::new(
            Arc::new(a),
            TransceiverConfig {
                rx_pin: None,
                tx_pin: Some(20),
            },
        )
        .unwrap();
        let b = Transceiver::new(
            Arc::new(b),
            TransceiverConfig {
                rx_pin: Some(27),
                tx_pin: None,
            },
        )
        .unwrap();
        (a, b)
    }

    fn away_request() -> Message {
        Message::Keypad(KeypadMessage {
            sn: SerialNumber::new("167JC").unwrap(),
            sequence: 4,
            event: KeypadEvent::Away,
        })
    }

    #[tokio::test]
    async fn test_send_recv_over_medium() {
        let (tx, mut rx) = pair();
        let msg = away_request();
        tx.send(&msg).unwrap();
        assert_eq!(rx.recv().await.unwrap(), msg);
    }

    #[tokio::test]
    async fn test_multiple_radios_multiplex() {
        let (tx_a, mut rx_a) = pair();
        let (tx_b, mut rx_b) = pair();
        tx_b.send(&away_request()).unwrap();
        tokio::select! {
            msg = rx_a.recv() => panic!("wrong radio delivered {:?}", msg),
            msg = rx_b.recv() => assert_eq!(msg.unwrap(), away_request()),
        }
        tx_a.send(&away_request()).unwrap();
        assert_eq!(rx_a.recv().await.unwrap(), away_request());
    }

    #[tokio::test]
    async fn test_send_without_transmitter_fails() {
        let (_tx, rx) = pair();
        assert!(matches!(
            rx.send(&away_request()),
            Err(DriverError::NotTransmitter)
        ));
    }

    #[tokio::test]
    async fn test_corrupted_transmission_is_dropped() {
        let band = Medium::new();
        let a = Radio::new(None, Some(band.clone())).unwrap();
        let b = Radio::new(Some(band), None).unwrap();
        let b = Transceiver::new(
            Arc::new(b),
            TransceiverConfig {
                rx_pin: Some(27),
                tx_pin: None,
            },
        )
        .unwrap();
        // A frame with a corrupted checksum byte followed by a valid one:
        // only the valid frame comes out.
        let msg = away_request();
        let mut corrupted = msg.encode();
        let len = corrupted.len();
        corrupted[len - 1] ^= 0xFF;
        a.emit_pulses(&modulate(&corrupted, TransmissionClass::Keypad, 20))
            .unwrap();
        a.emit_pulses(&modulate(&msg.encode(), TransmissionClass::Keypad, 20))
            .unwrap();
        let mut b = b;
        assert_eq!(b.recv().await.unwrap(), msg);
        assert!(b.incoming.try_recv().is_err());
    }
}
