use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::protocol::{
    EntryEvent, KeychainEvent, Message, MotionEvent, SensorEvent, SensorMessage, SerialNumber,
};
use crate::radio::Transceiver;

/// Total transmissions per sensor event, counting the immediate one.
const TRANSMISSIONS: usize = 3;
const RETRANSMIT_GAP: Duration = Duration::from_secs(2);

/// Transmit-only radio endpoint shared by the sensor device types. Each
/// event goes on the air immediately and is repeated twice more at two
/// second intervals; a newer event from the same device aborts the pending
/// repeats of the old one.
struct SensorRadio {
    txr: Arc<Transceiver>,
    sn: SerialNumber,
    sequence: u8,
    repeats: Option<JoinHandle<()>>,
}

impl SensorRadio {
    fn new(txr: Transceiver, sn: SerialNumber) -> SensorRadio {
        SensorRadio {
            txr: Arc::new(txr),
            sn,
            sequence: 0,
            repeats: None,
        }
    }

    fn send(&mut self, event: SensorEvent) {
        if let Some(pending) = self.repeats.take() {
            if !pending.is_finished() {
                debug!("{}: superseding pending retransmissions", self.sn);
            }
            pending.abort();
        }
        let msg = Message::Sensor(SensorMessage {
            sn: self.sn.clone(),
            sequence: self.sequence,
            event,
        });
        self.sequence = (self.sequence + 1) & 0xF;
        let txr = self.txr.clone();
        self.repeats = Some(tokio::spawn(async move {
            for i in 0..TRANSMISSIONS {
                if i > 0 {
                    sleep(RETRANSMIT_GAP).await;
                }
                if let Err(e) = txr.send(&msg) {
                    error!("sensor transmission failed: {}", e);
                    return;
                }
            }
        }));
    }
}

impl Drop for SensorRadio {
    fn drop(&mut self) {
        if let Some(pending) = self.repeats.take() {
            pending.abort();
        }
    }
}

pub struct KeychainRemote {
    radio: SensorRadio,
}

impl KeychainRemote {
    pub fn new(txr: Transceiver, sn: SerialNumber) -> KeychainRemote {
        KeychainRemote {
            radio: SensorRadio::new(txr, sn),
        }
    }

    pub fn panic(&mut self) {
        self.radio.send(SensorEvent::Keychain(KeychainEvent::Panic));
    }

    pub fn away(&mut self) {
        self.radio.send(SensorEvent::Keychain(KeychainEvent::Away));
    }

    pub fn off(&mut self) {
        self.radio.send(SensorEvent::Keychain(KeychainEvent::Off));
    }
}

pub struct MotionSensor {
    radio: SensorRadio,
}

impl MotionSensor {
    pub fn new(txr: Transceiver, sn: SerialNumber) -> MotionSensor {
        MotionSensor {
            radio: SensorRadio::new(txr, sn),
        }
    }

    pub fn heartbeat(&mut self) {
        self.radio.send(SensorEvent::Motion(MotionEvent::Heartbeat));
    }

    pub fn trip(&mut self) {
        self.radio.send(SensorEvent::Motion(MotionEvent::Motion));
    }
}

pub struct EntrySensor {
    radio: SensorRadio,
}

impl EntrySensor {
    pub fn new(txr: Transceiver, sn: SerialNumber) -> EntrySensor {
        EntrySensor {
            radio: SensorRadio::new(txr, sn),
        }
    }

    pub fn open(&mut self) {
        self.radio.send(SensorEvent::Entry(EntryEvent::Open));
    }

    pub fn close(&mut self) {
        self.radio.send(SensorEvent::Entry(EntryEvent::Closed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::{advance, timeout};

    use crate::radio::medium::{Medium, Radio};
    use crate::radio::{Transceiver, TransceiverConfig};

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn rig() -> (Transceiver, Transceiver) {
        let band = Medium::new();
        let sensor_radio = Radio::new(None, Some(band.clone())).unwrap();
        let sensor_txr = Transceiver::new(
            Arc::new(sensor_radio),
            TransceiverConfig {
                rx_pin: None,
                tx_pin: Some(17),
            },
        )
        .unwrap();
        let listener_radio = Radio::new(Some(band), None).unwrap();
        let listener = Transceiver::new(
            Arc::new(listener_radio),
            TransceiverConfig {
                rx_pin: Some(27),
                tx_pin: None,
            },
        )
        .unwrap();
        (sensor_txr, listener)
    }

    async fn drain(listener: &mut Transceiver) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(Ok(msg)) = timeout(Duration::from_millis(1), listener.recv()).await {
            out.push(msg);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_transmits_three_times() {
        let (txr, mut listener) = rig();
        let mut sensor = MotionSensor::new(txr, SerialNumber::new("1C3J9").unwrap());
        sensor.trip();
        settle().await;

        assert_eq!(drain(&mut listener).await.len(), 1);
        advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(drain(&mut listener).await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_event_supersedes_pending_repeats() {
        let (txr, mut listener) = rig();
        let mut sensor = EntrySensor::new(txr, SerialNumber::new("1R9CL").unwrap());
        sensor.open();
        settle().await;
        advance(Duration::from_secs(1)).await;
        settle().await;
        // One transmission of OPEN so far; CLOSED aborts its repeats.
        sensor.close();
        settle().await;
        advance(Duration::from_secs(10)).await;
        settle().await;

        let events: Vec<SensorEvent> = drain(&mut listener)
            .await
            .into_iter()
            .map(|m| match m {
                Message::Sensor(s) => s.event,
                other => panic!("unexpected frame {}", other),
            })
            .collect();
        assert_eq!(
            events,
            vec![
                SensorEvent::Entry(EntryEvent::Open),
                SensorEvent::Entry(EntryEvent::Closed),
                SensorEvent::Entry(EntryEvent::Closed),
                SensorEvent::Entry(EntryEvent::Closed),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_advances_per_event() {
        let (txr, mut listener) = rig();
        let mut remote = KeychainRemote::new(txr, SerialNumber::new("1A174").unwrap());
        remote.away();
        settle().await;
        advance(Duration::from_secs(5)).await;
        settle().await;
        remote.off();
        settle().await;

        let sequences: Vec<(SensorEvent, u8)> = drain(&mut listener)
            .await
            .into_iter()
            .map(|m| match m {
                Message::Sensor(s) => (s.event, s.sequence),
                other => panic!("unexpected frame {}", other),
            })
            .collect();
        // Three AWAY repeats share one sequence number; OFF takes the next.
        assert_eq!(
            sequences,
            vec![
                (SensorEvent::Keychain(KeychainEvent::Away), 0),
                (SensorEvent::Keychain(KeychainEvent::Away), 0),
                (SensorEvent::Keychain(KeychainEvent::Away), 0),
                (SensorEvent::Keychain(KeychainEvent::Off), 1),
            ]
        );
    }
}
