use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::trace;

use super::io::{DriverError, Edge, EdgeCallback, Level, Pulse, RawIo};

/// Quiet time appended after a transmission so receivers see the
/// end-of-transmission gap, and the idle gap inserted between
/// transmissions on the shared clock.
const EOT_GAP_US: u32 = 3_000;
const INTER_TX_GAP_US: u32 = 10_000;

static NEXT_RADIO_ID: AtomicUsize = AtomicUsize::new(0);

/// An in-process radio band. Every pulse train emitted into the medium is
/// replayed as edge callbacks on all attached receivers except the emitter,
/// with pulse-accurate timing on a shared wrapping microsecond clock.
///
/// This stands in for a real pair of OOK radio modules in the demo binary
/// and in integration tests; a deployment registers its own `RawIo`
/// implementation instead.
#[derive(Clone, Default)]
pub struct Medium {
    inner: Arc<MediumInner>,
}

#[derive(Default)]
struct MediumInner {
    clock: Mutex<u32>,
    listeners: Mutex<Vec<Listener>>,
}

struct Listener {
    radio: usize,
    cb: EdgeCallback,
}

impl Medium {
    pub fn new() -> Medium {
        Default::default()
    }

    fn attach(&self, radio: usize, cb: EdgeCallback) {
        self.inner.listeners.lock().unwrap().push(Listener { radio, cb });
    }

    fn transmit(&self, from: usize, pulses: &[Pulse]) {
        let edges = {
            let mut clock = self.inner.clock.lock().unwrap();
            let mut edges = Vec::new();
            let mut level = Level::Low;
            let mut tick = *clock;
            for pulse in pulses {
                let next = if pulse.on_mask != 0 { Level::High } else { Level::Low };
                if next != level {
                    edges.push(Edge { level: next, tick });
                    level = next;
                }
                tick = tick.wrapping_add(pulse.micros);
            }
            // The line settles after the last pulse; the resulting edge is
            // what lets receivers time out the frame.
            tick = tick.wrapping_add(EOT_GAP_US);
            let settled = if level == Level::High { Level::Low } else { Level::High };
            edges.push(Edge { level: settled, tick });
            *clock = tick.wrapping_add(INTER_TX_GAP_US);
            edges
        };
        trace!("medium: radio {} emitted {} edges", from, edges.len());

        let mut listeners = self.inner.listeners.lock().unwrap();
        for listener in listeners.iter_mut() {
            if listener.radio == from {
                continue;
            }
            for edge in &edges {
                (listener.cb)(*edge);
            }
        }
    }
}

/// One radio module: a receiver on one band, a transmitter on another, or
/// both. Mirrors the split-frequency layout of the real system, where the
/// base station transmits on a different band than the components do.
pub struct Radio {
    id: usize,
    rx: Option<Medium>,
    tx: Option<Medium>,
}

impl Radio {
    pub fn new(rx: Option<Medium>, tx: Option<Medium>) -> Result<Radio, DriverError> {
        if rx.is_none() && tx.is_none() {
            return Err(DriverError::NotConfigured);
        }
        Ok(Radio {
            id: NEXT_RADIO_ID.fetch_add(1, Ordering::Relaxed),
            rx,
            tx,
        })
    }
}

impl RawIo for Radio {
    fn register_edge_callback(&self, cb: EdgeCallback) -> Result<(), DriverError> {
        let medium = self.rx.as_ref().ok_or(DriverError::NotReceiver)?;
        medium.attach(self.id, cb);
        Ok(())
    }

    fn emit_pulses(&self, pulses: &[Pulse]) -> Result<(), DriverError> {
        let medium = self.tx.as_ref().ok_or(DriverError::NotTransmitter)?;
        medium.transmit(self.id, pulses);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_edges_reach_other_radios_only() {
        let band = Medium::new();
        let a = Radio::new(Some(band.clone()), Some(band.clone())).unwrap();
        let b = Radio::new(Some(band.clone()), None).unwrap();

        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        a.register_edge_callback(Box::new(move |e| tx_a.send(e).unwrap()))
            .unwrap();
        b.register_edge_callback(Box::new(move |e| tx_b.send(e).unwrap()))
            .unwrap();

        a.emit_pulses(&[Pulse::off(4, 1000), Pulse::on(4, 1000)]).unwrap();

        // The line starts low, so the off pulse produces no edge: one rising
        // edge plus the settling edge.
        let edges: Vec<Edge> = rx_b.try_iter().collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].level, Level::High);
        assert_eq!(edges[1].tick.wrapping_sub(edges[0].tick), 1000 + EOT_GAP_US);
        // The emitter does not hear itself.
        assert!(rx_a.try_iter().next().is_none());
    }

    #[test]
    fn test_unconfigured_directions_error() {
        let band = Medium::new();
        let rx_only = Radio::new(Some(band.clone()), None).unwrap();
        assert!(matches!(
            rx_only.emit_pulses(&[Pulse::on(0, 100)]),
            Err(DriverError::NotTransmitter)
        ));
        let tx_only = Radio::new(None, Some(band)).unwrap();
        assert!(matches!(
            tx_only.register_edge_callback(Box::new(|_| {})),
            Err(DriverError::NotReceiver)
        ));
        assert!(matches!(Radio::new(None, None), Err(DriverError::NotConfigured)));
    }
}
