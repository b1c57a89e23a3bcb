//! Receiver, transmitter and device logic for the SimpliSafe (v1/v2 era)
//! wireless protocol.
//!
//! The crate is layered leaf-first: [`radio`] turns GPIO edge timestamps
//! into frames and frames into pulse trains, [`protocol`] gives those
//! frames a typed message model with checksums and exhaustive
//! discriminator dispatch, and [`devices`] implements the base-station and
//! keypad state machines on top. Hosts plug in a GPIO driver through
//! [`radio::RawIo`] and receive lifecycle callbacks through the hook
//! traits in [`devices`].
pub mod devices;
pub mod protocol;
pub mod radio;
