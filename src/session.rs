//! Presentation session
//!
//! This module defines the trait for tunneling messages from the overlay
//! core to the rendering layer. The core never draws anything: it pushes
//! updates through a tunnel, and the rendering layer turns them into markup
//! however it likes.

use super::{UpdateMessage, sequencer::SyncMessage};

/// Trait for sending messages to the rendering layer
///
/// Implementations might forward messages to a DOM binding, a web worker
/// port, or simply record them.
pub trait Tunnel {
    /// Sends an incremental update
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a full snapshot of the observable state
    ///
    /// Snapshots let a freshly attached rendering layer catch up without
    /// replaying every update.
    ///
    /// # Arguments
    ///
    /// * `state` - The snapshot to send
    fn send_state(&self, state: &SyncMessage);
}

impl<T: Tunnel + ?Sized> Tunnel for &T {
    fn send_message(&self, message: &UpdateMessage) {
        (**self).send_message(message);
    }

    fn send_state(&self, state: &SyncMessage) {
        (**self).send_state(state);
    }
}
