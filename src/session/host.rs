//! The host's sequential event loop.

use tokio::sync::mpsc::UnboundedReceiver;

use super::controller::{CaptureSessionController, SessionState};
use super::events::HostEvent;

/// Drive a controller until the host finishes.
///
/// Initializes the controller, then applies events one at a time in arrival
/// order. Returns the state the controller reached before shutdown, once the
/// controller asks the host to finish or every event sender is gone.
pub async fn run_host(
    mut controller: CaptureSessionController,
    mut events: UnboundedReceiver<HostEvent>,
) -> SessionState {
    controller.initialize();

    let mut last_state = controller.state();
    while !controller.is_finished() {
        let Some(event) = events.recv().await else {
            log::debug!("Event channel closed");
            break;
        };
        log::trace!("Host event: {:?}", event);
        let closing = matches!(event, HostEvent::Close);
        controller.handle_event(event);
        if !closing {
            last_state = controller.state();
        }
    }

    controller.shutdown();
    last_state
}
