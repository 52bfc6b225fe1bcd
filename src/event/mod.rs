mod bus;
mod events;

pub use bus::{EventBus, NotificationLog};
pub use events::{PadEvent, SurfaceChange};

pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &PadEvent);
}
