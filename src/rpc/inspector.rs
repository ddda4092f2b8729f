//! Message inspectors: hooks around one dispatched call.
//!
//! Unlike the HTTP audit layer there is nothing to buffer here. The request
//! and the reply are complete [`Message`] values by the time a hook sees
//! them, so logging one is just rendering it.

use std::any::Any;
use std::fmt;

use tracing::info;
use uuid::Uuid;

use super::message::Message;

/// Opaque state handed from [`after_receive_request`] to
/// [`before_send_reply`] of the same inspector.
///
/// [`after_receive_request`]: MessageInspector::after_receive_request
/// [`before_send_reply`]: MessageInspector::before_send_reply
pub struct Correlation(Box<dyn Any + Send + Sync>);

impl Correlation {
    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self(Box::new(state))
    }

    /// A token carrying nothing, for inspectors that need no correlation.
    pub fn none() -> Self {
        Self::new(())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correlation").finish_non_exhaustive()
    }
}

/// Hooks the [`Dispatcher`](super::Dispatcher) runs around every call.
pub trait MessageInspector: Send + Sync + 'static {
    /// Sees the inbound message before the operation runs.
    fn after_receive_request(&self, request: &Message) -> Correlation;

    /// Sees the outbound reply (or fault) before it is sent.
    fn before_send_reply(&self, reply: &Message, correlation: Correlation);
}

/// Logs the text of every request and reply at INFO.
///
/// Both events carry the same `correlation_id`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMessageInspector;

impl MessageInspector for LogMessageInspector {
    fn after_receive_request(&self, request: &Message) -> Correlation {
        let correlation_id = Uuid::new_v4();
        info!(%correlation_id, MessageRequest = %request, "received request");
        Correlation::new(correlation_id)
    }

    fn before_send_reply(&self, reply: &Message, correlation: Correlation) {
        match correlation.downcast_ref::<Uuid>() {
            Some(correlation_id) => info!(%correlation_id, MessageResponse = %reply, "responded"),
            None => info!(MessageResponse = %reply, "responded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_round_trips_state() {
        let token = Correlation::new(7u32);
        assert_eq!(token.downcast_ref::<u32>(), Some(&7));
        assert_eq!(token.downcast_ref::<String>(), None);
        assert!(Correlation::none().downcast_ref::<()>().is_some());
    }

    #[test]
    fn log_inspector_hands_out_a_uuid() {
        let token = LogMessageInspector.after_receive_request(&Message::new("<Echo/>"));
        assert!(token.downcast_ref::<Uuid>().is_some());
        LogMessageInspector.before_send_reply(&Message::new("<Ack/>"), token);
    }
}
