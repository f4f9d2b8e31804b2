//! Status message sink port (driving side)
//!
//! Synchronization reports human-readable status strings such as
//! `'GentleWake On' scheduled for Fri Oct 16 06:50:00 2026` through this
//! sink. A synchronization may emit zero or more messages.

/// Receiver of status messages
///
/// Any `Fn(&str)` closure is a sink.
pub trait IMessageSink: Send + Sync {
    fn on_message(&self, message: &str);
}

impl<F> IMessageSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_message(&self, message: &str) {
        self(message)
    }
}

/// Sink that discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl IMessageSink for NullSink {
    fn on_message(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |msg: &str| seen.lock().unwrap().push(msg.to_string());
        sink.on_message("hello");
        sink.on_message("world");
        assert_eq!(*seen.lock().unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn test_null_sink_accepts_messages() {
        NullSink.on_message("ignored");
    }
}
