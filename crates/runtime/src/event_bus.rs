use crate::frame::Frame;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Warn,
    Error,
}

/// A frame-stamped engine event.
///
/// The engine never raises to the host; failures it absorbs (GPU errors,
/// fetch failures) show up here instead, and the host drains them at its
/// own pace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub severity: Severity,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn trace(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) {
        self.emit(frame, Severity::Trace, kind, message);
    }

    pub fn warn(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) {
        self.emit(frame, Severity::Warn, kind, message);
    }

    pub fn error(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) {
        self.emit(frame, Severity::Error, kind, message);
    }

    pub fn emit(
        &mut self,
        frame: Frame,
        severity: Severity,
        kind: &'static str,
        message: impl Into<String>,
    ) {
        self.events.push(Event {
            frame_index: frame.index,
            severity,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, Severity};
    use crate::frame::Frame;

    #[test]
    fn records_severity_and_frame_index() {
        let mut bus = EventBus::new();
        let f = Frame::start().advanced(0.1).advanced(0.1);
        bus.error(f, "gpu", "invalid operation");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].frame_index, 2);
        assert_eq!(bus.events()[0].severity, Severity::Error);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.trace(Frame::start(), "tiles", "fetch issued");
        assert_eq!(bus.drain().len(), 1);
        assert!(bus.events().is_empty());
    }
}
