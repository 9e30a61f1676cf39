//! Notifications for the rendering layer and other viewers.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! The core never calls into a renderer. It publishes values on a
//! `tokio::sync::broadcast` channel and whoever cares subscribes:
//! - Events are plain `Clone` values, not callbacks
//! - A viewer that falls behind gets `Lagged` instead of blocking the core
//! - Emitting with no subscribers is fine

use tokio::sync::broadcast;

use crate::action::Mode;
use crate::file::FileId;
use crate::window::WindowId;

/// Something observable changed in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    // File events
    FileOpened(FileId),
    FileSaved(FileId),
    FileClosed(FileId),
    /// A file's content changed; every window showing it must re-derive
    /// its view
    FileChanged(FileId),

    // Window events
    WindowOpened(WindowId),
    WindowClosed(WindowId),
    CursorMoved(WindowId),
    SelectionChanged(WindowId),

    // Editor events
    ModeChanged(Mode),
    /// The terminal was resized; re-layout, buffers are untouched
    Resized,
    /// A user-visible warning, e.g. an alias or macro loop was cut off
    Warning(String),
    Quit,
}

/// Event bus for broadcasting editor events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // No receivers is not an error.
        let _ = self.sender.send(event);
    }

    /// Returns a receiver for all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

/// Async helper that skips over lag.
///
/// ```ignore
/// let mut events = EventHandler::new(editor.subscribe());
/// tokio::spawn(async move {
///     while let Some(event) = events.next().await {
///         if let EditorEvent::FileChanged(id) = event {
///             // redraw every window showing `id`
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<EditorEvent>,
}

impl EventHandler {
    pub fn new(receiver: broadcast::Receiver<EditorEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event. `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("event handler lagged, missed {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns every event already queued without waiting.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return events,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(EditorEvent::ModeChanged(Mode::Insert));

        let event = rx.recv().await.unwrap();
        assert_eq!(event, EditorEvent::ModeChanged(Mode::Insert));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(EditorEvent::Resized);

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_handler_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        bus.emit(EditorEvent::Quit);
        drop(bus);

        assert_eq!(handler.next().await, Some(EditorEvent::Quit));
        assert_eq!(handler.next().await, None);
    }

    #[test]
    fn test_drain() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        bus.emit(EditorEvent::Resized);
        bus.emit(EditorEvent::Warning("loop".into()));
        assert_eq!(
            handler.drain(),
            vec![EditorEvent::Resized, EditorEvent::Warning("loop".into())]
        );
        assert!(handler.drain().is_empty());
    }
}
