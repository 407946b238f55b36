/// Layout queries and change notifications for the floating preview
///
/// The preview sits on top of one thumbnail (its anchor). Whenever the grid
/// moves (a thumbnail is appended, the window is resized, the grid scrolls)
/// a `LayoutChange` is broadcast; the preview re-queries the anchor rectangle
/// through a `LayoutSource`.
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Pending notifications per subscriber before older ones are dropped
const CHANNEL_CAPACITY: usize = 64;

/// Identifies the thumbnail a preview is positioned over
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnchorId(pub String);

impl From<&str> for AnchorId {
    fn from(id: &str) -> Self {
        AnchorId(id.to_string())
    }
}

/// Axis-aligned rectangle in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Anything that can tell where an anchor currently is on screen
pub trait LayoutSource {
    /// `None` when the anchor is not laid out (filtered away, not rendered yet)
    fn anchor_rect(&self, anchor: &AnchorId) -> Option<Rect>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutChange {
    EntryAdded,
    Resized,
    Scrolled,
}

/// Broadcasts layout changes to every live subscription
#[derive(Debug, Clone)]
pub struct LayoutNotifier {
    sender: broadcast::Sender<LayoutChange>,
}

impl Default for LayoutNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a change; a no-op when nobody is subscribed
    pub fn notify(&self, change: LayoutChange) {
        let _ = self.sender.send(change);
    }

    /// Start receiving changes; dropping the subscription unsubscribes
    pub fn subscribe(&self) -> LayoutSubscription {
        LayoutSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Debug)]
pub struct LayoutSubscription {
    receiver: broadcast::Receiver<LayoutChange>,
}

impl LayoutSubscription {
    /// Consume every pending notification; true if there was at least one
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed,
            }
        }
    }
}
