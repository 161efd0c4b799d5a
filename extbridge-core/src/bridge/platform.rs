//! Platform side effects requested by a context

use tracing::info;

use super::endpoint::ContextId;

/// Fire-and-forget platform commands.
///
/// Invoked on a spawned task; nothing is reported back to the context.
pub trait PlatformHandler: Send + Sync {
    /// Navigate `context`'s view to `url`
    fn navigate_to(&self, context: ContextId, url: &str);

    fn copy_to_clipboard(&self, text: &str);
}

/// Handler that only logs what it was asked to do
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPlatform;

impl PlatformHandler for NoopPlatform {
    fn navigate_to(&self, context: ContextId, url: &str) {
        info!(context = %context, url = %url, "Navigation requested");
    }

    fn copy_to_clipboard(&self, text: &str) {
        info!(len = text.len(), "Clipboard write requested");
    }
}
