use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::StreamError;
use crate::subscribers::Subscriber;
use crate::subscription::Subscription;

/// Base subscriber that logs every callback to stdout.
///
/// Drains with unbounded demand. Useful for demos and debugging.
pub struct LogWriter;

#[async_trait]
impl<T: Debug + Send + 'static> Subscriber<T> for LogWriter {
    async fn on_subscribe(&self, subscription: &Subscription) {
        println!("[subscribed]");
        subscription.request_unbounded();
    }

    async fn on_next(&self, value: T) {
        println!("[next] value={value:?}");
    }

    async fn on_complete(&self) {
        println!("[complete]");
    }

    async fn on_error(&self, error: StreamError) {
        println!("[error] kind={} err={error}", error.as_label());
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
