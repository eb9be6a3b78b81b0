//! Package handlers plugged into [`PrimaryConsumer`](crate::PrimaryConsumer).

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};
use urprimary_frame::package::{ErrorCodeMessage, KeyMessage};

/// Worker for one package variant.
///
/// Handlers run on the pipeline thread and must not block.
pub trait PackageHandler<T>: Send + Sync {
    fn handle(&self, pkg: &T);
}

/// Caches the most recent package of one variant.
///
/// Every decode replaces the whole snapshot; readers get a shared handle to
/// the value that was current when they asked.
#[derive(Debug)]
pub struct LatestPackage<T> {
    data: RwLock<Option<Arc<T>>>,
}

impl<T> LatestPackage<T> {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(None),
        }
    }

    /// The latest package, or `None` if none has been received yet.
    pub fn get(&self) -> Option<Arc<T>> {
        self.data.read().clone()
    }

    /// Whether a package has been received.
    pub fn is_set(&self) -> bool {
        self.data.read().is_some()
    }

    /// Forget the cached package.
    pub fn clear(&self) {
        *self.data.write() = None;
    }
}

impl<T> Default for LatestPackage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> PackageHandler<T> for LatestPackage<T> {
    fn handle(&self, pkg: &T) {
        let snapshot = Arc::new(pkg.clone());
        *self.data.write() = Some(snapshot);
    }
}

/// Logs key messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyMessageLogger;

impl PackageHandler<KeyMessage> for KeyMessageLogger {
    fn handle(&self, pkg: &KeyMessage) {
        info!(
            code = pkg.message_code,
            argument = pkg.message_argument,
            title = %pkg.title,
            "{}",
            pkg.text
        );
    }
}

/// Logs error code messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorCodeLogger;

impl PackageHandler<ErrorCodeMessage> for ErrorCodeLogger {
    fn handle(&self, pkg: &ErrorCodeMessage) {
        warn!(
            code = pkg.message_code,
            argument = pkg.message_argument,
            level = pkg.report_level,
            "C{}A{}: {}",
            pkg.message_code,
            pkg.message_argument,
            pkg.text
        );
    }
}

#[cfg(test)]
mod tests {
    use urprimary_frame::package::RuntimeExceptionMessage;

    use super::*;

    #[test]
    fn latest_package_is_empty_until_handled() {
        let cache = LatestPackage::<RuntimeExceptionMessage>::new();
        assert!(cache.get().is_none());
        assert!(!cache.is_set());

        cache.handle(&RuntimeExceptionMessage {
            line_number: 1,
            column_number: 2,
            text: "first".into(),
        });
        let first = cache.get().unwrap();

        cache.handle(&RuntimeExceptionMessage {
            line_number: 3,
            column_number: 4,
            text: "second".into(),
        });

        // A reader's snapshot is not mutated by later packages.
        assert_eq!(first.text, "first");
        assert_eq!(cache.get().unwrap().text, "second");

        cache.clear();
        assert!(cache.get().is_none());
    }

    #[test]
    fn cache_is_shared_across_threads() {
        let cache = Arc::new(LatestPackage::<KeyMessage>::new());
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100 {
                    cache.handle(&KeyMessage {
                        message_code: i,
                        message_argument: 0,
                        title: String::new(),
                        text: String::new(),
                    });
                }
            })
        };
        writer.join().unwrap();
        assert_eq!(cache.get().unwrap().message_code, 99);
    }

    #[test]
    fn loggers_accept_packages() {
        KeyMessageLogger.handle(&KeyMessage {
            message_code: 0,
            message_argument: 0,
            title: "PROGRAM_XXX_STARTED".into(),
            text: "prog".into(),
        });
        ErrorCodeLogger.handle(&ErrorCodeMessage {
            message_code: 210,
            message_argument: 0,
            report_level: 1,
            data_type: 0,
            data: 0,
            text: "read-only".into(),
        });
    }
}
