//! The logger role.
//!
//! The store and dispatcher log through a small `Logger` trait so callers
//! can inject their own sink. The default forwards to the `tracing` macros;
//! a plain console logger is available for environments without a tracing
//! subscriber.

/// Leveled message sink used by the store and the dispatcher.
pub trait Logger: Send + Sync {
    /// Routine operational message.
    fn info(&self, message: &str);
    /// Detail useful when tracing store internals.
    fn debug(&self, message: &str);
    /// Something recoverable went wrong.
    fn warn(&self, message: &str);
    /// Something went wrong and was not recovered locally.
    fn error(&self, message: &str);
}

/// Default logger forwarding to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Logger printing directly to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn info(&self, message: &str) {
        eprintln!("[info] {message}");
    }

    fn debug(&self, message: &str) {
        eprintln!("[debug] {message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("[warn] {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("[error] {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loggers_are_object_safe() {
        let loggers: Vec<Box<dyn Logger>> = vec![Box::new(TracingLogger), Box::new(ConsoleLogger)];
        for logger in &loggers {
            logger.debug("probe");
        }
    }
}
