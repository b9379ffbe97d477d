//! Stage instrumentation.
//!
//! `wrap` decorates a fallible stage with start/done/error log entries. It
//! is a plain higher-order function: the stage itself knows nothing about
//! logging.

use std::time::Instant;

use crate::logger::Logger;
use crate::Result;

/// Wrap `stage` so running it logs `start`, then `done` with the elapsed
/// milliseconds or `error` with the failure.
pub fn wrap<'a, T, F>(logger: &'a dyn Logger, stage: &'a str, f: F) -> impl FnOnce() -> Result<T> + 'a
where
    F: FnOnce() -> Result<T> + 'a,
{
    move || {
        logger.debug(stage, "start");
        let started = Instant::now();
        let outcome = f();
        let elapsed = started.elapsed().as_millis();
        match &outcome {
            Ok(_) => logger.debug(stage, &format!("done in {elapsed}ms")),
            Err(e) => logger.warn(stage, &format!("error after {elapsed}ms: {e}")),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::Error;

    #[test]
    fn test_wrap_logs_success() {
        let logger = MemoryLogger::new();
        let value = wrap(&logger, "selector", || Ok(7))().unwrap();
        assert_eq!(value, 7);

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "start");
        assert!(entries[1].message.starts_with("done in "));
        assert!(entries.iter().all(|e| e.stage == "selector"));
    }

    #[test]
    fn test_wrap_logs_and_returns_error() {
        let logger = MemoryLogger::new();
        let outcome: Result<()> = wrap(&logger, "readability", || Err(Error::NoContent))();
        assert_eq!(outcome, Err(Error::NoContent));
        assert_eq!(logger.entries()[1].level, log::Level::Warn);
        assert!(logger.contains("error after"));
    }
}
