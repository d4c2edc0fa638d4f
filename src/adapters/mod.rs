//! Adapters: cheap views over a shared [`NamedLogger`]
//!
//! Both adapters implement [`LoggerAdapter`], which owns the extra-merge rule
//! and the level wrappers. They differ only in how a built record is
//! dispatched and what a call returns.

pub mod async_adapter;
pub mod sync_adapter;

pub use async_adapter::AsyncAdapter;
pub use sync_adapter::SyncAdapter;

use crate::core::{
    CallSite, ErrorPayload, Extra, FieldValue, LogLevel, LogRecord, NamedLogger, Result,
};
use std::sync::Arc;

/// Shared capability of [`SyncAdapter`] and [`AsyncAdapter`]
///
/// Implementors provide the bound logger, their default extra and the two
/// dispatch hooks; everything else has a default implementation.
pub trait LoggerAdapter {
    /// What a log call returns: `Result<()>` or a [`LogHandle`](crate::LogHandle)
    type Output;

    fn logger(&self) -> &Arc<NamedLogger>;

    /// Fields captured when the adapter was built
    fn extra(&self) -> &Extra;

    /// Hand a fully built record to the logger
    fn dispatch(&self, record: LogRecord) -> Self::Output;

    /// Output for a call that did no work
    fn resolved(&self, result: Result<()>) -> Self::Output;

    /// Merge per-call fields over the adapter defaults; per-call keys win
    fn process(&self, extra: Option<&Extra>) -> Extra {
        match extra {
            Some(overrides) => self.extra().merged_with(overrides),
            None => self.extra().clone(),
        }
    }

    fn name(&self) -> &str {
        self.logger().name()
    }

    fn level(&self) -> LogLevel {
        self.logger().level()
    }

    /// Same as [`level`](Self::level); there is no level inheritance
    fn effective_level(&self) -> LogLevel {
        self.level()
    }

    fn set_level(&self, level: LogLevel) {
        self.logger().set_level(level);
    }

    fn has_handlers(&self) -> bool {
        self.logger().has_handlers()
    }

    fn is_enabled_for(&self, level: LogLevel) -> bool {
        self.logger().is_enabled_for(level)
    }

    /// Build a record and dispatch it
    ///
    /// A disabled level returns before any record is built.
    fn log_at(
        &self,
        level: LogLevel,
        template: &str,
        args: &[FieldValue],
        extra: Option<&Extra>,
        call_site: CallSite,
        error: Option<ErrorPayload>,
    ) -> Self::Output {
        let logger = self.logger();
        if let Err(e) = logger.ensure_open() {
            return self.resolved(Err(e));
        }
        if !logger.is_enabled_for(level) {
            logger.record_suppressed();
            return self.resolved(Ok(()));
        }
        if let Err(e) = logger.admit() {
            return self.resolved(Err(e));
        }

        let mut record = LogRecord::new(logger.name(), level, template)
            .with_args(args.to_vec())
            .with_extra(self.process(extra))
            .with_call_site(call_site);
        if let Some(error) = error {
            record = record.with_error(error);
        }
        self.dispatch(record)
    }

    #[track_caller]
    fn log(&self, level: LogLevel, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(level, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn log_with_extra(
        &self,
        level: LogLevel,
        template: &str,
        args: &[FieldValue],
        extra: &Extra,
    ) -> Self::Output {
        self.log_at(level, template, args, Some(extra), CallSite::caller(), None)
    }

    #[track_caller]
    fn trace(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Trace, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn debug(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Debug, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn info(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Info, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn warning(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Warning, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn warn(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Warning, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn error(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Error, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn critical(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Critical, template, args, None, CallSite::caller(), None)
    }

    #[track_caller]
    fn fatal(&self, template: &str, args: &[FieldValue]) -> Self::Output {
        self.log_at(LogLevel::Critical, template, args, None, CallSite::caller(), None)
    }

    /// Log at `Error` with `err` attached as `exc_info`
    #[track_caller]
    fn exception(
        &self,
        template: &str,
        args: &[FieldValue],
        err: &(dyn std::error::Error + 'static),
    ) -> Self::Output {
        self.log_at(
            LogLevel::Error,
            template,
            args,
            None,
            CallSite::caller(),
            Some(ErrorPayload::from_error(err)),
        )
    }
}

pub(crate) fn describe(kind: &str, logger: &NamedLogger) -> String {
    format!("<{} {} ({})>", kind, logger.name(), logger.level())
}
