mod report_log_context;

pub use self::report_log_context::ReportLogContext;
