mod raw_violation_report;
mod violation_report;

pub use self::violation_report::ViolationReport;
