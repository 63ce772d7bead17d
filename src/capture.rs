mod capture_outcome;
mod captured_report;
mod probe_policy;
mod report_capture;

pub use self::{
    capture_outcome::CaptureOutcome, captured_report::CapturedReport, probe_policy::ProbePolicy,
    report_capture::ReportCapture,
};
