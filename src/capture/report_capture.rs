use crate::{
    capture::{CaptureOutcome, CapturedReport, ProbePolicy},
    collector::RuleCollector,
    config::Config,
    sources::InterpretBlank,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Feeds violation reports captured on their way to the probe endpoints into the collector.
pub struct ReportCapture {
    collector: Arc<RuleCollector>,
    report_endpoint: Url,
    enabled: bool,
    verbose: bool,
}

impl ReportCapture {
    /// Creates capture that feeds the `collector` according to the `config`.
    pub fn new(collector: Arc<RuleCollector>, config: &Config) -> Self {
        Self {
            collector,
            report_endpoint: config.report_endpoint.clone(),
            enabled: config.enabled,
            verbose: config.verbose,
        }
    }

    /// Processes captured report. Reports that cannot be collected are logged and reported as
    /// `Rejected`; they never interrupt the capture.
    pub fn process(&self, captured: &CapturedReport) -> CaptureOutcome {
        if !self.enabled {
            debug!(endpoint = %captured.endpoint, "Collection is disabled, ignoring report.");
            return CaptureOutcome::Disabled;
        }

        let Some(blank) = self.probe_endpoint_blank(&captured.endpoint) else {
            debug!(endpoint = %captured.endpoint, "Request isn't sent to a probe endpoint, ignoring.");
            return CaptureOutcome::NotAReport;
        };

        let report = match captured.violation_report() {
            Ok(report) => report,
            Err(err) => {
                warn!(endpoint = %captured.endpoint, "Ignored malformed violation report: {err}");
                return CaptureOutcome::Rejected(err.kind());
            }
        };

        if self.verbose {
            info!(
                endpoint = %captured.endpoint,
                report = %report.log_context(),
                "Captured violation report."
            );
        }

        match self.collector.add(&report, blank) {
            Ok(true) => CaptureOutcome::Added,
            Ok(false) => CaptureOutcome::Duplicate,
            Err(err) => CaptureOutcome::Rejected(err.kind()),
        }
    }

    /// Returns interpretation of the probe whose report endpoint (query and fragment aside) the
    /// request was sent to, if any.
    fn probe_endpoint_blank(&self, endpoint: &Url) -> Option<InterpretBlank> {
        let blank = InterpretBlank::from_report_endpoint(endpoint)?;

        let mut endpoint = endpoint.clone();
        endpoint.set_query(None);
        endpoint.set_fragment(None);

        let report_uri = ProbePolicy::report_uri(&self.report_endpoint, blank).ok()?;
        (endpoint == report_uri).then_some(blank)
    }
}

#[cfg(test)]
mod tests {
    use super::ReportCapture;
    use crate::{
        capture::{CaptureOutcome, CapturedReport},
        collector::RuleCollector,
        config::{Config, RawConfig},
        error::ErrorKind,
    };
    use serde_json::json;
    use std::sync::Arc;
    use url::Url;

    fn mock_config() -> Config {
        Config::from(RawConfig::default())
    }

    fn mock_captured(endpoint: &str, blocked_uri: &str) -> anyhow::Result<CapturedReport> {
        Ok(CapturedReport {
            endpoint: endpoint.parse()?,
            body: json!({
                "csp-report": {
                    "document-uri": "https://status.modern.ie/",
                    "blocked-uri": blocked_uri,
                    "violated-directive": "script-src 'unsafe-eval'"
                }
            }),
        })
    }

    #[test]
    fn collects_reports_sent_to_probe_endpoints() -> anyhow::Result<()> {
        let collector = Arc::new(RuleCollector::new());
        let capture = ReportCapture::new(collector.clone(), &mock_config());

        assert_eq!(
            capture.process(&mock_captured("https://csp-collector.localhost/unsafe-inline", "")?),
            CaptureOutcome::Added
        );
        assert_eq!(
            capture.process(&mock_captured("https://csp-collector.localhost/unsafe-inline", "")?),
            CaptureOutcome::Duplicate
        );
        assert_eq!(
            capture.process(&mock_captured(
                "https://csp-collector.localhost/unsafe-eval?id=1",
                "https://www.modern.ie"
            )?),
            CaptureOutcome::Added
        );
        assert_eq!(
            capture.process(&mock_captured("https://csp-collector.localhost/unsafe-eval", "")?),
            CaptureOutcome::Added
        );

        assert_eq!(
            collector.get("https://status.modern.ie/")?.as_deref(),
            Some("Content-Security-Policy: default-src 'none'; script-src 'unsafe-eval' 'unsafe-inline' www.modern.ie")
        );

        Ok(())
    }

    #[test]
    fn ignores_other_requests() -> anyhow::Result<()> {
        let collector = Arc::new(RuleCollector::new());
        let capture = ReportCapture::new(collector.clone(), &mock_config());

        for endpoint in [
            "https://status.modern.ie/",
            "https://status.modern.ie/scripts/044a95db.vendor.js",
            "https://status.modern.ie/api/unsafe-eval",
            "http://csp-collector.localhost/unsafe-eval",
            "https://csp-collector.localhost:8443/unsafe-inline",
            "https://csp-collector.localhost/reports/unsafe-inline",
            "https://csp-collector.localhost/unsafe-inline/other",
        ] {
            assert_eq!(
                capture.process(&mock_captured(endpoint, "self")?),
                CaptureOutcome::NotAReport,
                "{endpoint}"
            );
        }
        assert!(collector.documents().is_empty());

        Ok(())
    }

    #[test]
    fn matches_endpoints_under_configured_base_path() -> anyhow::Result<()> {
        let collector = Arc::new(RuleCollector::new());
        let capture = ReportCapture::new(
            collector.clone(),
            &Config {
                report_endpoint: Url::parse("https://fiddlercsp.deletethis.net/reports/")?,
                ..mock_config()
            },
        );

        assert_eq!(
            capture.process(&mock_captured(
                "https://fiddlercsp.deletethis.net/reports/unsafe-eval",
                "self"
            )?),
            CaptureOutcome::Added
        );
        for endpoint in [
            "https://fiddlercsp.deletethis.net/unsafe-eval",
            "https://csp-collector.localhost/unsafe-eval",
        ] {
            assert_eq!(
                capture.process(&mock_captured(endpoint, "https://www.modern.ie")?),
                CaptureOutcome::NotAReport,
                "{endpoint}"
            );
        }

        assert_eq!(
            collector.get("https://status.modern.ie/")?.as_deref(),
            Some("Content-Security-Policy: default-src 'none'; script-src 'self'")
        );

        Ok(())
    }

    #[test]
    fn rejects_malformed_reports() -> anyhow::Result<()> {
        let collector = Arc::new(RuleCollector::new());
        let capture = ReportCapture::new(collector.clone(), &mock_config());

        let not_json = CapturedReport {
            endpoint: "https://csp-collector.localhost/unsafe-eval".parse()?,
            body: json!("<html></html>"),
        };
        assert_eq!(
            capture.process(&not_json),
            CaptureOutcome::Rejected(ErrorKind::MalformedReport)
        );

        let no_directive = CapturedReport {
            body: json!({ "csp-report": { "document-uri": "https://status.modern.ie/" } }),
            ..not_json
        };
        assert_eq!(
            capture.process(&no_directive),
            CaptureOutcome::Rejected(ErrorKind::MalformedReport)
        );
        assert!(collector.documents().is_empty());

        Ok(())
    }

    #[test]
    fn does_nothing_when_disabled() -> anyhow::Result<()> {
        let collector = Arc::new(RuleCollector::new());
        let capture = ReportCapture::new(
            collector.clone(),
            &Config {
                enabled: false,
                ..mock_config()
            },
        );

        assert_eq!(
            capture.process(&mock_captured("https://csp-collector.localhost/unsafe-inline", "")?),
            CaptureOutcome::Disabled
        );
        assert!(collector.documents().is_empty());

        Ok(())
    }

    #[test]
    fn verbose_mode_does_not_change_outcomes() -> anyhow::Result<()> {
        let captured_reports = [
            mock_captured("https://csp-collector.localhost/unsafe-eval", "")?,
            mock_captured("https://csp-collector.localhost/unsafe-eval", "")?,
            mock_captured("https://csp-collector.localhost/unsafe-eval", "not a url")?,
            mock_captured("https://status.modern.ie/unsafe-eval", "self")?,
            mock_captured(
                "https://csp-collector.localhost/unsafe-inline",
                "https://www.google-analytics.com/ga.js",
            )?,
        ];

        let quiet_collector = Arc::new(RuleCollector::new());
        let quiet_capture = ReportCapture::new(quiet_collector.clone(), &mock_config());
        let verbose_collector = Arc::new(RuleCollector::new());
        let verbose_capture = ReportCapture::new(
            verbose_collector.clone(),
            &Config {
                verbose: true,
                ..mock_config()
            },
        );

        let quiet_outcomes = captured_reports
            .iter()
            .map(|captured| quiet_capture.process(captured))
            .collect::<Vec<_>>();
        let verbose_outcomes = captured_reports
            .iter()
            .map(|captured| verbose_capture.process(captured))
            .collect::<Vec<_>>();

        assert_eq!(
            verbose_outcomes,
            vec![
                CaptureOutcome::Added,
                CaptureOutcome::Duplicate,
                CaptureOutcome::Added,
                CaptureOutcome::NotAReport,
                CaptureOutcome::Added,
            ]
        );
        assert_eq!(verbose_outcomes, quiet_outcomes);
        assert_eq!(verbose_collector.snapshot(), quiet_collector.snapshot());

        Ok(())
    }
}
