use csp_collector::{
    capture::{CaptureOutcome, CapturedReport, ProbePolicy, ReportCapture},
    collector::RuleCollector,
    config::{Config, RawConfig},
    reports::ViolationReport,
    sources::InterpretBlank,
};
use serde_json::Value;
use std::sync::Arc;

const DOCUMENT_URI: &str = "https://status.modern.ie/";

const FIREFOX_UNSAFE_INLINE: &str = include_str!("fixtures/firefox_35_0_1_unsafe_inline.jsonl");
const FIREFOX_UNSAFE_EVAL: &str = include_str!("fixtures/firefox_35_0_1_unsafe_eval.jsonl");
const CHROME_UNSAFE_INLINE: &str = include_str!("fixtures/chrome_40_0_2214_93_unsafe_inline.jsonl");
const CHROME_UNSAFE_EVAL: &str = include_str!("fixtures/chrome_40_0_2214_93_unsafe_eval.jsonl");

const FIREFOX_POLICY: &str = "Content-Security-Policy: default-src 'none'; connect-src dc.services.visualstudio.com 'self' www.chromestatus.com; img-src 'self' ssl.google-analytics.com; script-src az416426.vo.msecnd.net 'self' www.google-analytics.com; style-src 'self'";
const CHROME_POLICY: &str = "Content-Security-Policy: default-src 'none'; connect-src dc.services.visualstudio.com 'self' www.chromestatus.com; font-src www.modern.ie; img-src 'self' ssl.google-analytics.com; script-src az416426.vo.msecnd.net 'self' 'unsafe-eval' 'unsafe-inline' www.google-analytics.com; style-src 'self' 'unsafe-inline'";

fn fixture_reports(
    fixture: &'static str,
    blank: InterpretBlank,
) -> anyhow::Result<Vec<(ViolationReport, InterpretBlank)>> {
    fixture
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok((ViolationReport::parse(line)?, blank)))
        .collect()
}

fn browser_reports(
    unsafe_inline: &'static str,
    unsafe_eval: &'static str,
) -> anyhow::Result<Vec<(ViolationReport, InterpretBlank)>> {
    let mut reports = fixture_reports(unsafe_inline, InterpretBlank::UnsafeInline)?;
    reports.extend(fixture_reports(unsafe_eval, InterpretBlank::UnsafeEval)?);
    Ok(reports)
}

fn collect<'a>(
    reports: impl IntoIterator<Item = &'a (ViolationReport, InterpretBlank)>,
) -> anyhow::Result<RuleCollector> {
    let collector = RuleCollector::new();
    for (report, blank) in reports {
        collector.add(report, *blank)?;
    }
    Ok(collector)
}

#[test]
fn collects_firefox_policy() -> anyhow::Result<()> {
    let reports = browser_reports(FIREFOX_UNSAFE_INLINE, FIREFOX_UNSAFE_EVAL)?;
    assert_eq!(reports.len(), 24);

    let collector = collect(&reports)?;
    assert_eq!(collector.documents(), vec![DOCUMENT_URI]);
    assert_eq!(collector.get(DOCUMENT_URI)?.as_deref(), Some(FIREFOX_POLICY));

    Ok(())
}

#[test]
fn collects_chrome_policy() -> anyhow::Result<()> {
    let reports = browser_reports(CHROME_UNSAFE_INLINE, CHROME_UNSAFE_EVAL)?;
    assert_eq!(reports.len(), 24);

    let collector = collect(&reports)?;
    assert_eq!(collector.documents(), vec![DOCUMENT_URI]);
    assert_eq!(collector.get(DOCUMENT_URI)?.as_deref(), Some(CHROME_POLICY));

    Ok(())
}

#[test]
fn collects_same_policy_regardless_of_order() -> anyhow::Result<()> {
    for (reports, expected_policy) in [
        (
            browser_reports(FIREFOX_UNSAFE_INLINE, FIREFOX_UNSAFE_EVAL)?,
            FIREFOX_POLICY,
        ),
        (
            browser_reports(CHROME_UNSAFE_INLINE, CHROME_UNSAFE_EVAL)?,
            CHROME_POLICY,
        ),
    ] {
        let reversed = collect(reports.iter().rev())?;
        assert_eq!(reversed.get(DOCUMENT_URI)?.as_deref(), Some(expected_policy));

        // Interleave reports from the two probes.
        let (even, odd): (Vec<_>, Vec<_>) = reports
            .iter()
            .enumerate()
            .partition(|(index, _)| index % 2 == 0);
        let interleaved = collect(odd.into_iter().chain(even).map(|(_, report)| report))?;
        assert_eq!(
            interleaved.get(DOCUMENT_URI)?.as_deref(),
            Some(expected_policy)
        );
    }

    Ok(())
}

#[test]
fn replaying_reports_changes_nothing() -> anyhow::Result<()> {
    let reports = browser_reports(CHROME_UNSAFE_INLINE, CHROME_UNSAFE_EVAL)?;
    let collector = collect(&reports)?;

    let mut subscription = collector.subscribe();
    for (report, blank) in &reports {
        assert!(!collector.add(report, *blank)?);
    }
    assert_eq!(subscription.try_recv(), None);
    assert_eq!(collector.get(DOCUMENT_URI)?.as_deref(), Some(CHROME_POLICY));

    Ok(())
}

#[test]
fn collects_captured_reports() -> anyhow::Result<()> {
    let config = Config::from(RawConfig::default());
    let collector = Arc::new(RuleCollector::new());
    let capture = ReportCapture::new(collector.clone(), &config);

    let mut added = 0;
    for (fixture, blank) in [
        (CHROME_UNSAFE_INLINE, InterpretBlank::UnsafeInline),
        (CHROME_UNSAFE_EVAL, InterpretBlank::UnsafeEval),
    ] {
        let endpoint = ProbePolicy::report_uri(&config.report_endpoint, blank)?;
        for line in fixture.lines().filter(|line| !line.trim().is_empty()) {
            let outcome = capture.process(&CapturedReport {
                endpoint: endpoint.clone(),
                body: Value::String(line.to_string()),
            });
            assert!(
                matches!(outcome, CaptureOutcome::Added | CaptureOutcome::Duplicate),
                "{outcome:?}"
            );
            if outcome == CaptureOutcome::Added {
                added += 1;
            }
        }
    }

    // Every rule except `default-src 'none'` is added by exactly one report.
    assert_eq!(added, 13);
    assert_eq!(collector.get(DOCUMENT_URI)?.as_deref(), Some(CHROME_POLICY));

    Ok(())
}
