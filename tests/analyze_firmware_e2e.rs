//! End-to-end pipeline tests against stubbed infrastructure.
//!
//! Each test drives the full use case (ingress validation, extraction,
//! inventory, correlation, persistence) with a scripted advisory source,
//! never the real network.

use async_trait::async_trait;
use firmlens::analysis::domain::{ComponentKind, Confidence, Severity, UnresolvedReason};
use firmlens::application::dto::AnalysisRequest;
use firmlens::application::use_cases::{
    AnalyzeFirmwareUseCase, CorrelateVulnerabilitiesUseCase, CorrelationSettings, IngressLimits,
    PipelineSettings,
};
use firmlens::application::CorrelationCache;
use firmlens::ports::outbound::{Advisory, AdvisorySource, LookupError, ReportStore};
use firmlens::prelude::InMemoryReportStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-keyword scripted behavior.
#[derive(Clone)]
enum Script {
    Advisories(Vec<Advisory>),
    Hang,
}

struct ScriptedSource {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(scripts: Vec<(&str, Script)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl AdvisorySource for ScriptedSource {
    async fn search(
        &self,
        keyword: &str,
        _version: Option<&str>,
    ) -> Result<Vec<Advisory>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(keyword) {
            Some(Script::Advisories(advisories)) => Ok(advisories.clone()),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}

fn pipeline(
    source: Arc<ScriptedSource>,
) -> (
    AnalyzeFirmwareUseCase<ScriptedSource, InMemoryReportStore>,
    Arc<InMemoryReportStore>,
) {
    let cache = Arc::new(CorrelationCache::new(
        Duration::from_secs(60),
        Duration::from_secs(60),
    ));
    let correlator = CorrelateVulnerabilitiesUseCase::new(
        source,
        cache,
        CorrelationSettings {
            lookup_timeout: Duration::from_millis(300),
            retry_base_delay: Duration::from_millis(1),
            ..CorrelationSettings::default()
        },
    );
    let store = Arc::new(InMemoryReportStore::new());
    let use_case = AnalyzeFirmwareUseCase::new(
        correlator,
        Arc::clone(&store),
        PipelineSettings {
            limits: IngressLimits::default(),
            extraction_timeout: Duration::from_secs(10),
        },
    );
    (use_case, store)
}

fn write_at(image: &mut [u8], offset: usize, bytes: &[u8]) {
    image[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// A kernel at 0x0 followed by a SquashFS filesystem at 0x40000.
///
/// The zImage magic sits at interior offset 36, so the kernel component
/// starts at 0 and runs until the filesystem signature. The SquashFS
/// superblock declares 0x1000 used bytes.
fn kernel_plus_squashfs() -> Vec<u8> {
    let mut image = vec![0u8; 0x42000];
    write_at(&mut image, 36, b"\x18\x28\x6f\x01");
    write_at(&mut image, 0x1000, b"Linux version 4.14.2 (build)");

    write_at(&mut image, 0x40000, b"hsqs");
    write_at(&mut image, 0x40000 + 40, &0x1000u64.to_le_bytes());
    write_at(&mut image, 0x40200, b"BusyBox v1.30.1 multi-call binary");
    write_at(&mut image, 0x40300, b"OpenSSL 1.1.1k  25 Mar 2021");
    write_at(&mut image, 0x40400, b"Dnsmasq-2.80 dns proxy");
    image
}

fn advisory(id: &str, score: f32) -> Advisory {
    Advisory {
        id: id.to_string(),
        description: Some(format!("advisory {}", id)),
        score,
        published: Some("2021-08-24T15:15:09.800".to_string()),
        last_modified: None,
    }
}

#[tokio::test]
async fn test_kernel_and_filesystem_layout() {
    let (use_case, store) = pipeline(ScriptedSource::empty());

    let request = AnalysisRequest::new("router.bin", kernel_plus_squashfs()).offline();
    let report = use_case
        .execute(request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.components.len(), 2);

    let kernel = &report.components[0];
    assert_eq!(kernel.kind, ComponentKind::Kernel);
    assert_eq!(kernel.offset, 0);
    assert_eq!(kernel.length, 0x40000);
    assert_eq!(kernel.confidence, Confidence::Low);

    let filesystem = &report.components[1];
    assert_eq!(filesystem.kind, ComponentKind::Filesystem);
    assert_eq!(filesystem.offset, 0x40000);
    assert_eq!(filesystem.length, 0x1000);
    assert_eq!(filesystem.confidence, Confidence::High);

    let names: Vec<&str> = report.bom.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"linux-kernel"));
    assert!(names.contains(&"busybox"));
    assert!(names.contains(&"openssl"));

    let openssl = report.bom.iter().find(|e| e.name == "openssl").unwrap();
    assert_eq!(openssl.version.as_deref(), Some("1.1.1k"));

    assert!(store.latest_for_image(&report.image.content_hash).await.unwrap().is_some());
}

#[tokio::test]
async fn test_extraction_is_deterministic() {
    let (use_case, _) = pipeline(ScriptedSource::empty());
    let bytes = kernel_plus_squashfs();

    let first = use_case
        .execute(
            AnalysisRequest::new("router.bin", bytes.clone()).offline(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let second = use_case
        .execute(
            AnalysisRequest::new("router.bin", bytes).offline(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(first.components, second.components);
    assert_eq!(first.bom, second.bom);
}

#[tokio::test]
async fn test_four_byte_upload_is_corrupt() {
    let (use_case, store) = pipeline(ScriptedSource::empty());

    let request = AnalysisRequest::new("tiny.bin", vec![0x12, 0x34, 0x56, 0x78]);
    let error = use_case
        .execute(request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(format!("{}", error).contains("corrupt firmware image"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_known_vulnerable_openssl_is_ranked_critical() {
    let source = ScriptedSource::new(vec![(
        "openssl",
        Script::Advisories(vec![
            advisory("CVE-2021-3711", 9.8),
            advisory("CVE-2021-3712", 7.4),
        ]),
    )]);
    let (use_case, _) = pipeline(source);

    let request = AnalysisRequest::new("router.bin", kernel_plus_squashfs());
    let report = use_case
        .execute(request, &CancellationToken::new())
        .await
        .unwrap();

    let critical = &report.vulnerabilities[0];
    assert_eq!(critical.id, "CVE-2021-3711");
    assert_eq!(critical.severity, Severity::Critical);
    assert!(critical.matched_entries.contains("openssl@1.1.1k"));

    // Ranked before the lower-severity advisory.
    let high = report
        .vulnerabilities
        .iter()
        .find(|v| v.id == "CVE-2021-3712")
        .unwrap();
    assert_eq!(high.severity, Severity::High);
    assert!(report
        .vulnerabilities
        .iter()
        .position(|v| v.id == "CVE-2021-3711")
        < report
            .vulnerabilities
            .iter()
            .position(|v| v.id == "CVE-2021-3712"));
}

#[tokio::test]
async fn test_one_slow_lookup_degrades_but_completes() {
    let source = ScriptedSource::new(vec![
        (
            "openssl",
            Script::Advisories(vec![advisory("CVE-2021-3711", 9.8)]),
        ),
        ("dnsmasq", Script::Hang),
    ]);
    let (use_case, store) = pipeline(source);

    let request = AnalysisRequest::new("router.bin", kernel_plus_squashfs());
    let report = use_case
        .execute(request, &CancellationToken::new())
        .await
        .unwrap();

    // The run completes; the slow entry alone is degraded.
    assert!(report.degraded);
    assert!(report
        .unresolved
        .iter()
        .any(|u| u.entry == "dnsmasq@2.80" && u.reason == UnresolvedReason::LookupTimeout));
    assert!(report
        .vulnerabilities
        .iter()
        .any(|v| v.id == "CVE-2021-3711"));
    assert!(store.latest_for_image(&report.image.content_hash).await.unwrap().is_some());
}

#[tokio::test]
async fn test_versionless_entries_are_not_looked_up() {
    // SquashFS only, no recognizable banners: the inventory falls back to
    // unknown-filesystem with no version.
    let mut image = vec![0u8; 0x2000];
    write_at(&mut image, 0, b"hsqs");
    write_at(&mut image, 40, &0x1000u64.to_le_bytes());

    let source = ScriptedSource::empty();
    let (use_case, _) = pipeline(Arc::clone(&source));

    let report = use_case
        .execute(
            AnalysisRequest::new("fs.img", image),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.degraded);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].entry, "unknown-filesystem");
    assert_eq!(report.unresolved[0].reason, UnresolvedReason::MissingVersion);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeat_analysis_hits_the_cache() {
    let source = ScriptedSource::new(vec![(
        "openssl",
        Script::Advisories(vec![advisory("CVE-2021-3711", 9.8)]),
    )]);
    let (use_case, _) = pipeline(Arc::clone(&source));
    let bytes = kernel_plus_squashfs();

    use_case
        .execute(
            AnalysisRequest::new("router.bin", bytes.clone()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let calls_after_first = source.calls.load(Ordering::SeqCst);

    use_case
        .execute(
            AnalysisRequest::new("router.bin", bytes),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // Every key was served from the correlation cache the second time.
    assert_eq!(source.calls.load(Ordering::SeqCst), calls_after_first);
}
