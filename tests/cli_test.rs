//! CLI end-to-end tests, always in offline mode so no network is touched.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn firmlens() -> Command {
    Command::cargo_bin("firmlens").unwrap()
}

/// A minimal image with a gzip member header and an OpenSSL banner.
fn sample_image() -> Vec<u8> {
    let mut bytes = vec![0x1f, 0x8b, 0x08, 0x00];
    bytes.resize(0x20, 0);
    bytes.extend_from_slice(b"OpenSSL 1.1.1k  25 Mar 2021");
    bytes.resize(0x60, 0);
    bytes
}

#[test]
fn test_offline_json_report_to_stdout() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("router.bin");
    fs::write(&image, sample_image()).unwrap();

    firmlens()
        .arg(&image)
        .arg("--offline")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"components\""))
        .stdout(predicate::str::contains("\"openssl\""))
        .stdout(predicate::str::contains("\"degraded\": false"));
}

#[test]
fn test_spdx_format() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("router.bin");
    fs::write(&image, sample_image()).unwrap();

    firmlens()
        .arg(&image)
        .args(["--format", "spdx", "--offline"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SPDX-2.3"))
        .stdout(predicate::str::contains("SPDXRef-DOCUMENT"));
}

#[test]
fn test_output_file() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("router.bin");
    let out = dir.path().join("report.json");
    fs::write(&image, sample_image()).unwrap();

    firmlens()
        .arg(&image)
        .args(["--offline", "--output"])
        .arg(&out)
        .current_dir(dir.path())
        .assert()
        .success();

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("\"bom\""));
}

#[test]
fn test_unsupported_extension_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("firmware.exe");
    fs::write(&image, sample_image()).unwrap();

    firmlens()
        .arg(&image)
        .arg("--offline")
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("unsupported firmware file extension"));
}

#[test]
fn test_corrupt_image_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("tiny.bin");
    fs::write(&image, [0u8; 4]).unwrap();

    firmlens()
        .arg(&image)
        .arg("--offline")
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("corrupt firmware image"));
}

#[test]
fn test_missing_image_argument_is_a_usage_error() {
    firmlens().assert().failure().code(2);
}

#[test]
fn test_config_file_is_discovered() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("router.bin");
    fs::write(&image, sample_image()).unwrap();
    fs::write(dir.path().join("firmlens.config.yml"), "format: spdx\n").unwrap();

    firmlens()
        .arg(&image)
        .arg("--offline")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SPDX-2.3"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("router.bin");
    let config = dir.path().join("bad.yml");
    fs::write(&image, sample_image()).unwrap();
    fs::write(&config, "concurrency: 0\n").unwrap();

    firmlens()
        .arg(&image)
        .args(["--offline", "--config"])
        .arg(&config)
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("concurrency must be at least 1"));
}
