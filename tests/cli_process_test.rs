//! Tests for the `process` command on local files.

mod common;

use common::fixtures;
use docscan::cli::process_file;
use docscan::models::{JobConfig, OutputFormat};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write_input(dir: &TempDir, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.path().join("scan.png");
    std::fs::write(&path, fixtures::png(&fixtures::solid(width, height, [0, 0, 255]))).unwrap();
    path
}

#[tokio::test]
async fn test_filter_to_png_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, 6, 4);
    let output = dir.path().join("out.png");

    let written = process_file(&JobConfig::default(), &input, &output, Some("grayscale"), None)
        .await
        .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len(), written);
    let image = fixtures::decode(&bytes);
    // 0.114 * 255 rounds to 29
    assert_eq!(image.get_rgba(5, 3), Some([29, 29, 29, 255]));
}

#[tokio::test]
async fn test_corners_to_jpeg_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, 40, 40);
    let output = dir.path().join("page.jpg");
    let config = JobConfig {
        output_format: OutputFormat::Png,
        ..Default::default()
    };

    process_file(&config, &input, &output, None, Some("0,0;0.5,0;0.5,0.5;0,0.5"))
        .await
        .unwrap();

    // The extension wins over the configured format
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    let image = fixtures::decode(&bytes);
    assert_eq!((image.width(), image.height()), (20, 20));
}

#[tokio::test]
async fn test_missing_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.png");
    let output = dir.path().join("out.png");

    let err = process_file(&JobConfig::default(), &missing, &output, Some("document"), None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to read"));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_bad_corners_leave_no_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, 8, 8);
    let output = dir.path().join("out.png");

    let result = process_file(&JobConfig::default(), &input, &output, None, Some("0,0;1,1")).await;

    assert!(result.is_err());
    assert!(!output.exists());
}
