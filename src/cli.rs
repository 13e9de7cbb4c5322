//! Helpers for the `process` command.

use anyhow::Context;
use scan_imaging::{FilterKind, NormalizedCorner, Quad};
use std::path::Path;
use std::sync::Arc;

use crate::error::JobError;
use crate::models::{JobConfig, JobRequest, OutputFormat};
use crate::services::{ImageCrateCodec, JobDispatcher};

const CLI_CORRELATION_ID: &str = "cli";

/// Parse `"dx,dy;dx,dy;dx,dy;dx,dy"` (top-left, top-right, bottom-right,
/// bottom-left) into a quad.
pub fn parse_corners(s: &str) -> Result<Quad, JobError> {
    let corners: Vec<NormalizedCorner> = s
        .split(';')
        .map(|pair| {
            let (dx, dy) = pair
                .split_once(',')
                .ok_or_else(|| JobError::InvalidPayload(format!("corner '{pair}' is not dx,dy")))?;
            let parse = |v: &str| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|e| JobError::InvalidPayload(format!("corner '{pair}': {e}")))
            };
            Ok(NormalizedCorner::new(parse(dx)?, parse(dy)?))
        })
        .collect::<Result<_, JobError>>()?;

    let corners: [NormalizedCorner; 4] = corners.try_into().map_err(|v: Vec<_>| {
        JobError::InvalidPayload(format!("expected 4 corners, got {}", v.len()))
    })?;
    Ok(Quad::from(corners))
}

/// Output format implied by a file extension, if any.
pub fn format_for_path(path: &Path) -> Option<OutputFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(OutputFormat::Png),
        "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
        _ => None,
    }
}

/// Build the job for one `process` invocation. A filter wins over corners.
pub fn build_request(
    image_bytes: Vec<u8>,
    filter: Option<&str>,
    corners: Option<&str>,
) -> Result<JobRequest, JobError> {
    match (filter, corners) {
        (Some(name), _) => {
            let kind: FilterKind = name.parse()?;
            Ok(JobRequest::filter(CLI_CORRELATION_ID, image_bytes, kind))
        }
        (None, Some(corners)) => Ok(JobRequest::perspective(
            CLI_CORRELATION_ID,
            image_bytes,
            &parse_corners(corners)?,
        )),
        (None, None) => Err(JobError::InvalidPayload(
            "either a filter or corners are required".to_string(),
        )),
    }
}

/// Run one job from `input` to `output`, returning the bytes written.
///
/// The output extension, when recognised, overrides the configured format.
pub async fn process_file(
    config: &JobConfig,
    input: &Path,
    output: &Path,
    filter: Option<&str>,
    corners: Option<&str>,
) -> anyhow::Result<usize> {
    let mut config = config.clone();
    if let Some(format) = format_for_path(output) {
        config.output_format = format;
    }

    let image_bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let request = build_request(image_bytes, filter, corners)?;

    let dispatcher = JobDispatcher::new(Arc::new(ImageCrateCodec::new()), &config);
    let bytes = dispatcher.process(request).await?;

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::debug!(output = %output.display(), bytes = bytes.len(), "Wrote job result");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corners() {
        let quad = parse_corners("0,0; 1,0; 1,1; 0,1").unwrap();
        assert_eq!(quad, Quad::full());

        let quad = parse_corners("0.1,0.2;0.9,0.1;0.8,0.9;0.2,0.8").unwrap();
        assert_eq!(quad.bottom_right, NormalizedCorner::new(0.8, 0.9));
    }

    #[test]
    fn test_parse_corners_errors() {
        assert!(parse_corners("0,0;1,0;1,1").is_err());
        assert!(parse_corners("0,0;1,0;1,1;0,1;0.5,0.5").is_err());
        assert!(parse_corners("0,0;1;1,1;0,1").is_err());
        assert!(parse_corners("0,0;x,0;1,1;0,1").is_err());
        assert!(parse_corners("").is_err());
    }

    #[test]
    fn test_build_request() {
        let request = build_request(vec![1, 2], Some("document"), None).unwrap();
        assert_eq!(request.operation, "applyFilter");
        assert_eq!(request.correlation_id, "cli");

        let request = build_request(vec![1, 2], None, Some("0,0;1,0;1,1;0,1")).unwrap();
        assert_eq!(request.operation, "perspectiveTransform");

        assert!(matches!(
            build_request(vec![], Some("sepia"), None),
            Err(JobError::UnknownFilter(_))
        ));
        assert!(build_request(vec![], None, None).is_err());
    }

    #[test]
    fn test_format_for_path() {
        assert_eq!(format_for_path(Path::new("out.PNG")), Some(OutputFormat::Png));
        assert_eq!(format_for_path(Path::new("a/b.jpeg")), Some(OutputFormat::Jpeg));
        assert_eq!(format_for_path(Path::new("out.jpg")), Some(OutputFormat::Jpeg));
        assert_eq!(format_for_path(Path::new("out.webp")), None);
        assert_eq!(format_for_path(Path::new("out")), None);
    }
}
