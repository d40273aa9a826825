//! docling CLI engine.
//!
//! Each conversion runs `docling` as a child process writing its JSON
//! export into a scratch directory, which is removed when the call returns.
//! Models are loaded by each process, so the startup warm-up only ensures
//! they are downloaded.
//!
//! ```text
//! docling <pdf> --to json --image-export-mode embedded --ocr --tables
//!         --num-threads 8 --device auto --abort-on-error --output <scratch>
//! ```

use super::ConversionEngine;
use crate::config::PipelineOptions;
use crate::document::ConvertedDocument;
use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, warn};

/// Image scale the CLI applies when exporting embedded images.
const CLI_IMAGES_SCALE: f32 = 2.0;

/// stderr fragments that mean docling refused the input itself.
const INPUT_FAILURE_MARKERS: &[&str] = &[
    "conversionerror",
    "conversionstatus.failure",
    "is not valid",
    "failed to load",
    "input document",
    "pdfiumerror",
    "password",
    "file format not allowed",
];

const STDERR_TAIL_LINES: usize = 20;

/// Runs the docling command line tool.
#[derive(Debug, Clone)]
pub struct DoclingEngine {
    bin: PathBuf,
    options: PipelineOptions,
    artifacts_path: Option<PathBuf>,
}

impl DoclingEngine {
    pub fn new(bin: PathBuf, options: PipelineOptions, artifacts_path: Option<PathBuf>) -> Self {
        if (options.images_scale - CLI_IMAGES_SCALE).abs() > f32::EPSILON {
            warn!(
                "docling CLI exports images at scale {}; images_scale={} is ignored",
                CLI_IMAGES_SCALE, options.images_scale
            );
        }
        if !options.do_cell_matching {
            warn!("docling CLI always matches table cells; do_cell_matching=false is ignored");
        }
        Self {
            bin,
            options,
            artifacts_path,
        }
    }

    fn command(&self, pdf_path: &Path, out_dir: &Path) -> Command {
        let o = &self.options;
        let mut cmd = Command::new(&self.bin);
        cmd.arg(pdf_path)
            .args(["--to", "json"])
            .arg("--image-export-mode")
            .arg(if o.generate_picture_images {
                "embedded"
            } else {
                "placeholder"
            })
            .arg(if o.do_ocr { "--ocr" } else { "--no-ocr" })
            .arg(if o.do_table_structure {
                "--tables"
            } else {
                "--no-tables"
            })
            .arg("--num-threads")
            .arg(o.num_threads.to_string())
            .arg("--device")
            .arg(o.device.as_str())
            .arg("--abort-on-error")
            .arg("--output")
            .arg(out_dir);
        if let Some(artifacts) = &self.artifacts_path {
            cmd.arg("--artifacts-path").arg(artifacts);
        }
        cmd
    }
}

impl ConversionEngine for DoclingEngine {
    fn name(&self) -> &str {
        "docling"
    }

    fn convert(&self, pdf_path: &Path) -> Result<ConvertedDocument, ExtractError> {
        let out_dir = tempfile::Builder::new()
            .prefix("docling-out-")
            .tempdir()
            .map_err(|source| ExtractError::TempFile { source })?;

        let mut cmd = self.command(pdf_path, out_dir.path());
        debug!("Running {:?}", cmd);
        let output = cmd.output().map_err(|e| ExtractError::EngineUnavailable {
            engine: self.name().to_string(),
            detail: format!("cannot run '{}': {}", self.bin.display(), e),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(classify_failure(pdf_path, output.status, &stderr));
        }

        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let json_path = out_dir.path().join(format!("{}.json", stem));

        let bytes = match std::fs::read(&json_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractError::InputRejected {
                    path: pdf_path.to_path_buf(),
                    detail: format!("docling produced no output\n{}", stderr_tail(&stderr)),
                });
            }
            Err(e) => {
                return Err(ExtractError::Internal(format!(
                    "cannot read '{}': {}",
                    json_path.display(),
                    e
                )))
            }
        };

        ConvertedDocument::from_json_slice(&bytes).map_err(|e| {
            ExtractError::MalformedDocument(format!("{}: {}", json_path.display(), e))
        })
    }
}

/// Map a failed docling run to an error, blaming the input when stderr says so.
fn classify_failure(pdf_path: &Path, status: ExitStatus, stderr: &str) -> ExtractError {
    let lowered = stderr.to_lowercase();
    let detail = format!("docling exited with {}\n{}", status, stderr_tail(stderr));
    if INPUT_FAILURE_MARKERS.iter().any(|m| lowered.contains(m)) {
        ExtractError::InputRejected {
            path: pdf_path.to_path_buf(),
            detail,
        }
    } else {
        ExtractError::EngineFailed {
            engine: "docling".to_string(),
            detail,
        }
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
