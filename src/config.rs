//! Configuration types for document extraction and the HTTP service.
//!
//! Extraction behaviour is controlled through [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. The listener, warm-up and error-status
//! policy of the service live in [`ServerConfig`].

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;

/// Separator cascade used by the text chunker, most preferred first.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ".", " ", ""];

/// Options handed to the conversion engine for every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Accelerator thread count. Default: 8.
    pub num_threads: usize,

    /// Accelerator device. Default: [`AcceleratorDevice::Auto`].
    pub device: AcceleratorDevice,

    /// Resolution scale for generated picture and page images. Default: 2.0.
    pub images_scale: f32,

    /// Run OCR on bitmap content. Default: true.
    pub do_ocr: bool,

    /// Recover table structure. Default: true.
    pub do_table_structure: bool,

    /// Match predicted table cells back to PDF text cells. Default: true.
    pub do_cell_matching: bool,

    /// Keep picture bitmaps in the converted document. Default: true.
    ///
    /// The images pass fails on any picture without bitmap data, so turning
    /// this off only makes sense for documents known to have no pictures.
    pub generate_picture_images: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            num_threads: 8,
            device: AcceleratorDevice::Auto,
            images_scale: 2.0,
            do_ocr: true,
            do_table_structure: true,
            do_cell_matching: true,
            generate_picture_images: true,
        }
    }
}

/// Text chunking parameters. Sizes are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chunk length. Default: 1000.
    pub chunk_size: usize,

    /// Characters of trailing context repeated at the start of the next chunk. Default: 100.
    pub chunk_overlap: usize,

    /// Split separators in order of preference. `""` splits between characters.
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChunkConfig {
    fn validate(&self) -> Result<(), ExtractError> {
        if self.chunk_size == 0 {
            return Err(ExtractError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ExtractError::InvalidConfig(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "At least one chunk separator is required".into(),
            ));
        }
        Ok(())
    }
}

/// Conversion engine selection and engine-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Which engine converts documents. Default: [`EngineKind::Docling`].
    pub kind: EngineKind,

    /// Options applied to every conversion.
    pub pipeline: PipelineOptions,

    /// docling executable, looked up on `PATH` when relative. Default: `docling`.
    pub docling_bin: PathBuf,

    /// Directory of pre-fetched docling model weights, for offline hosts.
    pub artifacts_path: Option<PathBuf>,

    /// Explicit pdfium shared library. When unset the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            pipeline: PipelineOptions::default(),
            docling_bin: PathBuf::from("docling"),
            artifacts_path: None,
            pdfium_lib_path: None,
        }
    }
}

/// Configuration for document extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docextract::{EngineKind, ExtractionConfig};
///
/// let config = ExtractionConfig::builder()
///     .engine(EngineKind::Docling)
///     .num_threads(4)
///     .chunk_size(800)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunking.chunk_overlap, 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub engine: EngineConfig,
    pub chunking: ChunkConfig,
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn engine(mut self, kind: EngineKind) -> Self {
        self.config.engine.kind = kind;
        self
    }

    pub fn docling_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.config.engine.docling_bin = bin.into();
        self
    }

    pub fn artifacts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engine.artifacts_path = Some(path.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engine.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.engine.pipeline.num_threads = n.max(1);
        self
    }

    pub fn device(mut self, device: AcceleratorDevice) -> Self {
        self.config.engine.pipeline.device = device;
        self
    }

    pub fn images_scale(mut self, scale: f32) -> Self {
        self.config.engine.pipeline.images_scale = scale;
        self
    }

    pub fn ocr(mut self, v: bool) -> Self {
        self.config.engine.pipeline.do_ocr = v;
        self
    }

    pub fn table_structure(mut self, v: bool) -> Self {
        self.config.engine.pipeline.do_table_structure = v;
        self
    }

    pub fn cell_matching(mut self, v: bool) -> Self {
        self.config.engine.pipeline.do_cell_matching = v;
        self
    }

    pub fn picture_images(mut self, v: bool) -> Self {
        self.config.engine.pipeline.generate_picture_images = v;
        self
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.config.chunking.chunk_size = n;
        self
    }

    pub fn chunk_overlap(mut self, n: usize) -> Self {
        self.config.chunking.chunk_overlap = n;
        self
    }

    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.chunking.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let p = &self.config.engine.pipeline;
        if p.num_threads == 0 {
            return Err(ExtractError::InvalidConfig(
                "Thread count must be ≥ 1".into(),
            ));
        }
        if !(p.images_scale.is_finite() && p.images_scale > 0.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "Image scale must be a positive number, got {}",
                p.images_scale
            )));
        }
        self.config.chunking.validate()?;
        Ok(self.config)
    }
}

/// Settings for the HTTP service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default: `0.0.0.0`.
    pub host: String,

    /// Bind port. Default: 8998.
    pub port: u16,

    /// Sample document converted once before the listener opens. Default: `test_pdf.pdf`.
    pub warmup_pdf: PathBuf,

    /// What a failed warm-up does to startup. Default: [`WarmupPolicy::Warn`].
    pub warmup_policy: WarmupPolicy,

    /// HTTP status mapping for extraction errors. Default: [`ErrorStatusPolicy::Legacy`].
    pub error_status: ErrorStatusPolicy,

    /// Upload size cap in bytes. Default: unlimited.
    pub max_upload_bytes: Option<usize>,

    /// Directory for transient upload files. Default: the system temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8998,
            warmup_pdf: PathBuf::from("test_pdf.pdf"),
            warmup_policy: WarmupPolicy::default(),
            error_status: ErrorStatusPolicy::default(),
            max_upload_bytes: None,
            temp_dir: None,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Resolve `host:port` to the address to bind. Host names are looked
    /// up; the first result wins.
    pub fn socket_addr(&self) -> Result<SocketAddr, ExtractError> {
        let invalid = |detail: String| {
            ExtractError::InvalidConfig(format!(
                "Invalid bind address '{}:{}': {}",
                self.host, self.port, detail
            ))
        };
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Accelerator device for model inference inside the conversion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorDevice {
    /// Let the engine pick the best available device. (default)
    #[default]
    Auto,
    Cpu,
    Cuda,
    Mps,
}

impl AcceleratorDevice {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceleratorDevice::Auto => "auto",
            AcceleratorDevice::Cpu => "cpu",
            AcceleratorDevice::Cuda => "cuda",
            AcceleratorDevice::Mps => "mps",
        }
    }
}

impl fmt::Display for AcceleratorDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcceleratorDevice {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(AcceleratorDevice::Auto),
            "cpu" => Ok(AcceleratorDevice::Cpu),
            "cuda" => Ok(AcceleratorDevice::Cuda),
            "mps" => Ok(AcceleratorDevice::Mps),
            other => Err(ExtractError::InvalidConfig(format!(
                "Unknown accelerator device '{}' (expected auto, cpu, cuda or mps)",
                other
            ))),
        }
    }
}

/// Which conversion engine turns a PDF into a structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// The docling CLI: layout analysis, OCR and table structure. (default)
    #[default]
    Docling,
    /// In-process pdfium: text and embedded images only.
    Pdfium,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Docling => "docling",
            EngineKind::Pdfium => "pdfium",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docling" => Ok(EngineKind::Docling),
            "pdfium" => Ok(EngineKind::Pdfium),
            other => Err(ExtractError::InvalidConfig(format!(
                "Unknown engine '{}' (expected docling or pdfium)",
                other
            ))),
        }
    }
}

/// What happens when the startup warm-up conversion cannot run or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarmupPolicy {
    /// Log a warning and start serving anyway. (default)
    #[default]
    Warn,
    /// Abort startup.
    FailFast,
}

impl FromStr for WarmupPolicy {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(WarmupPolicy::Warn),
            "fail-fast" | "failfast" => Ok(WarmupPolicy::FailFast),
            other => Err(ExtractError::InvalidConfig(format!(
                "Unknown warm-up policy '{}' (expected warn or fail-fast)",
                other
            ))),
        }
    }
}

/// HTTP status mapping for extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorStatusPolicy {
    /// Every extraction failure is a 500. (default)
    #[default]
    Legacy,
    /// Rejected input is a 422, internal failures stay 500.
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = ExtractionConfig::default();
        assert_eq!(c.chunking.chunk_size, 1000);
        assert_eq!(c.chunking.chunk_overlap, 100);
        assert_eq!(c.chunking.separators, vec!["\n\n", "\n", ".", " ", ""]);
        let p = &c.engine.pipeline;
        assert_eq!(p.num_threads, 8);
        assert_eq!(p.device, AcceleratorDevice::Auto);
        assert_eq!(p.images_scale, 2.0);
        assert!(p.do_ocr && p.do_table_structure && p.do_cell_matching);
        assert!(p.generate_picture_images);

        let s = ServerConfig::default();
        assert_eq!(s.socket_addr().unwrap().to_string(), "0.0.0.0:8998");
        assert_eq!(s.warmup_policy, WarmupPolicy::Warn);
        assert_eq!(s.error_status, ErrorStatusPolicy::Legacy);
        assert!(s.max_upload_bytes.is_none());
    }

    #[test]
    fn builder_rejects_overlap_not_below_size() {
        let err = ExtractionConfig::builder()
            .chunk_size(100)
            .chunk_overlap(100)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("overlap"), "got: {err}");
    }

    #[test]
    fn builder_rejects_bad_scale_and_empty_separators() {
        assert!(ExtractionConfig::builder().images_scale(0.0).build().is_err());
        assert!(ExtractionConfig::builder()
            .separators(Vec::<String>::new())
            .build()
            .is_err());
    }

    #[test]
    fn builder_clamps_threads() {
        let c = ExtractionConfig::builder().num_threads(0).build().unwrap();
        assert_eq!(c.engine.pipeline.num_threads, 1);
    }

    #[test]
    fn enums_parse_from_cli_strings() {
        assert_eq!("CUDA".parse::<AcceleratorDevice>().unwrap(), AcceleratorDevice::Cuda);
        assert_eq!("pdfium".parse::<EngineKind>().unwrap(), EngineKind::Pdfium);
        assert_eq!("fail-fast".parse::<WarmupPolicy>().unwrap(), WarmupPolicy::FailFast);
        assert!("gpu".parse::<AcceleratorDevice>().is_err());
    }

    #[test]
    fn host_names_resolve() {
        let s = ServerConfig {
            host: "localhost".into(),
            port: 9000,
            ..ServerConfig::default()
        };
        let addr = s.socket_addr().unwrap();
        assert!(addr.ip().is_loopback(), "got {addr}");
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn bad_host_is_config_error() {
        let s = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            s.socket_addr(),
            Err(ExtractError::InvalidConfig(_))
        ));
    }
}
