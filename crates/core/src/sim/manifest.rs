//! Test suite manifests.
//!
//! A manifest is a JSON document listing test cases. Paths are relative to the manifest's
//! directory; inputs and expected outputs may be inline text or `{ "file": path }`.
//!
//! ```json
//! {
//!   "step_budget": 1000000,
//!   "cases": [
//!     {
//!       "name": "args",
//!       "image": "args.sim",
//!       "labels": "args.lbl",
//!       "args": ["args", "one", "two"],
//!       "expected_output": { "file": "args.out" },
//!       "expected_exit": 0
//!     },
//!     {
//!       "name": "interactive-eof",
//!       "image": "interactive.sim",
//!       "input": "ab",
//!       "expected_fault": "Timeout"
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::error::{Error, FaultKind};
use crate::isa::CpuVariant;
use crate::sim::harness::TestCase;
use crate::sim::image::ProgramImage;
use crate::sim::labels::SymbolTable;
use crate::sim::loader::load_binary;
use crate::soc::console::{FailureInjection, InputScript};

/// Byte content given inline or by file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ByteSource {
    /// Literal text.
    Text(String),
    /// Contents of a file relative to the manifest.
    File {
        /// Path to the file.
        file: PathBuf,
    },
}

impl ByteSource {
    /// Resolves the bytes, reading files relative to `base_dir`.
    pub fn resolve(&self, base_dir: &Path) -> Result<Vec<u8>, Error> {
        match self {
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::File { file } => {
                let path = base_dir.join(file);
                std::fs::read(&path)
                    .map_err(|e| Error::Manifest(format!("could not read {}: {e}", path.display())))
            }
        }
    }
}

/// Headerless image placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct RawPlacement {
    /// Load address.
    pub load: u16,
    /// Entry address.
    pub entry: u16,
    /// Processor to run.
    #[serde(default)]
    pub variant: CpuVariant,
}

/// One case as written in the manifest.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    /// Case name.
    pub name: String,
    /// Image path.
    pub image: PathBuf,
    /// Treat the image as headerless bytes at this placement.
    #[serde(default)]
    pub raw: Option<RawPlacement>,
    /// ld65 label file path.
    #[serde(default)]
    pub labels: Option<PathBuf>,
    /// Program name followed by the arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Scripted input.
    #[serde(default)]
    pub input: Option<ByteSource>,
    /// Expected stdout.
    #[serde(default)]
    pub expected_output: Option<ByteSource>,
    /// Expected stderr; not judged when absent.
    #[serde(default)]
    pub expected_stderr: Option<ByteSource>,
    /// Expected exit status.
    #[serde(default)]
    pub expected_exit: i32,
    /// Fault the run must end with.
    #[serde(default)]
    pub expected_fault: Option<FaultKind>,
    /// Overrides the manifest's step budget.
    #[serde(default)]
    pub step_budget: Option<u64>,
    /// Indices of write calls that fail.
    #[serde(default)]
    pub fail_writes: Vec<usize>,
    /// Every write call from this index on fails.
    #[serde(default)]
    pub fail_writes_from: Option<usize>,
}

/// A parsed manifest.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Budget for cases that do not set their own.
    #[serde(default)]
    pub step_budget: Option<u64>,
    /// The cases, in report order.
    pub cases: Vec<CaseSpec>,
}

impl Manifest {
    /// Parses manifest JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Manifest(format!("invalid manifest: {e}")))
    }

    /// Reads and parses a manifest file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Manifest(format!("could not read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Builds the test cases, reading every referenced file relative to `base_dir`.
    ///
    /// # Returns
    ///
    /// One case per entry, in manifest order. An entry whose files cannot be read or
    /// parsed becomes a case carrying that error (`Error::Manifest` for an unreadable
    /// input or transcript, `Error::Load` for a bad image or label file), so the suite
    /// reports it as that case's verdict and carries on.
    pub fn resolve(&self, base_dir: &Path) -> Vec<TestCase> {
        self.cases
            .iter()
            .map(|spec| {
                self.resolve_case(spec, base_dir).unwrap_or_else(|e| {
                    tracing::warn!(case = %spec.name, error = %e, "case could not be resolved");
                    TestCase::unresolved(spec.name.clone(), e)
                })
            })
            .collect()
    }

    fn resolve_case(&self, spec: &CaseSpec, base_dir: &Path) -> Result<TestCase, Error> {
        let image_path = base_dir.join(&spec.image);
        let image = match spec.raw {
            Some(raw) => {
                let bytes = load_binary(&image_path)?;
                ProgramImage::raw(bytes, raw.load, raw.entry, raw.variant)
            }
            None => ProgramImage::from_path(&image_path)?,
        };
        let image = match &spec.labels {
            Some(labels) => image.with_symbols(SymbolTable::from_path(&base_dir.join(labels))?),
            None => image,
        };

        let mut case = TestCase::new(spec.name.clone(), image)
            .args(spec.args.iter().map(|a| a.as_bytes().to_vec()))
            .expect_exit(spec.expected_exit);
        if let Some(input) = &spec.input {
            case = case.input(InputScript::new(input.resolve(base_dir)?));
        }
        if let Some(output) = &spec.expected_output {
            case = case.expect_output(output.resolve(base_dir)?);
        }
        if let Some(stderr) = &spec.expected_stderr {
            case = case.expect_stderr(stderr.resolve(base_dir)?);
        }
        if let Some(kind) = spec.expected_fault {
            case = case.expect_fault(kind);
        }
        if let Some(budget) = spec.step_budget.or(self.step_budget) {
            case = case.step_budget(budget);
        }

        let mut failures = spec
            .fail_writes
            .iter()
            .fold(FailureInjection::default(), |f, &call| f.at(call));
        if let Some(from) = spec.fail_writes_from {
            failures = failures.starting_at(from);
        }
        Ok(case.failures(failures))
    }
}
