//! Transcript Comparator.
//!
//! Runs test cases end to end and turns each run into a verdict. It provides:
//! 1. **Single runs:** [`run`] loads an image, feeds it a script and returns the transcript
//!    and outcome.
//! 2. **Judging:** [`judge`] compares a run against a [`TestCase`]'s expectations and reports
//!    the first divergence.
//! 3. **Suites:** [`run_suite`] executes independent cases, optionally on scoped worker
//!    threads, and reports them in case order with a process exit code.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::common::error::{Error, Fault, FaultKind, LoadError, Mismatch};
use crate::config::Config;
use crate::isa::CpuVariant;
use crate::sim::image::ProgramImage;
use crate::sim::loader;
use crate::sim::simulator::Simulator;
use crate::soc::console::{FailureInjection, InputScript, Transcript};
use crate::stats::RunStats;

/// Process exit code when every case passed.
pub const EXIT_PASS: u8 = 0;
/// Process exit code when any case failed, errored or timed out.
pub const EXIT_FAIL: u8 = 1;
/// Process exit code for harness-level problems such as a malformed manifest.
pub const EXIT_HARNESS: u8 = 2;

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program called `exit` with this status.
    Exited(i32),
    /// The CPU faulted.
    Faulted(Fault),
}

/// Observable result of one run.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Everything the program read and wrote.
    pub transcript: Transcript,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Run counters.
    pub stats: RunStats,
}

impl RunResult {
    /// Exit status, if the program exited.
    pub fn exit_status(&self) -> Option<i32> {
        match self.outcome {
            RunOutcome::Exited(status) => Some(status),
            RunOutcome::Faulted(_) => None,
        }
    }

    /// The fault, if the run faulted.
    pub fn fault(&self) -> Option<&Fault> {
        match &self.outcome {
            RunOutcome::Faulted(fault) => Some(fault),
            RunOutcome::Exited(_) => None,
        }
    }
}

/// Runs `image` with default settings.
///
/// # Arguments
///
/// * `image` - The program.
/// * `args` - Program name followed by the arguments.
/// * `input` - Scripted input.
/// * `step_budget` - Overrides the default budget when set.
pub fn run(
    image: &ProgramImage,
    args: &[Vec<u8>],
    input: InputScript,
    step_budget: Option<u64>,
) -> Result<RunResult, LoadError> {
    let mut config = Config::default();
    if let Some(budget) = step_budget {
        config.general.step_budget = budget;
    }
    let failures = FailureInjection::from(&config.console);
    run_with(image, args, input, failures, &config)
}

/// Runs `image` with explicit failure injection and configuration.
pub fn run_with(
    image: &ProgramImage,
    args: &[Vec<u8>],
    input: InputScript,
    failures: FailureInjection,
    config: &Config,
) -> Result<RunResult, LoadError> {
    let program = loader::load(image, args, config)?;
    let mut sim = Simulator::new(program, input, failures);
    let outcome = sim.run();
    Ok(RunResult {
        transcript: sim.console.into_transcript(),
        outcome,
        stats: sim.stats,
    })
}

/// A named program run with its expected behavior.
#[derive(Clone, Debug)]
pub struct TestCase {
    /// Case name used in reports.
    pub name: String,
    /// The program.
    pub image: ProgramImage,
    /// Program name followed by the arguments.
    pub args: Vec<Vec<u8>>,
    /// Scripted input.
    pub input: InputScript,
    /// Expected stdout bytes.
    pub expected_output: Vec<u8>,
    /// Expected stderr bytes; stderr is not judged when `None`.
    pub expected_stderr: Option<Vec<u8>>,
    /// Expected exit status.
    pub expected_exit: i32,
    /// Fault the run must end with instead of exiting.
    pub expected_fault: Option<FaultKind>,
    /// Overrides the configured step budget.
    pub step_budget: Option<u64>,
    /// Injected write failures. A non-empty plan replaces the configured one.
    pub failures: FailureInjection,
    /// Set when the case could not be assembled; reported without running.
    pub setup_error: Option<Error>,
}

impl TestCase {
    /// Creates a case expecting empty output and exit status 0.
    pub fn new(name: impl Into<String>, image: ProgramImage) -> Self {
        Self {
            name: name.into(),
            image,
            args: Vec::new(),
            input: InputScript::default(),
            expected_output: Vec::new(),
            expected_stderr: None,
            expected_exit: 0,
            expected_fault: None,
            step_budget: None,
            failures: FailureInjection::default(),
            setup_error: None,
        }
    }

    /// Creates a case that reports `error` instead of running.
    pub fn unresolved(name: impl Into<String>, error: Error) -> Self {
        let placeholder = ProgramImage::raw(Vec::new(), 0, 0, CpuVariant::default());
        Self {
            setup_error: Some(error),
            ..Self::new(name, placeholder)
        }
    }

    /// Sets the argument list, program name first.
    #[must_use]
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the scripted input.
    #[must_use]
    pub fn input(mut self, input: impl Into<InputScript>) -> Self {
        self.input = input.into();
        self
    }

    /// Sets the expected stdout bytes.
    #[must_use]
    pub fn expect_output(mut self, output: impl Into<Vec<u8>>) -> Self {
        self.expected_output = output.into();
        self
    }

    /// Sets the expected stderr bytes.
    #[must_use]
    pub fn expect_stderr(mut self, output: impl Into<Vec<u8>>) -> Self {
        self.expected_stderr = Some(output.into());
        self
    }

    /// Sets the expected exit status.
    #[must_use]
    pub fn expect_exit(mut self, status: i32) -> Self {
        self.expected_exit = status;
        self
    }

    /// Expects the run to end with a fault of `kind`.
    #[must_use]
    pub fn expect_fault(mut self, kind: FaultKind) -> Self {
        self.expected_fault = Some(kind);
        self
    }

    /// Overrides the step budget.
    #[must_use]
    pub fn step_budget(mut self, steps: u64) -> Self {
        self.step_budget = Some(steps);
        self
    }

    /// Sets the injected write failures.
    ///
    /// A non-empty plan replaces the configuration's `fail_writes` and
    /// `fail_writes_from`; an empty one keeps them.
    #[must_use]
    pub fn failures(mut self, failures: FailureInjection) -> Self {
        self.failures = failures;
        self
    }
}

/// Result of judging one case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Output and exit status (or expected fault) matched.
    Pass,
    /// The run completed but diverged from its expectation.
    Fail(Mismatch),
    /// The case could not be loaded, or the run faulted unexpectedly.
    Error(Error),
    /// The step budget ran out.
    Timeout {
        /// Steps executed.
        steps: u64,
    },
}

impl Verdict {
    /// True for `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail(mismatch) => write!(f, "FAIL ({mismatch})"),
            Self::Error(error) => write!(f, "ERROR ({error})"),
            Self::Timeout { steps } => write!(f, "TIMEOUT ({steps} steps)"),
        }
    }
}

/// First offset at which `actual` diverges from `expected`.
pub fn compare_output(expected: &[u8], actual: &[u8]) -> Option<Mismatch> {
    let offset = expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e != a)
        .or_else(|| (expected.len() != actual.len()).then(|| expected.len().min(actual.len())))?;
    Some(Mismatch::Output {
        offset,
        expected: expected.get(offset).copied(),
        actual: actual.get(offset).copied(),
    })
}

/// First offset at which the stderr transcript diverges from `expected`.
fn compare_stderr(expected: &[u8], actual: &[u8]) -> Option<Mismatch> {
    match compare_output(expected, actual)? {
        Mismatch::Output {
            offset,
            expected,
            actual,
        } => Some(Mismatch::Stderr {
            offset,
            expected,
            actual,
        }),
        other => Some(other),
    }
}

/// Judges `result` against the expectations of `case`.
///
/// Stdout is always compared. Stderr is compared only when the case sets
/// [`TestCase::expected_stderr`], after stdout.
pub fn judge(case: &TestCase, result: &RunResult) -> Verdict {
    let stdout = result.transcript.stdout();
    let output_mismatch = || {
        compare_output(&case.expected_output, &stdout).or_else(|| {
            let expected = case.expected_stderr.as_deref()?;
            compare_stderr(expected, &result.transcript.stderr())
        })
    };

    match (&result.outcome, case.expected_fault) {
        (RunOutcome::Faulted(fault), Some(kind)) if fault.kind() == kind => {
            output_mismatch().map_or(Verdict::Pass, Verdict::Fail)
        }
        (RunOutcome::Faulted(Fault::Timeout { steps }), _) => Verdict::Timeout { steps: *steps },
        (RunOutcome::Faulted(fault), _) => Verdict::Error(Error::from(fault.clone())),
        (RunOutcome::Exited(status), Some(expected)) => Verdict::Fail(Mismatch::MissingFault {
            expected,
            exit_status: *status,
        }),
        (RunOutcome::Exited(status), None) => {
            if let Some(mismatch) = output_mismatch() {
                Verdict::Fail(mismatch)
            } else if *status != case.expected_exit {
                Verdict::Fail(Mismatch::ExitStatus {
                    expected: case.expected_exit,
                    actual: *status,
                })
            } else {
                Verdict::Pass
            }
        }
    }
}

/// Verdict of one case together with its run, if it got that far.
#[derive(Clone, Debug)]
pub struct CaseReport {
    /// Case name.
    pub name: String,
    /// The verdict.
    pub verdict: Verdict,
    /// The run; `None` when loading failed.
    pub result: Option<RunResult>,
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8} {}", self.verdict_tag(), self.name)?;
        match &self.verdict {
            Verdict::Pass => Ok(()),
            Verdict::Fail(mismatch) => write!(f, ": {mismatch}"),
            Verdict::Error(error) => write!(f, ": {error}"),
            Verdict::Timeout { steps } => write!(f, ": step budget exhausted after {steps} steps"),
        }
    }
}

impl CaseReport {
    fn verdict_tag(&self) -> &'static str {
        match self.verdict {
            Verdict::Pass => "PASS",
            Verdict::Fail(_) => "FAIL",
            Verdict::Error(_) => "ERROR",
            Verdict::Timeout { .. } => "TIMEOUT",
        }
    }
}

/// Loads, runs and judges one case.
///
/// # Arguments
///
/// * `case` - The case.
/// * `config` - Base configuration; the case's budget and failures are layered on top.
pub fn run_case(case: &TestCase, config: &Config) -> CaseReport {
    if let Some(error) = &case.setup_error {
        return CaseReport {
            name: case.name.clone(),
            verdict: Verdict::Error(error.clone()),
            result: None,
        };
    }

    let mut config = config.clone();
    if let Some(budget) = case.step_budget {
        config.general.step_budget = budget;
    }
    let mut failures = FailureInjection::from(&config.console);
    if !case.failures.is_empty() {
        failures = case.failures.clone();
    }

    tracing::debug!(case = %case.name, budget = config.general.step_budget, "running case");
    match run_with(&case.image, &case.args, case.input.clone(), failures, &config) {
        Ok(result) => CaseReport {
            name: case.name.clone(),
            verdict: judge(case, &result),
            result: Some(result),
        },
        Err(e) => CaseReport {
            name: case.name.clone(),
            verdict: Verdict::Error(Error::Load(e)),
            result: None,
        },
    }
}

/// Reports of a whole suite, in case order.
#[derive(Clone, Debug, Default)]
pub struct SuiteReport {
    /// One report per case.
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// Number of passing cases.
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.verdict.is_pass()).count()
    }

    /// Number of cases that did not pass.
    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    /// `EXIT_PASS` if every case passed, `EXIT_FAIL` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.failed() == 0 {
            EXIT_PASS
        } else {
            EXIT_FAIL
        }
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!(
            "{} cases: {} passed, {} failed",
            self.cases.len(),
            self.passed(),
            self.failed()
        )
    }
}

/// Runs every case, using up to `jobs` worker threads.
///
/// Cases share nothing, so they may finish in any order; reports come back in case order.
pub fn run_suite(cases: &[TestCase], config: &Config, jobs: usize) -> SuiteReport {
    let jobs = jobs.clamp(1, cases.len().max(1));
    if jobs == 1 {
        return SuiteReport {
            cases: cases.iter().map(|c| run_case(c, config)).collect(),
        };
    }

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<CaseReport>>> = Mutex::new(vec![None; cases.len()]);
    thread::scope(|scope| {
        for _ in 0..jobs {
            let _ = scope.spawn(|| {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(case) = cases.get(index) else { break };
                    let report = run_case(case, config);
                    if let Ok(mut slots) = slots.lock() {
                        slots[index] = Some(report);
                    }
                }
            });
        }
    });

    let slots = slots.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
    let cases = slots
        .into_iter()
        .zip(cases)
        .map(|(slot, case)| {
            slot.unwrap_or_else(|| CaseReport {
                name: case.name.clone(),
                verdict: Verdict::Error(Error::WorkerStopped),
                result: None,
            })
        })
        .collect();
    SuiteReport { cases }
}
