//! Character input scenarios over the `interactive` fixture.

use bug65_core::Config;
use bug65_core::common::error::{Fault, FaultKind};
use bug65_core::sim::harness::{self, RunOutcome, RunResult, TestCase, Verdict, run_case};
use bug65_core::soc::console::InputScript;
use pretty_assertions::assert_eq;

use crate::common::fixtures::{argv, interactive_program};

const BANNER: &str = "Type something and press ENTER (q to quit):\\n";

fn run_interactive(input: InputScript, step_budget: Option<u64>) -> RunResult {
    harness::run(&interactive_program(), &argv(&["interactive"]), input, step_budget).unwrap()
}

#[test]
fn typed_bytes_are_echoed_until_q() {
    let result = run_interactive("abq".into(), None);

    assert_eq!(result.outcome, RunOutcome::Exited(0));
    let expected = format!(
        "{BANNER}You typed: a (0x61)\\nYou typed: b (0x62)\\nYou typed: q (0x71)\\nBye!\\n"
    );
    assert_eq!(String::from_utf8(result.transcript.stdout()).unwrap(), expected);
    assert_eq!(result.transcript.consumed(), b"abq".to_vec());
}

#[test]
fn nothing_past_the_terminator_is_read() {
    let result = run_interactive("xq tail".into(), None);

    assert_eq!(result.exit_status(), Some(0));
    assert_eq!(result.transcript.consumed(), b"xq".to_vec());
    assert_eq!(result.stats.bytes_read, 2);
    assert_eq!(result.stats.calls_to("getchar"), 2);
}

#[test]
fn high_byte_is_data_not_end_of_input() {
    let result = run_interactive(b"\xFFq".as_slice().into(), None);

    let stdout = result.transcript.stdout();
    let text = String::from_utf8_lossy(&stdout);
    assert!(text.contains("(0xff)"), "0xFF must be echoed as a typed byte: {text}");
    assert_eq!(result.exit_status(), Some(0));
}

#[test]
fn empty_input_spins_until_timeout() {
    let result = run_interactive("".into(), Some(20_000));

    assert!(matches!(result.fault(), Some(Fault::Timeout { steps: 20_000 })));
    assert_eq!(String::from_utf8(result.transcript.stdout()).unwrap(), BANNER);
    assert!(result.transcript.inputs().is_empty());
    assert!(result.stats.calls_to("getchar") > 1);
}

#[test]
fn end_of_input_is_stable_after_the_script() {
    let result = run_interactive("ab".into(), Some(20_000));

    assert_eq!(result.fault().map(Fault::kind), Some(FaultKind::Timeout));
    let expected = format!("{BANNER}You typed: a (0x61)\\nYou typed: b (0x62)\\n");
    assert_eq!(String::from_utf8(result.transcript.stdout()).unwrap(), expected);
    assert_eq!(result.transcript.consumed(), b"ab".to_vec());
}

#[test]
fn missing_terminator_is_a_timeout_verdict() {
    let case = TestCase::new("interactive-eof", interactive_program())
        .args(["interactive"])
        .step_budget(20_000)
        .expect_output(BANNER);

    let report = run_case(&case, &Config::default());
    assert_eq!(report.verdict, Verdict::Timeout { steps: 20_000 });
}

#[test]
fn expected_timeout_passes_when_declared() {
    let case = TestCase::new("interactive-eof", interactive_program())
        .args(["interactive"])
        .step_budget(20_000)
        .expect_output(BANNER)
        .expect_fault(FaultKind::Timeout);

    let report = run_case(&case, &Config::default());
    assert_eq!(report.verdict, Verdict::Pass);
}
