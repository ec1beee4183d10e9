//! Manifests, case judging and the parallel suite runner.

use std::fmt::Write as _;
use std::path::Path;

use bug65_core::Config;
use bug65_core::common::error::{Error, FaultKind, LoadError, Mismatch};
use bug65_core::isa::CpuVariant;
use bug65_core::sim::harness::{CaseReport, TestCase, Verdict, compare_output, run_case, run_suite};
use bug65_core::sim::image::ProgramImage;
use bug65_core::sim::manifest::{ByteSource, Manifest};
use bug65_core::soc::console::FailureInjection;
use pretty_assertions::assert_eq;

use crate::common::fixtures::{args_program, interactive_program, stderr_program};

/// `LDA #$07; JSR PV_EXIT`.
const EXIT_SEVEN: [u8; 5] = [0xA9, 0x07, 0x20, 0xF9, 0xFF];

fn exit_seven() -> ProgramImage {
    ProgramImage::raw(EXIT_SEVEN.to_vec(), 0x0200, 0x0200, CpuVariant::Nmos6502)
}

fn label_file(image: &ProgramImage) -> String {
    let mut text = String::new();
    for (name, addr) in image.symbols.iter() {
        let _ = writeln!(text, "al {addr:06X} .{name}");
    }
    text
}

fn write_fixture(dir: &Path, name: &str, image: &ProgramImage) {
    std::fs::write(dir.join(format!("{name}.sim")), image.to_bytes()).unwrap();
    std::fs::write(dir.join(format!("{name}.lbl")), label_file(image)).unwrap();
}

const MANIFEST: &str = r#"{
  "step_budget": 100000,
  "cases": [
    {
      "name": "exit-seven",
      "image": "exit7.bin",
      "raw": { "load": 512, "entry": 512 },
      "expected_exit": 7
    },
    {
      "name": "args",
      "image": "args.sim",
      "labels": "args.lbl",
      "args": ["args", "one"],
      "expected_output": { "file": "args.out" }
    },
    {
      "name": "no-input",
      "image": "interactive.sim",
      "labels": "interactive.lbl",
      "input": "ab",
      "step_budget": 5000
    },
    {
      "name": "wrong-exit",
      "image": "exit7.bin",
      "raw": { "load": 512, "entry": 512 }
    }
  ]
}"#;

fn suite_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("exit7.bin"), EXIT_SEVEN).unwrap();
    write_fixture(dir.path(), "args", &args_program());
    write_fixture(dir.path(), "interactive", &interactive_program());
    std::fs::write(
        dir.path().join("args.out"),
        "argc = 2\nargv[0] = args\nargv[1] = one\nGoodbye\n",
    )
    .unwrap();
    dir
}

#[test]
fn manifest_resolves_relative_to_its_directory() {
    let dir = suite_dir();
    let cases = Manifest::from_json(MANIFEST).unwrap().resolve(dir.path());

    assert_eq!(cases.len(), 4);
    assert_eq!(cases[0].image.payload, EXIT_SEVEN.to_vec());
    assert_eq!(cases[0].image.header.entry, 0x0200);
    assert_eq!(cases[0].expected_exit, 7);
    assert_eq!(cases[0].step_budget, Some(100_000));

    assert_eq!(cases[1].args, vec![b"args".to_vec(), b"one".to_vec()]);
    assert_eq!(cases[1].image.symbols.get("_printf"), Some(0xE000));
    assert!(cases[1].expected_output.starts_with(b"argc = 2\n"));

    assert_eq!(cases[2].step_budget, Some(5000));
    assert_eq!(cases[2].input.len(), 2);
    assert!(cases[3].failures.is_empty());
}

#[test]
fn suite_reports_come_back_in_case_order() {
    let dir = suite_dir();
    let cases = Manifest::from_json(MANIFEST).unwrap().resolve(dir.path());
    let report = run_suite(&cases, &Config::default(), 3);

    let names: Vec<&str> = report.cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["exit-seven", "args", "no-input", "wrong-exit"]);
    assert_eq!(report.cases[0].verdict, Verdict::Pass);
    assert_eq!(report.cases[1].verdict, Verdict::Pass);
    assert_eq!(report.cases[2].verdict, Verdict::Timeout { steps: 5000 });
    assert_eq!(
        report.cases[3].verdict,
        Verdict::Fail(Mismatch::ExitStatus {
            expected: 0,
            actual: 7,
        })
    );

    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.summary(), "4 cases: 2 passed, 2 failed");
}

#[test]
fn serial_and_parallel_runs_agree() {
    let dir = suite_dir();
    let cases = Manifest::from_json(MANIFEST).unwrap().resolve(dir.path());
    let serial = run_suite(&cases, &Config::default(), 1);
    let parallel = run_suite(&cases, &Config::default(), 8);

    let verdicts = |r: &bug65_core::sim::harness::SuiteReport| {
        r.cases.iter().map(|c| c.verdict.clone()).collect::<Vec<_>>()
    };
    assert_eq!(verdicts(&serial), verdicts(&parallel));
}

#[test]
fn empty_suite_passes() {
    let report = run_suite(&[], &Config::default(), 4);
    assert!(report.cases.is_empty());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.summary(), "0 cases: 0 passed, 0 failed");
}

#[test]
fn unknown_manifest_fields_are_rejected() {
    let err =
        Manifest::from_json(r#"{"cases": [{"name": "x", "image": "x.sim", "expect": 1}]}"#)
            .unwrap_err();
    assert!(
        matches!(&err, Error::Manifest(msg) if msg.starts_with("invalid manifest")),
        "{err}"
    );
}

#[test]
fn missing_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let source = ByteSource::File {
        file: "absent.out".into(),
    };
    let err = source.resolve(dir.path()).unwrap_err();
    assert!(
        matches!(&err, Error::Manifest(msg) if msg.contains("could not read")),
        "{err}"
    );
    assert_eq!(
        ByteSource::Text("inline".into()).resolve(dir.path()).unwrap(),
        b"inline".to_vec()
    );

    let manifest =
        Manifest::from_json(r#"{"cases": [{"name": "x", "image": "x.sim"}]}"#).unwrap();
    let cases = manifest.resolve(dir.path());
    assert_eq!(cases.len(), 1);
    assert!(matches!(&cases[0].setup_error, Some(Error::Load(LoadError::Io { .. }))));

    let report = run_case(&cases[0], &Config::default());
    assert!(matches!(report.verdict, Verdict::Error(Error::Load(LoadError::Io { .. }))));
    assert!(report.result.is_none());
}

#[test]
fn bad_image_is_isolated_to_its_case() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("exit7.bin"), EXIT_SEVEN).unwrap();
    std::fs::write(dir.path().join("bad.sim"), b"notsim65image").unwrap();
    let manifest = Manifest::from_json(
        r#"{
          "cases": [
            {
              "name": "good",
              "image": "exit7.bin",
              "raw": { "load": 512, "entry": 512 },
              "expected_exit": 7
            },
            { "name": "bad", "image": "bad.sim" },
            {
              "name": "missing-input",
              "image": "exit7.bin",
              "raw": { "load": 512, "entry": 512 },
              "input": { "file": "none.txt" }
            }
          ]
        }"#,
    )
    .unwrap();

    let cases = manifest.resolve(dir.path());
    let report = run_suite(&cases, &Config::default(), 2);

    assert_eq!(report.cases[0].verdict, Verdict::Pass);
    assert_eq!(
        report.cases[1].verdict,
        Verdict::Error(Error::Load(LoadError::BadMagic {
            found: b"notsi".to_vec()
        }))
    );
    assert!(matches!(
        &report.cases[2].verdict,
        Verdict::Error(Error::Manifest(msg)) if msg.contains("could not read")
    ));
    assert_eq!(report.summary(), "3 cases: 1 passed, 2 failed");
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn normal_exit_when_a_fault_was_expected() {
    let case = TestCase::new("exit", exit_seven()).expect_fault(FaultKind::IllegalInstruction);
    let report = run_case(&case, &Config::default());
    assert_eq!(
        report.verdict,
        Verdict::Fail(Mismatch::MissingFault {
            expected: FaultKind::IllegalInstruction,
            exit_status: 7,
        })
    );
}

#[test]
fn expected_fault_passes() {
    let image = ProgramImage::raw(vec![0x02], 0x0200, 0x0200, CpuVariant::Nmos6502);
    let case = TestCase::new("jam", image).expect_fault(FaultKind::IllegalInstruction);
    assert_eq!(run_case(&case, &Config::default()).verdict, Verdict::Pass);

    let image = ProgramImage::raw(vec![0x02], 0x0200, 0x0200, CpuVariant::Nmos6502);
    let report = run_case(&TestCase::new("jam", image), &Config::default());
    assert_eq!(
        report.verdict,
        Verdict::Error(Error::IllegalInstruction {
            addr: 0x0200,
            opcode: 0x02,
        })
    );
}

#[test]
fn load_failures_become_errors_without_a_run() {
    let image = ProgramImage::raw(vec![0xEA], 0x0200, 0x0300, CpuVariant::Nmos6502);
    let report = run_case(&TestCase::new("bad-entry", image), &Config::default());
    assert!(matches!(
        report.verdict,
        Verdict::Error(Error::Load(LoadError::EntryOutOfBounds { entry: 0x0300, .. }))
    ));
    assert!(report.result.is_none());
}

#[test]
fn configured_failures_apply_unless_the_case_sets_its_own() {
    let mut config = Config::default();
    config.console.fail_writes_from = Some(0);
    let expected = "argc = 1\nargv[0] = prog\nGoodbye\n";

    let case = TestCase::new("args", args_program()).args([b"prog".to_vec()]);
    assert_eq!(
        run_case(&case, &config).verdict,
        Verdict::Fail(Mismatch::ExitStatus {
            expected: 0,
            actual: 255,
        })
    );

    let case = case
        .expect_output(expected)
        .failures(FailureInjection::default().at(50));
    assert_eq!(run_case(&case, &config).verdict, Verdict::Pass);
}

#[test]
fn case_failures_replace_configured_ones() {
    let mut config = Config::default();
    config.console.fail_writes = vec![0];

    let inherited = TestCase::new("args", args_program()).args([b"prog".to_vec()]);
    let report = run_case(&inherited, &config);
    let stdout = report.result.unwrap().transcript.stdout();
    assert_eq!(stdout, b"argv[0] = prog\nGoodbye\n".to_vec());

    let own = inherited.failures(FailureInjection::default().at(1));
    let report = run_case(&own, &config);
    let result = report.result.unwrap();
    assert_eq!(result.exit_status(), Some(255));
    assert_eq!(result.transcript.stdout(), b"argc = 1\n".to_vec());
}

#[test]
fn stderr_is_judged_only_when_expected() {
    let case = TestCase::new("warn", stderr_program());
    assert_eq!(run_case(&case, &Config::default()).verdict, Verdict::Pass);

    let case = case.expect_stderr("err");
    assert_eq!(run_case(&case, &Config::default()).verdict, Verdict::Pass);

    let case = case.expect_stderr("erx");
    assert_eq!(
        run_case(&case, &Config::default()).verdict,
        Verdict::Fail(Mismatch::Stderr {
            offset: 2,
            expected: Some(b'x'),
            actual: Some(b'r'),
        })
    );
}

#[test]
fn manifest_reads_expected_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::from_json(
        r#"{"cases": [{"name": "w", "image": "w.bin", "expected_stderr": "err"}]}"#,
    )
    .unwrap();
    assert_eq!(
        manifest.cases[0].expected_stderr,
        Some(ByteSource::Text("err".into()))
    );

    std::fs::write(dir.path().join("w.sim"), stderr_program().to_bytes()).unwrap();
    let manifest = Manifest::from_json(
        r#"{"cases": [{"name": "w", "image": "w.sim", "expected_stderr": "err"}]}"#,
    )
    .unwrap();
    let report = run_suite(&manifest.resolve(dir.path()), &Config::default(), 1);
    assert_eq!(report.cases[0].verdict, Verdict::Pass);
}

#[test]
fn case_report_lines() {
    let pass = CaseReport {
        name: "ok".into(),
        verdict: Verdict::Pass,
        result: None,
    };
    assert_eq!(pass.to_string(), "PASS     ok");

    let fail = CaseReport {
        name: "wrong-exit".into(),
        verdict: Verdict::Fail(Mismatch::ExitStatus {
            expected: 0,
            actual: 7,
        }),
        result: None,
    };
    assert_eq!(fail.to_string(), "FAIL     wrong-exit: exit status 7, expected 0");

    let timeout = CaseReport {
        name: "spin".into(),
        verdict: Verdict::Timeout { steps: 5000 },
        result: None,
    };
    assert_eq!(
        timeout.to_string(),
        "TIMEOUT  spin: step budget exhausted after 5000 steps"
    );

    let lost = CaseReport {
        name: "lost".into(),
        verdict: Verdict::Error(Error::WorkerStopped),
        result: None,
    };
    assert_eq!(
        lost.to_string(),
        "ERROR    lost: worker thread stopped before running this case"
    );
}

#[test]
fn output_comparison_finds_the_first_divergence() {
    assert_eq!(compare_output(b"abc", b"abc"), None);
    assert_eq!(
        compare_output(b"abc", b"abx"),
        Some(Mismatch::Output {
            offset: 2,
            expected: Some(b'c'),
            actual: Some(b'x'),
        })
    );
    assert_eq!(
        compare_output(b"abc", b"ab"),
        Some(Mismatch::Output {
            offset: 2,
            expected: Some(b'c'),
            actual: None,
        })
    );
    assert_eq!(
        compare_output(b"", b"z"),
        Some(Mismatch::Output {
            offset: 0,
            expected: None,
            actual: Some(b'z'),
        })
    );
}
