//! Console I/O Channel Simulator.
//!
//! Replaces a live terminal with a deterministic channel. It provides:
//! 1. **Input:** A cursor over a finite input script; its end is an explicit, stable
//!    end-of-input marker.
//! 2. **Output:** An append-only transcript of `{step, stream, bytes}` events.
//! 3. **Failure injection:** Selected write calls fail and record nothing.
//!
//! Every event is stamped with the emulator step at which it happened. Wall-clock time is
//! never observed, so two runs of the same case produce identical transcripts.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::config::ConsoleConfig;

/// Output stream selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stream {
    /// File descriptor 1.
    Stdout,
    /// File descriptor 2.
    Stderr,
}

/// One successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputEvent {
    /// Emulator step of the write.
    pub step: u64,
    /// Destination stream.
    pub stream: Stream,
    /// Bytes written.
    pub bytes: Vec<u8>,
}

/// One consumed input byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputEvent {
    /// Emulator step of the read.
    pub step: u64,
    /// The byte delivered to the program.
    pub byte: u8,
}

/// Result of reading one input position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputByte {
    /// A scripted byte.
    Byte(u8),
    /// The script is exhausted.
    EndOfInput,
}

impl InputByte {
    /// The C `int` a `getchar` call returns: `0..=255`, or `-1` at end of input.
    pub fn as_c_int(self) -> i16 {
        match self {
            Self::Byte(b) => i16::from(b),
            Self::EndOfInput => crate::isa::abi::EOF,
        }
    }
}

/// Ordered record of everything a run wrote and read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    outputs: Vec<OutputEvent>,
    inputs: Vec<InputEvent>,
}

impl Transcript {
    /// All output events in write order.
    pub fn outputs(&self) -> &[OutputEvent] {
        &self.outputs
    }

    /// All input events in read order.
    pub fn inputs(&self) -> &[InputEvent] {
        &self.inputs
    }

    /// Concatenated bytes written to `stream`.
    pub fn stream(&self, stream: Stream) -> Vec<u8> {
        self.outputs
            .iter()
            .filter(|e| e.stream == stream)
            .flat_map(|e| e.bytes.iter().copied())
            .collect()
    }

    /// Concatenated standard output.
    pub fn stdout(&self) -> Vec<u8> {
        self.stream(Stream::Stdout)
    }

    /// Concatenated standard error.
    pub fn stderr(&self) -> Vec<u8> {
        self.stream(Stream::Stderr)
    }

    /// Input bytes actually consumed by the program.
    pub fn consumed(&self) -> Vec<u8> {
        self.inputs.iter().map(|e| e.byte).collect()
    }
}

/// Finite scripted input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputScript {
    bytes: Vec<u8>,
}

impl InputScript {
    /// Creates a script from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The scripted bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of scripted bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a script with no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for InputScript {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for InputScript {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for InputScript {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

/// Selects which write calls fail.
///
/// Write calls are numbered from zero in issue order, across both streams and including
/// calls that themselves failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureInjection {
    calls: BTreeSet<usize>,
    from: Option<usize>,
}

impl FailureInjection {
    /// Fails the write call with index `call`.
    #[must_use]
    pub fn at(mut self, call: usize) -> Self {
        let _ = self.calls.insert(call);
        self
    }

    /// Fails every write call from index `call` on.
    #[must_use]
    pub fn starting_at(mut self, call: usize) -> Self {
        self.from = Some(self.from.map_or(call, |f| f.min(call)));
        self
    }

    /// True if the write call with index `call` must fail.
    pub fn should_fail(&self, call: usize) -> bool {
        self.calls.contains(&call) || self.from.is_some_and(|f| call >= f)
    }

    /// True if no write ever fails.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.from.is_none()
    }
}

impl From<&ConsoleConfig> for FailureInjection {
    fn from(config: &ConsoleConfig) -> Self {
        let mut failures = config
            .fail_writes
            .iter()
            .fold(Self::default(), |f, &call| f.at(call));
        if let Some(from) = config.fail_writes_from {
            failures = failures.starting_at(from);
        }
        failures
    }
}

/// An injected write failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("write call {call_index} failed")]
pub struct WriteError {
    /// Index of the failed call.
    pub call_index: usize,
}

/// Scripted console shared by every shim of one run.
#[derive(Clone, Debug, Default)]
pub struct Console {
    script: InputScript,
    cursor: usize,
    failures: FailureInjection,
    write_calls: usize,
    transcript: Transcript,
}

impl Console {
    /// Creates a console over `script` with the given failure injection.
    pub fn new(script: InputScript, failures: FailureInjection) -> Self {
        Self {
            script,
            cursor: 0,
            failures,
            write_calls: 0,
            transcript: Transcript::default(),
        }
    }

    /// Delivers the next input byte and advances, or reports end of input.
    ///
    /// At end of input nothing is recorded and the cursor stays put, so every later call
    /// reports end of input again.
    pub fn consume(&mut self, step: u64) -> InputByte {
        match self.script.as_bytes().get(self.cursor) {
            Some(&byte) => {
                self.cursor += 1;
                self.transcript.inputs.push(InputEvent { step, byte });
                InputByte::Byte(byte)
            }
            None => InputByte::EndOfInput,
        }
    }

    /// Returns the next input byte without consuming it.
    pub fn peek(&self) -> InputByte {
        self.script
            .as_bytes()
            .get(self.cursor)
            .map_or(InputByte::EndOfInput, |&b| InputByte::Byte(b))
    }

    /// Input bytes not yet consumed.
    pub fn remaining(&self) -> &[u8] {
        &self.script.as_bytes()[self.cursor..]
    }

    /// Appends `bytes` to `stream` as a single event.
    ///
    /// # Returns
    ///
    /// The number of bytes written, or `WriteError` if failure injection targets this call.
    /// A failed call records nothing. An empty write succeeds without recording an event.
    pub fn write(&mut self, step: u64, stream: Stream, bytes: &[u8]) -> Result<usize, WriteError> {
        let call_index = self.write_calls;
        self.write_calls += 1;
        if self.failures.should_fail(call_index) {
            tracing::warn!(call_index, ?stream, len = bytes.len(), "injected write failure");
            return Err(WriteError { call_index });
        }
        if !bytes.is_empty() {
            self.transcript.outputs.push(OutputEvent {
                step,
                stream,
                bytes: bytes.to_vec(),
            });
        }
        Ok(bytes.len())
    }

    /// Number of write calls issued so far.
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// The transcript recorded so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consumes the console and returns its transcript.
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}
