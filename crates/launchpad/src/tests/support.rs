//! Test doubles that record sequencing events on a shared timeline.
//!
//! The reporter, launcher and probe all write to the same [`Timeline`], so
//! tests can assert the relative order of readiness probes, phase changes and
//! the launch itself.

use std::cell::Cell;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use launchpad_config::{EntryTarget, LaunchMode, ReadinessTarget};

use crate::errors::{FailureKind, SequencerError};
use crate::launch::{LaunchFailure, Launcher, PreparedCommand};
use crate::phase::{Phase, PhaseReporter};
use crate::readiness::Probe;

/// PID reported by [`RecordingLauncher`].
pub const FAKE_PID: u32 = 4242;

/// Observable events in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The sequencer entered a phase.
    Phase(Phase),
    /// A connection attempt was made.
    Probe(ReadinessTarget),
    /// A target accepted a connection after this many attempts.
    TargetReady(ReadinessTarget, u32),
    /// The reporter was told control is about to be transferred.
    Launching { kind: &'static str, mode: LaunchMode },
    /// The launcher was asked to start this command.
    Launched {
        program: String,
        args: Vec<String>,
        mode: LaunchMode,
    },
    /// The entry process is running.
    Running(u32),
    /// The sequence failed.
    Failed {
        phase: Phase,
        kind: FailureKind,
        exit_code: u8,
    },
}

/// Shared, ordered record of [`Event`]s.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Timeline {
    pub fn record(&self, event: Event) {
        self.events
            .lock()
            .expect("timeline mutex poisoned")
            .push(event);
    }

    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("timeline mutex poisoned").clone()
    }

    /// Phases entered, in order.
    pub fn phases(&self) -> Vec<Phase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Phase(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    /// Commands handed to the launcher.
    pub fn launches(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, Event::Launched { .. }))
            .collect()
    }

    /// Number of connection attempts made.
    pub fn probes(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Probe(_)))
            .count()
    }

    /// Position of the first event matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(predicate)
    }
}

/// Reporter that writes phase events to a [`Timeline`].
#[derive(Debug, Clone)]
pub struct RecordingPhaseReporter {
    timeline: Timeline,
}

impl RecordingPhaseReporter {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
        }
    }
}

impl PhaseReporter for RecordingPhaseReporter {
    fn phase_entered(&self, phase: Phase) {
        self.timeline.record(Event::Phase(phase));
    }

    fn target_ready(&self, target: &ReadinessTarget, attempts: u32) {
        self.timeline
            .record(Event::TargetReady(target.clone(), attempts));
    }

    fn launching(&self, entry: &EntryTarget, mode: LaunchMode) {
        self.timeline.record(Event::Launching {
            kind: entry.kind(),
            mode,
        });
    }

    fn running(&self, pid: u32, _mode: LaunchMode) {
        self.timeline.record(Event::Running(pid));
    }

    fn failed(&self, error: &SequencerError) {
        self.timeline.record(Event::Failed {
            phase: error.phase(),
            kind: error.kind(),
            exit_code: error.exit_code(),
        });
    }
}

/// Launcher that records the command instead of starting it.
#[derive(Debug)]
pub struct RecordingLauncher {
    timeline: Timeline,
    exit_code: u8,
    failure: Option<io::ErrorKind>,
    prepared: Mutex<Vec<PreparedCommand>>,
}

impl RecordingLauncher {
    /// A launcher whose entry process exits with `exit_code`.
    pub fn exiting_with(timeline: &Timeline, exit_code: u8) -> Self {
        Self {
            timeline: timeline.clone(),
            exit_code,
            failure: None,
            prepared: Mutex::new(Vec::new()),
        }
    }

    /// A launcher that fails as `exec` would with `kind`.
    pub fn failing(timeline: &Timeline, kind: io::ErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::exiting_with(timeline, 0)
        }
    }

    /// Commands received, including their environment.
    pub fn prepared(&self) -> Vec<PreparedCommand> {
        self.prepared
            .lock()
            .expect("launcher mutex poisoned")
            .clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(
        &self,
        command: &PreparedCommand,
        mode: LaunchMode,
        running: &dyn Fn(u32),
    ) -> Result<u8, LaunchFailure> {
        self.timeline.record(Event::Launched {
            program: command.program().to_owned(),
            args: command.args().to_vec(),
            mode,
        });
        self.prepared
            .lock()
            .expect("launcher mutex poisoned")
            .push(command.clone());
        if let Some(kind) = self.failure {
            return Err(LaunchFailure::from_exec(
                command.program(),
                io::Error::new(kind, "scripted failure"),
            ));
        }
        running(FAKE_PID);
        Ok(self.exit_code)
    }
}

/// Probe that refuses the first `failures` attempts, then accepts.
#[derive(Debug)]
pub struct ScriptedProbe {
    timeline: Timeline,
    failures: u32,
    calls: Cell<u32>,
}

impl ScriptedProbe {
    pub fn failing(timeline: &Timeline, failures: u32) -> Self {
        Self {
            timeline: timeline.clone(),
            failures,
            calls: Cell::new(0),
        }
    }

    pub fn never(timeline: &Timeline) -> Self {
        Self::failing(timeline, u32::MAX)
    }
}

impl Probe for ScriptedProbe {
    fn connect(&self, target: &ReadinessTarget, _timeout: Duration) -> io::Result<()> {
        self.timeline.record(Event::Probe(target.clone()));
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call > self.failures {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        }
    }
}
