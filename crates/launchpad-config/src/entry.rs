//! Entry process descriptions: the application command, the optional shim
//! interposed in front of it, and how control is handed over.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The command that ultimately runs the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LaunchSpec {
    /// Executable name or path, resolved through `PATH` when relative.
    pub program: String,
    /// Arguments passed after the program.
    #[serde(default)]
    pub args: Vec<String>,
}

impl LaunchSpec {
    /// Builds a launch spec from a program and its arguments.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits an argv vector into a launch spec; returns `None` when empty.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }
}

/// An intermediate entry process that receives control before the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IndirectionSpec {
    /// Shim executable, usually a shell.
    pub program: String,
    /// Shim arguments, usually the script path.
    #[serde(default)]
    pub args: Vec<String>,
}

impl IndirectionSpec {
    /// Builds an indirection spec from a program and its arguments.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// The process that receives control, resolved once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTarget {
    /// The application is the entry process.
    Direct(LaunchSpec),
    /// A shim is the entry process; the application is reachable only through it.
    Indirected {
        /// The shim that receives control.
        shim: IndirectionSpec,
        /// Application command handed to the shim as trailing arguments.
        app: Option<LaunchSpec>,
    },
}

impl EntryTarget {
    /// Resolves the entry target from the optional shim and application.
    ///
    /// Returns `None` when neither is configured.
    #[must_use]
    pub fn resolve(shim: Option<IndirectionSpec>, app: Option<LaunchSpec>) -> Option<Self> {
        match (shim, app) {
            (Some(shim), app) => Some(Self::Indirected { shim, app }),
            (None, Some(app)) => Some(Self::Direct(app)),
            (None, None) => None,
        }
    }

    /// Executable that receives control.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::Direct(app) => &app.program,
            Self::Indirected { shim, .. } => &shim.program,
        }
    }

    /// Arguments given to [`Self::program`].
    ///
    /// For an indirected target the application's argv follows the shim's own
    /// arguments, matching the `exec "$@"` convention of entrypoint scripts.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Self::Direct(app) => app.args.clone(),
            Self::Indirected { shim, app } => {
                let mut arguments = shim.args.clone();
                if let Some(app) = app {
                    arguments.push(app.program.clone());
                    arguments.extend(app.args.iter().cloned());
                }
                arguments
            }
        }
    }

    /// Full argv of the entry process, program first.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.program().to_owned()];
        argv.extend(self.arguments());
        argv
    }

    /// Returns true when a shim sits in front of the application.
    #[must_use]
    pub const fn is_indirected(&self) -> bool {
        matches!(self, Self::Indirected { .. })
    }

    /// Short label used in logs and plan output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Indirected { .. } => "indirected",
        }
    }
}

/// How control is transferred to the entry process.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LaunchMode {
    /// Replace the launcher's process image; no supervising parent remains.
    #[default]
    Replace,
    /// Spawn the target as a child, forward termination signals and return its
    /// exit code.
    Supervise,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> LaunchSpec {
        LaunchSpec::new("uv", ["run", "main.py"])
    }

    #[test]
    fn direct_target_runs_the_application() {
        let target = EntryTarget::resolve(None, Some(app())).expect("target resolves");
        assert_eq!(target.argv(), ["uv", "run", "main.py"]);
        assert!(!target.is_indirected());
    }

    #[test]
    fn shim_receives_control_and_application_follows_its_arguments() {
        let shim = IndirectionSpec::new("/bin/sh", ["/entrypoint.sh"]);
        let target = EntryTarget::resolve(Some(shim), Some(app())).expect("target resolves");
        assert_eq!(target.program(), "/bin/sh");
        assert_eq!(target.argv(), ["/bin/sh", "/entrypoint.sh", "uv", "run", "main.py"]);
        assert!(target.is_indirected());
    }

    #[test]
    fn shim_without_application_keeps_its_own_arguments() {
        let shim = IndirectionSpec::new("/bin/sh", ["/entrypoint.sh"]);
        let target = EntryTarget::resolve(Some(shim), None).expect("target resolves");
        assert_eq!(target.argv(), ["/bin/sh", "/entrypoint.sh"]);
    }

    #[test]
    fn nothing_configured_resolves_to_none() {
        assert!(EntryTarget::resolve(None, None).is_none());
    }

    #[test]
    fn argv_splitting_requires_a_program() {
        assert!(LaunchSpec::from_argv(&[]).is_none());
        let argv = vec![String::from("python"), String::from("app.py")];
        assert_eq!(
            LaunchSpec::from_argv(&argv),
            Some(LaunchSpec::new("python", ["app.py"]))
        );
    }

    #[test]
    fn launch_mode_parses_case_insensitively() {
        assert_eq!("SUPERVISE".parse::<LaunchMode>().ok(), Some(LaunchMode::Supervise));
        assert_eq!(LaunchMode::default().to_string(), "replace");
    }
}
