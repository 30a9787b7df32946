//! Process exit codes of the `ned` binary.
//!
//! Codes below 10 are study outcomes, 10..20 are problems the user can fix
//! (arguments, configuration, trace store) and 20 and above are internal.

/// Exit status of a `ned` invocation. The numeric values are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every system and lambda produced an estimate.
    Clean = 0,
    /// A report was written but at least one system or lambda failed.
    PartialFail = 3,

    ArgsError = 10,
    ConfigError = 11,
    /// The trace store could not be opened or queried.
    SourceError = 12,

    /// A bug; worth reporting.
    InternalError = 20,
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Symbolic name used in JSON error payloads.
    pub fn code_name(self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::SourceError => "ERR_SOURCE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<&ned_common::Error> for ExitCode {
    fn from(err: &ned_common::Error) -> Self {
        use ned_common::ErrorCategory;
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Source => ExitCode::SourceError,
            ErrorCategory::Io => ExitCode::IoError,
            ErrorCategory::Trace | ErrorCategory::Estimation => ExitCode::InternalError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
