use std::fmt;

/// A malformed invocation of the flag grammar in §6 (of the design this
/// binary implements): bad numeric argument, unknown flag, missing value.
#[derive(Debug, Clone)]
pub struct CliError(pub String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CliError {}
