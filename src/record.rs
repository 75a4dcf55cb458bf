// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

const INDENT: &str = "  ";

/// Why an environment block could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvError {
    AccessDenied,
    Zombie,
}

impl EnvError {
    fn as_str(self) -> &'static str {
        match self {
            Self::AccessDenied => "access denied",
            Self::Zombie => "zombie process",
        }
    }
}

impl Display for EnvError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The environment block of a process.
///
/// An empty `Values` is a real observation (the process has no environment
/// variables) and must stay distinct from `Unavailable`, which stands for a
/// block the kernel refused to hand out. Entries keep the order in which
/// the kernel reported them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvVars {
    Values(Vec<(String, String)>),
    Unavailable(EnvError),
}

// The unavailable state only takes its `{"env_vars_error": "..."}` wire
// shape here, at the serialization boundary. Nothing else in the crate
// sniffs for the magic key.
impl Serialize for EnvVars {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Values(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Unavailable(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("env_vars_error", reason.as_str())?;
                map.end()
            }
        }
    }
}

/// One snapshot of one process, materialized at the moment the process
/// passed selection. `command` is `None` when the OS reported no command
/// line at all (kernel threads, zombies).
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRecord {
    pub pid: usize,
    pub name: String,
    pub command: Option<Vec<String>>,
    pub env_vars: EnvVars,
    pub username: String,
}

impl Display for ProcessRecord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Process: {} {} ({})", self.pid, self.name, self.username)?;

        write!(f, "\nCommand:")?;
        match &self.command {
            Some(args) => {
                for arg in args {
                    write!(f, "\n{INDENT}{arg}")?;
                }
            }
            None => write!(f, " None")?,
        }

        write!(f, "\nEnvironment Variables:")?;
        match &self.env_vars {
            EnvVars::Values(pairs) if pairs.is_empty() => write!(f, " None"),
            EnvVars::Values(pairs) => {
                for (key, value) in pairs {
                    write!(f, "\n{INDENT}{key}={value}")?;
                }
                Ok(())
            }
            EnvVars::Unavailable(reason) => write!(f, " None ({reason})"),
        }
    }
}
