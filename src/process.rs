// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::path::PathBuf;
use std::{fs, io};
use uucore::entries::uid2usr;
use walkdir::{DirEntry, WalkDir};

use crate::record::{EnvError, EnvVars};

/// One currently visible process, read from its `/proc/<pid>` directory.
///
/// `pid`, `name` and `username` are read once at construction so that
/// selection can run without further I/O. The command line and the
/// environment block are fetched on demand, only for processes that were
/// actually selected.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: usize,
    pub name: String,
    pub username: String,

    run_state: Option<char>,
    path: PathBuf,
}

impl ProcessInfo {
    /// Try new with pid path such as `/proc/self`
    ///
    /// # Error
    ///
    /// If the `status` or `stat` file in path cannot be read or parsed,
    /// usually because the process exited mid-walk or a hidepid mount
    /// hides it. Callers are expected to skip such processes.
    ///
    /// - [The /proc Filesystem](https://docs.kernel.org/filesystems/proc.html#process-specific-subdirectories)
    pub fn try_new(value: PathBuf) -> Result<Self, io::Error> {
        let value = if value.is_symlink() {
            fs::read_link(value)?
        } else {
            value
        };

        let pid = value
            .iter()
            .next_back()
            .ok_or(io::ErrorKind::Other)?
            .to_str()
            .ok_or(io::ErrorKind::InvalidData)?
            .parse::<usize>()
            .map_err(|_| io::ErrorKind::InvalidData)?;

        let status = fs::read_to_string(value.join("status"))?;
        let stat = fs::read_to_string(value.join("stat"))?;

        let name = status_field(&status, "Name").ok_or(io::ErrorKind::InvalidData)?;
        let uid = status_field(&status, "Uid")
            .and_then(|it| it.split_whitespace().next().map(String::from))
            .ok_or(io::ErrorKind::InvalidData)?
            .parse::<u32>()
            .map_err(|_| io::ErrorKind::InvalidData)?;

        Ok(Self {
            pid,
            name,
            username: resolve_username(uid),
            run_state: run_state_char(&stat),
            path: value,
        })
    }

    pub fn from_pid(pid: usize) -> Result<Self, io::Error> {
        Self::try_new(PathBuf::from(format!("/proc/{}", pid)))
    }

    pub fn is_zombie(&self) -> bool {
        self.run_state == Some('Z')
    }

    /// The argv of the process, or `None` when the OS reports no command
    /// line at all. Kernel threads and zombies have an empty `cmdline`
    /// file; both collapse to `None`, as does a read failure.
    pub fn cmdline(&self) -> Option<Vec<String>> {
        let content = fs::read(self.path.join("cmdline")).ok()?;

        let args: Vec<String> = content
            .split(|it| *it == b'\0')
            .filter(|part| !part.is_empty())
            .map(|part| String::from_utf8_lossy(part).into_owned())
            .collect();

        if args.is_empty() {
            None
        } else {
            Some(args)
        }
    }

    /// The environment block of the process.
    ///
    /// Zombies and permission failures degrade into the [`EnvVars`]
    /// sentinel instead of an error; a readable but empty block is a
    /// legitimate empty mapping. Any other read failure is returned as-is
    /// and aborts only this one process, never the whole scan.
    pub fn env_vars(&self) -> Result<EnvVars, io::Error> {
        if self.is_zombie() {
            return Ok(EnvVars::Unavailable(EnvError::Zombie));
        }

        let content = match fs::read(self.path.join("environ")) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Ok(EnvVars::Unavailable(EnvError::AccessDenied));
            }
            Err(e) => return Err(e),
        };

        let mut pairs: Vec<(String, String)> = Vec::new();
        for entry in content.split(|it| *it == b'\0') {
            let entry = String::from_utf8_lossy(entry);
            if let Some((key, value)) = entry.split_once('=') {
                // Duplicate keys keep their first position, last value.
                match pairs.iter_mut().find(|(k, _)| k.as_str() == key) {
                    Some(pair) => pair.1 = value.to_string(),
                    None => pairs.push((key.to_string(), value.to_string())),
                }
            }
        }

        Ok(EnvVars::Values(pairs))
    }
}

impl TryFrom<DirEntry> for ProcessInfo {
    type Error = io::Error;

    fn try_from(value: DirEntry) -> Result<Self, Self::Error> {
        Self::try_new(value.into_path())
    }
}

fn status_field(status: &str, field: &str) -> Option<String> {
    status
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| *key == field)
        .map(|(_, value)| value.trim_start().to_string())
}

/// Third field of `/proc/<pid>/stat`; the comm in parentheses may itself
/// contain spaces and parentheses, so scan from the last `)`.
fn run_state_char(stat: &str) -> Option<char> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().next()?.chars().next()
}

fn resolve_username(uid: u32) -> String {
    // An unresolvable UID is reported numerically, not as an error.
    uid2usr(uid).unwrap_or_else(|_| uid.to_string())
}

/// Iterating pid in current system
pub fn walk_process() -> impl Iterator<Item = ProcessInfo> {
    WalkDir::new("/proc/")
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .flatten()
        .filter(|it| it.path().is_dir())
        .flat_map(ProcessInfo::try_from)
}
