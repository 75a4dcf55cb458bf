// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use clap::ArgMatches;
use std::io;

use crate::process::{walk_process, ProcessInfo};
use crate::record::ProcessRecord;

/// The filter configuration for one run, built once from the command line
/// and passed around by reference.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub pids: Vec<usize>,
    pub names: Vec<String>,
    pub users: Vec<String>,
    pub filters: Vec<String>,
    pub ignores: Vec<String>,
    pub json: bool,
}

impl Settings {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let strings = |id| {
            matches
                .get_many::<String>(id)
                .map(|it| it.cloned().collect())
                .unwrap_or_default()
        };

        Self {
            pids: matches
                .get_many::<usize>("pid")
                .map(|it| it.copied().collect())
                .unwrap_or_default(),
            names: strings("name"),
            users: strings("user"),
            filters: strings("filter"),
            ignores: strings("ignore"),
            json: matches.get_flag("json"),
        }
    }
}

/// How many records the scan emits for one candidate process.
///
/// The owner constraint is checked first and applies in every mode. Any
/// `--pid`/`--name` configuration puts the run in targeted mode: only the
/// PID and name lists are consulted, and a process matching both lists
/// emits two records. The substring rules only run when no targeting is
/// configured.
fn include_count(settings: &Settings, pid: usize, name: &str, username: &str) -> usize {
    if !settings.users.is_empty() && !settings.users.iter().any(|it| it == username) {
        return 0;
    }

    if !settings.pids.is_empty() || !settings.names.is_empty() {
        let mut count = 0;
        if settings.pids.contains(&pid) {
            count += 1;
        }
        if settings.names.iter().any(|it| it == name) {
            count += 1;
        }
        return count;
    }

    if !settings.filters.is_empty() && !settings.filters.iter().any(|it| name.contains(it)) {
        return 0;
    }

    if !settings.ignores.is_empty() && settings.ignores.iter().any(|it| name.contains(it)) {
        return 0;
    }

    1
}

fn materialize(info: &ProcessInfo) -> Result<ProcessRecord, io::Error> {
    Ok(ProcessRecord {
        pid: info.pid,
        name: info.name.clone(),
        command: info.cmdline(),
        env_vars: info.env_vars()?,
        username: info.username.clone(),
    })
}

/// One pass over the process table, in enumeration order.
///
/// A process whose environment block disappears mid-scan (anything beyond
/// the access-denied and zombie sentinels) is dropped; a single vanishing
/// process never aborts the run.
pub fn collect_records(settings: &Settings) -> Vec<ProcessRecord> {
    let mut records = Vec::new();

    for info in walk_process() {
        let count = include_count(settings, info.pid, &info.name, &info.username);
        if count == 0 {
            continue;
        }

        let Ok(record) = materialize(&info) else {
            continue;
        };
        for _ in 1..count {
            records.push(record.clone());
        }
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uu_app;
    use pretty_assertions::assert_eq;

    fn settings(args: &[&str]) -> Settings {
        let args = std::iter::once("penv").chain(args.iter().copied());
        Settings::from_matches(&uu_app().try_get_matches_from(args).unwrap())
    }

    fn selected_names(settings: &Settings, table: &[(usize, &str, &str)]) -> Vec<String> {
        let mut names = Vec::new();
        for (pid, name, username) in table {
            for _ in 0..include_count(settings, *pid, name, username) {
                names.push((*name).to_string());
            }
        }
        names
    }

    const TABLE: &[(usize, &str, &str)] = &[
        (1, "nginx", "root"),
        (2, "nginx-worker", "www-data"),
        (3, "sshd", "root"),
    ];

    #[test]
    fn test_no_constraints_selects_everything() {
        assert_eq!(
            selected_names(&settings(&[]), TABLE),
            vec!["nginx", "nginx-worker", "sshd"]
        );
    }

    #[test]
    fn test_filter_is_a_substring_match() {
        assert_eq!(
            selected_names(&settings(&["--filter", "nginx"]), TABLE),
            vec!["nginx", "nginx-worker"]
        );
    }

    #[test]
    fn test_filter_then_ignore() {
        assert_eq!(
            selected_names(
                &settings(&["--filter", "nginx", "--ignore", "worker"]),
                TABLE
            ),
            vec!["nginx"]
        );
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        assert!(selected_names(&settings(&["--filter", "NGINX"]), TABLE).is_empty());
    }

    #[test]
    fn test_any_of_several_filters_suffices() {
        assert_eq!(
            selected_names(&settings(&["--filter", "sshd", "--filter", "worker"]), TABLE),
            vec!["nginx-worker", "sshd"]
        );
    }

    #[test]
    fn test_name_is_an_exact_match() {
        assert_eq!(
            selected_names(&settings(&["--name", "nginx"]), TABLE),
            vec!["nginx"]
        );
    }

    #[test]
    fn test_targeting_disables_substring_rules() {
        // --ignore would drop both nginx processes, but with --pid present
        // the substring rules are not consulted at all.
        assert_eq!(
            selected_names(&settings(&["--pid", "1", "--ignore", "nginx"]), TABLE),
            vec!["nginx"]
        );
        // ...and --filter cannot rescue a process the targeting missed.
        assert_eq!(
            selected_names(&settings(&["--name", "sshd", "--filter", "nginx"]), TABLE),
            vec!["sshd"]
        );
    }

    #[test]
    fn test_user_constraint_applies_before_targeting() {
        assert!(selected_names(
            &settings(&["--user", "www-data", "--pid", "1"]),
            TABLE
        )
        .is_empty());
        assert_eq!(
            selected_names(&settings(&["--user", "root"]), TABLE),
            vec!["nginx", "sshd"]
        );
    }

    #[test]
    fn test_pid_and_name_double_match_emits_twice() {
        assert_eq!(
            selected_names(&settings(&["--pid", "3", "--name", "sshd"]), TABLE),
            vec!["sshd", "sshd"]
        );
    }

    #[test]
    fn test_repeatable_flags_accumulate() {
        let settings = settings(&["--pid", "1", "--pid", "3", "--name", "x"]);
        assert_eq!(settings.pids, vec![1, 3]);
        assert_eq!(settings.names, vec!["x"]);
        assert!(!settings.json);
    }

    #[test]
    fn test_malformed_pid_is_a_usage_error() {
        assert!(uu_app()
            .try_get_matches_from(["penv", "--pid", "not-a-pid"])
            .is_err());
    }
}
