// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Lay out the per-user tallies as a table.

Each user gets one row. Every machine-class column holds a small stack of
`Status: count` lines for the statuses people actually care about, and a
final row sums those columns across all users. The row of whoever ran the
command is highlighted so they can find themselves.

*/

use colorio::{self, Style};
use condor::JobStatus;
use condor::userprio::PriorityMap;
use failure::{Error, Fail};
use itertools::Itertools;
use names::NameLookup;
use stats::{Bucket, MachineClass, MachineStats, StatusCounts, UserStats};
use std::fmt;
use tabled::builder::Builder;
use tabled::settings::Style as GridStyle;


/// The statuses listed in each cell, in order.
pub const STATUSES_TO_PRINT: [JobStatus; 3] = [JobStatus::Running, JobStatus::Idle, JobStatus::Held];

/// Shown as the priority of users that `condor_userprio` did not list.
pub const MISSING_PRIORITY: f64 = -1.;

const TOTAL_LABEL: &str = "Total";


/// There is nothing to tabulate.
#[derive(Debug)]
pub struct NoJobsError;

impl fmt::Display for NoJobsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("no jobs found in current schedd")
    }
}

impl Fail for NoJobsError {}


/// The column headings for a table.
pub fn headers(show_priority: bool, only: Option<MachineClass>) -> Vec<&'static str> {
    let mut headers = vec!["User", "Name"];

    if show_priority {
        headers.push("Priority");
    }

    headers.extend(buckets(only).iter().map(|b| b.label()));
    headers
}


/// The tallies shown, one column each. A filtered table only has the
/// filtered class, since that column already is the total.
pub fn buckets(only: Option<MachineClass>) -> Vec<Bucket> {
    match only {
        Some(class) => vec![Bucket::from(class)],
        None => vec![Bucket::Cpu, Bucket::Gpu, Bucket::Total],
    }
}


/// The text of one tally cell.
pub fn stats_cell(counts: &StatusCounts) -> String {
    let mut lines: Vec<String> = STATUSES_TO_PRINT.iter()
        .map(|s| format!("{}: {}", s, counts.get(*s)))
        .collect();
    lines.push(format!("{}: {}", TOTAL_LABEL, counts.sum_of(&STATUSES_TO_PRINT)));
    lines.join("\n")
}


/// Everything that shapes a table apart from the tallies themselves.
pub struct TableFormatter<'a> {
    pub names: &'a dyn NameLookup,
    pub priorities: &'a PriorityMap,
    pub show_priority: bool,
    pub only: Option<MachineClass>,

    /// The user whose row is highlighted.
    pub current_user: &'a str,

    /// Whether cells may carry ANSI color codes.
    pub color: bool,
}

impl<'a> TableFormatter<'a> {
    fn paint(&self, style: Style, text: &str) -> String {
        if !self.color {
            return text.to_owned();
        }

        // Line by line, so that the escapes never span the table's borders.
        text.split('\n').map(|line| colorio::paint(style, line)).join("\n")
    }

    /// The row for one user, before any highlighting.
    pub fn user_row(&self, user: &str, stats: &MachineStats) -> Vec<String> {
        let mut row = vec![user.to_owned(), self.names.real_name(user)];

        if self.show_priority {
            let priority = self.priorities.get(user).unwrap_or(MISSING_PRIORITY);
            row.push(priority.to_string());
        }

        for bucket in buckets(self.only) {
            row.push(stats_cell(stats.get(bucket)));
        }

        row
    }

    /// Highlight `row` if it belongs to the current user.
    pub fn highlight_row(&self, user: &str, row: Vec<String>) -> Vec<String> {
        if user != self.current_user {
            return row;
        }

        row.iter().map(|cell| self.paint(Style::Green, cell)).collect()
    }

    /// The row of sums over all users.
    pub fn totals_row(&self, user_stats: &UserStats) -> Result<Vec<String>, Error> {
        if user_stats.is_empty() {
            return Err(NoJobsError.into());
        }

        let mut row = vec![self.paint(Style::Red, TOTAL_LABEL), String::new()];

        if self.show_priority {
            row.push(String::new());
        }

        for bucket in buckets(self.only) {
            let mut sums = StatusCounts::default();

            for (_, stats) in user_stats.iter() {
                sums += *stats.get(bucket);
            }

            row.push(self.paint(Style::Red, &stats_cell(&sums)));
        }

        Ok(row)
    }

    /// All the rows of the table as text, headings first and sums last.
    pub fn grid(&self, user_stats: &UserStats) -> Result<Vec<Vec<String>>, Error> {
        let totals = self.totals_row(user_stats)?;

        let mut rows: Vec<Vec<String>> = vec![
            headers(self.show_priority, self.only).into_iter().map(|h| h.to_owned()).collect(),
        ];

        for (user, stats) in user_stats.ranked() {
            let row = self.user_row(user, stats);
            rows.push(self.highlight_row(user, row));
        }

        rows.push(totals);
        Ok(rows)
    }

    /// Render the table for printing.
    ///
    /// Fails with `NoJobsError` if there are no tallies, rather than
    /// printing a table with nothing to sum.
    pub fn format(&self, user_stats: &UserStats) -> Result<String, Error> {
        let mut builder = Builder::default();

        for row in self.grid(user_stats)? {
            builder.push_record(row);
        }

        let mut table = builder.build();
        table.with(GridStyle::ascii());
        Ok(table.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use stats::aggregate;
    use stats::tests::sample_jobs;
    use std::collections::HashMap;

    struct Directory(HashMap<&'static str, &'static str>);

    impl NameLookup for Directory {
        fn real_name(&self, username: &str) -> String {
            self.0.get(username).map(|n| n.to_string()).unwrap_or_default()
        }
    }

    fn directory() -> Directory {
        Directory(vec![("test_user0", "Test User Zero")].into_iter().collect())
    }

    fn priorities() -> PriorityMap {
        vec![("test_user0", 1.0), ("test_user1", 2.5)].into_iter().collect()
    }

    fn formatter<'a>(names: &'a Directory, prios: &'a PriorityMap, show_priority: bool,
                     only: Option<MachineClass>) -> TableFormatter<'a> {
        TableFormatter {
            names,
            priorities: prios,
            show_priority,
            only,
            current_user: "test_user0",
            color: true,
        }
    }

    #[test]
    fn header_sets() {
        assert_eq!(headers(false, None), vec!["User", "Name", "CPU", "GPU", "Total"]);
        assert_eq!(headers(true, None), vec!["User", "Name", "Priority", "CPU", "GPU", "Total"]);
        assert_eq!(headers(false, Some(MachineClass::Cpu)), vec!["User", "Name", "CPU"]);
        assert_eq!(headers(true, Some(MachineClass::Gpu)), vec!["User", "Name", "Priority", "GPU"]);
    }

    #[test]
    fn cell_counts_printed_statuses_only() {
        let counts = StatusCounts { running: 1, idle: 2, held: 3, completed: 7, ..StatusCounts::default() };
        assert_eq!(stats_cell(&counts), "Running: 1\nIdle: 2\nHeld: 3\nTotal: 6");
    }

    #[test]
    fn user_rows() {
        let names = directory();
        let prios = priorities();
        let stats = aggregate(&sample_jobs(), None);
        let user0 = stats.get("test_user0").unwrap();

        let row = formatter(&names, &prios, false, None).user_row("test_user0", user0);
        assert_eq!(row, vec![
            "test_user0".to_owned(),
            "Test User Zero".to_owned(),
            "Running: 1\nIdle: 1\nHeld: 1\nTotal: 3".to_owned(),
            "Running: 0\nIdle: 0\nHeld: 1\nTotal: 1".to_owned(),
            "Running: 1\nIdle: 1\nHeld: 2\nTotal: 4".to_owned(),
        ]);

        let row = formatter(&names, &prios, true, Some(MachineClass::Gpu)).user_row("test_user0", user0);
        assert_eq!(row.len(), 4);
        assert_eq!(row[2], "1");
        assert_eq!(row[3], "Running: 0\nIdle: 0\nHeld: 1\nTotal: 1");
    }

    #[test]
    fn missing_priority_and_name() {
        let names = directory();
        let prios = PriorityMap::new();
        let stats = aggregate(&sample_jobs(), None);

        let row = formatter(&names, &prios, true, None).user_row("test_user1", stats.get("test_user1").unwrap());
        assert_eq!(row[1], "");
        assert_eq!(row[2], "-1");
    }

    #[test]
    fn totals() {
        let names = directory();
        let prios = priorities();
        let stats = aggregate(&sample_jobs(), None);
        let mut fmt = formatter(&names, &prios, true, None);
        fmt.color = false;

        let row = fmt.totals_row(&stats).unwrap();
        assert_eq!(row, vec![
            "Total".to_owned(),
            String::new(),
            String::new(),
            "Running: 1\nIdle: 1\nHeld: 1\nTotal: 3".to_owned(),
            "Running: 1\nIdle: 1\nHeld: 1\nTotal: 3".to_owned(),
            "Running: 2\nIdle: 2\nHeld: 2\nTotal: 6".to_owned(),
        ]);

        fmt.color = true;
        let painted = fmt.totals_row(&stats).unwrap();
        assert_ne!(painted[0], "Total");
        assert!(painted[0].contains("Total"));
        assert_eq!(painted[3].lines().count(), 4);
    }

    #[test]
    fn grid_shape() {
        let names = directory();
        let prios = priorities();

        for &show_priority in &[false, true] {
            for &only in &[None, Some(MachineClass::Cpu)] {
                let stats = aggregate(&sample_jobs(), only);
                let grid = formatter(&names, &prios, show_priority, only).grid(&stats).unwrap();
                let width = headers(show_priority, only).len();

                assert_eq!(grid.len(), stats.len() + 2);
                assert!(grid.iter().all(|row| row.len() == width));
                assert_eq!(grid[0].contains(&"Priority".to_owned()), show_priority);
                assert_eq!(grid[0].contains(&"GPU".to_owned()), only.is_none());
            }
        }
    }

    #[test]
    fn highlights_current_user_only() {
        let names = directory();
        let prios = priorities();
        let stats = aggregate(&sample_jobs(), None);
        let fmt = formatter(&names, &prios, false, None);

        let plain0 = fmt.user_row("test_user0", stats.get("test_user0").unwrap());
        let lit0 = fmt.highlight_row("test_user0", plain0.clone());
        assert_ne!(lit0, plain0);
        assert_eq!(lit0[0], colorio::paint(Style::Green, "test_user0"));
        assert_eq!(lit0[2].lines().count(), 4);

        let plain1 = fmt.user_row("test_user1", stats.get("test_user1").unwrap());
        assert_eq!(fmt.highlight_row("test_user1", plain1.clone()), plain1);
    }

    #[test]
    fn no_color_no_highlight() {
        let names = directory();
        let prios = priorities();
        let stats = aggregate(&sample_jobs(), None);
        let mut fmt = formatter(&names, &prios, false, None);
        fmt.color = false;

        let plain0 = fmt.user_row("test_user0", stats.get("test_user0").unwrap());
        assert_eq!(fmt.highlight_row("test_user0", plain0.clone()), plain0);
    }

    #[test]
    fn rendered_table() {
        let names = directory();
        let prios = priorities();
        let stats = aggregate(&sample_jobs(), None);
        let mut fmt = formatter(&names, &prios, true, None);
        fmt.color = false;

        let text = fmt.format(&stats).unwrap();
        assert!(text.starts_with('+'));
        assert!(text.contains("| User"));
        assert!(text.contains("| Priority"));
        assert!(text.contains("Test User Zero"));
        assert!(text.contains("Held: 2"));
        assert!(text.find("test_user0").unwrap() < text.find("test_user1").unwrap());
    }

    #[test]
    fn empty_stats_fail() {
        let names = directory();
        let prios = priorities();
        let fmt = formatter(&names, &prios, false, None);

        let err = fmt.format(&UserStats::default()).unwrap_err();
        assert!(err.downcast_ref::<NoJobsError>().is_some());
        assert!(fmt.grid(&UserStats::default()).is_err());
    }
}
