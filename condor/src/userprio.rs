// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Fair-share user priorities, as reported by `condor_userprio`.

We ask `condor_userprio -allusers -priority` rather than the negotiator ads
because the negotiator leaves some users out. The tool only prints a
human-oriented table, so we scrape it: a fixed number of header and footer
lines are thrown away and each remaining line is expected to start with
`user@domain priority ...`. If HTCondor changes that layout, the parse in
`parse_userprio` is the one place that needs to follow.

*/

use failure::Error;
use std::collections::hash_map;
use std::collections::HashMap;
use std::iter::FromIterator;
use run_tool;


/// Lines of banner text that `condor_userprio` prints before the table.
pub const HEADER_LINES: usize = 4;

/// Pieces that trail the table: the summary rule, the totals line, and the
/// empty string after the final newline.
pub const FOOTER_LINES: usize = 3;

const MIN_FIELDS: usize = 3;


/// A mapping from username to effective user priority.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriorityMap(HashMap<String, f64>);

impl PriorityMap {
    pub fn new() -> Self {
        PriorityMap(HashMap::new())
    }

    pub fn insert<S: Into<String>>(&mut self, user: S, priority: f64) {
        self.0.insert(user.into(), priority);
    }

    /// Get the priority of a user, if `condor_userprio` listed them.
    pub fn get(&self, user: &str) -> Option<f64> {
        self.0.get(user).cloned()
    }

    /// Get the priority of a user, counting unlisted users as 0.
    pub fn priority(&self, user: &str) -> f64 {
        self.get(user).unwrap_or(0.)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<String, f64> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PriorityMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = PriorityMap::new();

        for (user, priority) in iter {
            map.insert(user, priority);
        }

        map
    }
}


/// Parse the text printed by `condor_userprio -allusers -priority`.
///
/// Lines with fewer than three fields, or whose priority is not a number,
/// are skipped.
pub fn parse_userprio(text: &str) -> PriorityMap {
    let pieces: Vec<&str> = text.split('\n').collect();
    let mut priorities = PriorityMap::new();

    if pieces.len() <= HEADER_LINES + FOOTER_LINES {
        return priorities;
    }

    for line in &pieces[HEADER_LINES..pieces.len() - FOOTER_LINES] {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() < MIN_FIELDS {
            continue;
        }

        let user = fields[0].split('@').next().unwrap_or(fields[0]);

        match fields[1].parse::<f64>() {
            Ok(p) => priorities.insert(user, p),
            Err(_) => debug!("ignoring userprio line with a non-numeric priority: {}", line.trim()),
        }
    }

    priorities
}


/// Run `condor_userprio` and parse what it prints.
///
/// The tool's exit status is not trusted either way: whatever table it
/// managed to print is used.
pub fn query_priorities(condor_userprio: &str) -> Result<PriorityMap, Error> {
    let output = run_tool(condor_userprio, &["-allusers", "-priority"])?;

    if !output.status.success() {
        warn!("`{}` exited with {}; using whatever it printed", condor_userprio, output.status);
    }

    Ok(parse_userprio(&String::from_utf8_lossy(&output.stdout)))
}
