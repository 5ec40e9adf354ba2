// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Look up the real names behind usernames.
 */

use std::process::{Command, Stdio};


const REAL_NAME_MARKER: &str = "In real life:";


/// Something that can turn a username into a person's name.
///
/// Lookups never fail: a user who cannot be found has the empty string as
/// their name.
pub trait NameLookup {
    fn real_name(&self, username: &str) -> String;
}


/// Names from the local user directory, via `pinky -l`.
#[derive(Clone, Debug)]
pub struct Pinky {
    program: String,
}

impl Pinky {
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Pinky { program: program.into() }
    }
}

impl Default for Pinky {
    fn default() -> Self {
        Pinky::with_program("pinky")
    }
}

impl NameLookup for Pinky {
    fn real_name(&self, username: &str) -> String {
        let result = Command::new(&self.program)
            .arg("-l")
            .arg(username)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match result {
            Ok(ref output) if output.status.success() => {
                parse_real_name(&String::from_utf8_lossy(&output.stdout)).unwrap_or_default()
            },

            Ok(output) => {
                debug!("`{} -l {}` exited with {}", self.program, username, output.status);
                String::new()
            },

            Err(e) => {
                debug!("failed to launch `{}`: {}", self.program, e);
                String::new()
            },
        }
    }
}


/// Pull the name out of the "In real life:" field of `pinky -l` output.
pub fn parse_real_name(text: &str) -> Option<String> {
    text.lines()
        .filter_map(|line| line.split(REAL_NAME_MARKER).nth(1))
        .map(|name| name.trim().to_owned())
        .next()
}
