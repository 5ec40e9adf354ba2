// Copyright 2018 Peter Williams <peter@newton.cx>
// Licensed under the MIT License.

//! The main CLI driver logic.

extern crate chrono;
extern crate condor;
extern crate env_logger;
#[macro_use] extern crate failure;
extern crate itertools;
#[macro_use] extern crate log;
#[macro_use] extern crate structopt;
extern crate tabled;
extern crate termcolor;
extern crate users;

#[cfg(test)] extern crate tempfile;

use condor::Schedd;
use condor::userprio::{self, PriorityMap};
use failure::Error;
use std::process;
use structopt::StructOpt;

#[macro_use] mod colorio;
mod config;
mod logging;
mod names;
mod stats;
mod table;
mod usage;

use colorio::ColorIo;
use config::Config;
use names::Pinky;
use stats::MachineClass;
use table::TableFormatter;
use usage::UsageLog;


const BANNER: &str = "HTCondor Job Stats";


#[derive(Debug, StructOpt)]
#[structopt(name = "condorstat", about = "Display HTCondor job stats.")]
struct CondorStatCli {
    #[structopt(long = "priority")]
    /// Display user priorities.
    priority: bool,

    #[structopt(long = "only", possible_values = &["cpu", "gpu"], case_insensitive = true)]
    /// Filter jobs by machine type (CPU or GPU).
    only: Option<MachineClass>,

    #[structopt(short = "v", long = "verbose")]
    /// Log what the tool is doing to standard error.
    verbose: bool,
}

impl CondorStatCli {
    fn cli(self, cio: &mut ColorIo) -> Result<i32, Error> {
        let config = Config::from_env();
        debug!("configuration: {:?}", config);
        cprintln!(cio, hl, "{}", BANNER);

        let username = current_username()?;
        let names = Pinky::with_program(config.pinky.clone());

        let priorities = if self.priority {
            userprio::query_priorities(&config.condor_userprio)?
        } else {
            PriorityMap::new()
        };

        match config.usage_log_path() {
            Ok(path) => UsageLog::new(path).log(&username, &names),
            Err(e) => warn!("not recording usage: {}", e),
        }

        let schedd = Schedd::with_program(config.condor_q.clone());
        let user_stats = stats::fetch_jobs(&schedd, self.only)?;

        let formatter = TableFormatter {
            names: &names,
            priorities: &priorities,
            show_priority: self.priority,
            only: self.only,
            current_user: &username,
            color: cio.stdout_has_color(),
        };

        let table = formatter.format(&user_stats)?;
        cprintln!(cio, pl, "{}", table);
        Ok(0)
    }
}


fn current_username() -> Result<String, Error> {
    match users::get_current_username() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => Err(format_err!("cannot determine the name of the current user")),
    }
}


fn main() {
    let program = CondorStatCli::from_args();
    logging::init(program.verbose);

    let mut cio = ColorIo::new();

    process::exit(match program.cli(&mut cio) {
        Ok(code) => code,

        Err(e) => {
            cio.print_error(e);
            1
        },
    });
}
