// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Interface to the HTCondor cluster job manager.

HTCondor's client library only speaks C++ and Python, so this crate talks to
a pool through the command-line tools that ship with it. Each tool is found
on `$PATH` under its usual name unless the caller supplies another program
path, which is also how the tests substitute fake tools.

*/

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
extern crate serde;
#[macro_use] extern crate serde_derive;
extern crate serde_json;

use failure::{Error, ResultExt};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::process::{Command, Output};

pub mod userprio;


/// A job cluster number.
pub type ClusterId = i64;

/// A process number within a job cluster.
pub type ProcId = i64;

/// The job ClassAd attributes that we ask the schedd for.
pub const JOB_ATTRIBUTES: &[&str] = &[
    "ClusterId", "ProcId", "Owner", "JobStatus", "RemoteHost", "RequestGPUs",
];


/// The lifecycle state of a job, as encoded in its `JobStatus` attribute.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum JobStatus {
    Idle,
    Running,
    Removed,
    Completed,
    Held,
    TransferringOutput,
    Suspended,

    /// Any code that HTCondor did not document when this was written.
    Unknown,
}

impl JobStatus {
    /// Every status, in `JobStatus` code order with `Unknown` last.
    pub const ALL: [JobStatus; 8] = [
        JobStatus::Idle,
        JobStatus::Running,
        JobStatus::Removed,
        JobStatus::Completed,
        JobStatus::Held,
        JobStatus::TransferringOutput,
        JobStatus::Suspended,
        JobStatus::Unknown,
    ];

    /// Map a numeric `JobStatus` code onto a status.
    pub fn from_code(code: i64) -> JobStatus {
        match code {
            1 => JobStatus::Idle,
            2 => JobStatus::Running,
            3 => JobStatus::Removed,
            4 => JobStatus::Completed,
            5 => JobStatus::Held,
            6 => JobStatus::TransferringOutput,
            7 => JobStatus::Suspended,
            _ => JobStatus::Unknown,
        }
    }

    /// The human-readable name of this status.
    pub fn label(&self) -> &'static str {
        match *self {
            JobStatus::Idle => "Idle",
            JobStatus::Running => "Running",
            JobStatus::Removed => "Removed",
            JobStatus::Completed => "Completed",
            JobStatus::Held => "Held",
            JobStatus::TransferringOutput => "Transferring Output",
            JobStatus::Suspended => "Suspended",
            JobStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}


/// One job in the schedd's queue, reduced to the attributes in
/// [`JOB_ATTRIBUTES`](constant.JOB_ATTRIBUTES.html).
///
/// `Owner` is mandatory: an ad without one fails to decode. A missing
/// `JobStatus` decodes as code zero, and a missing or unevaluated
/// `RequestGPUs` as zero GPUs.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JobRecord {
    #[serde(rename = "ClusterId")]
    pub cluster_id: ClusterId,

    #[serde(rename = "ProcId")]
    pub process_id: ProcId,

    #[serde(rename = "Owner")]
    pub owner: String,

    #[serde(rename = "JobStatus", default)]
    pub status_code: i64,

    /// The slot the job is running in; absent for jobs that are not running.
    #[serde(rename = "RemoteHost", default)]
    pub remote_host: Option<String>,

    #[serde(rename = "RequestGPUs", default, deserialize_with = "lenient_count")]
    pub requested_gpus: i64,
}

impl JobRecord {
    /// Get this job's lifecycle status.
    pub fn status(&self) -> JobStatus {
        JobStatus::from_code(self.status_code)
    }

    /// Get this job's ID in the usual `cluster.proc` notation.
    pub fn job_id(&self) -> String {
        format!("{}.{}", self.cluster_id, self.process_id)
    }
}

/// `RequestGPUs` may be an expression that the schedd leaves unevaluated, in
/// which case the JSON carries a string rather than a number.
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where D: Deserializer<'de>
{
    let value = serde_json::Value::deserialize(deserializer)?;

    Ok(match value {
        serde_json::Value::Number(ref n) => n.as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    })
}


/// Something that can list the jobs currently in a queue.
pub trait JobQuery {
    fn query_jobs(&self) -> Result<Vec<JobRecord>, Error>;
}


/// A handle on the local schedd, queried through `condor_q`.
#[derive(Clone, Debug)]
pub struct Schedd {
    condor_q: String,
}

impl Schedd {
    /// Query the local schedd with the `condor_q` found on `$PATH`.
    pub fn new() -> Self {
        Schedd::with_program("condor_q")
    }

    /// Query the local schedd with a specific `condor_q` program.
    pub fn with_program<S: Into<String>>(condor_q: S) -> Self {
        Schedd { condor_q: condor_q.into() }
    }
}

impl Default for Schedd {
    fn default() -> Self {
        Schedd::new()
    }
}

impl JobQuery for Schedd {
    fn query_jobs(&self) -> Result<Vec<JobRecord>, Error> {
        let projection = JOB_ATTRIBUTES.join(",");
        let output = run_tool(&self.condor_q, &["-allusers", "-json", "-attributes", &projection])?;

        if !output.status.success() {
            return Err(format_err!(
                "`{}` failed ({}): {}", self.condor_q, output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let text = String::from_utf8(output.stdout)
            .with_context(|_| format!("`{}` printed invalid UTF-8", self.condor_q))?;
        parse_job_ads(&text)
    }
}


/// Decode the output of `condor_q -json`.
///
/// An empty queue makes `condor_q` print nothing at all rather than an empty
/// JSON array, so blank input decodes to no jobs.
pub fn parse_job_ads(text: &str) -> Result<Vec<JobRecord>, Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let jobs = serde_json::from_str(text).context("could not decode the job ClassAds")?;
    Ok(jobs)
}


/// Run one of the HTCondor command-line tools to completion, capturing its
/// output. Failing to launch the program at all is an error; its exit status
/// is left for the caller to judge.
pub fn run_tool(program: &str, args: &[&str]) -> Result<Output, Error> {
    debug!("running `{} {}`", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|_| format!("failed to launch `{}`", program))?;

    Ok(output)
}
