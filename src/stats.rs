// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Tally the jobs in the queue by owner, machine class, and status.
 */

use condor::{JobQuery, JobRecord, JobStatus};
use failure::Error;
use itertools::Itertools;
use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;


/// Slots whose name contains this (ignoring case) are GPU slots.
const GPU_MARKER: &str = "gpu";


/// The kind of machine that a job runs on, or is waiting for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MachineClass {
    Cpu,
    Gpu,
}

impl MachineClass {
    /// Classify a job.
    ///
    /// A running job is classified by the slot it landed in. A job that is
    /// not running anywhere is classified by whether it asks for GPUs.
    pub fn of(job: &JobRecord) -> MachineClass {
        match job.remote_host {
            Some(ref host) if host.to_lowercase().contains(GPU_MARKER) => MachineClass::Gpu,
            Some(_) => MachineClass::Cpu,
            None if job.requested_gpus > 0 => MachineClass::Gpu,
            None => MachineClass::Cpu,
        }
    }

    pub fn label(&self) -> &'static str {
        match *self {
            MachineClass::Cpu => "CPU",
            MachineClass::Gpu => "GPU",
        }
    }
}

impl fmt::Display for MachineClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MachineClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(MachineClass::Cpu),
            "gpu" => Ok(MachineClass::Gpu),
            _ => Err(format_err!("unrecognized machine type `{}` (expected cpu or gpu)", s)),
        }
    }
}


/// One of the per-user tallies: a machine class, or both of them together.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Bucket {
    Cpu,
    Gpu,
    Total,
}

impl Bucket {
    pub fn label(&self) -> &'static str {
        match *self {
            Bucket::Cpu => "CPU",
            Bucket::Gpu => "GPU",
            Bucket::Total => "Total",
        }
    }
}

impl From<MachineClass> for Bucket {
    fn from(class: MachineClass) -> Bucket {
        match class {
            MachineClass::Cpu => Bucket::Cpu,
            MachineClass::Gpu => Bucket::Gpu,
        }
    }
}


/// Job counts for each status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatusCounts {
    pub idle: u64,
    pub running: u64,
    pub removed: u64,
    pub completed: u64,
    pub held: u64,
    pub transferring_output: u64,
    pub suspended: u64,
    pub unknown: u64,
}

impl StatusCounts {
    pub fn get(&self, status: JobStatus) -> u64 {
        match status {
            JobStatus::Idle => self.idle,
            JobStatus::Running => self.running,
            JobStatus::Removed => self.removed,
            JobStatus::Completed => self.completed,
            JobStatus::Held => self.held,
            JobStatus::TransferringOutput => self.transferring_output,
            JobStatus::Suspended => self.suspended,
            JobStatus::Unknown => self.unknown,
        }
    }

    fn slot_mut(&mut self, status: JobStatus) -> &mut u64 {
        match status {
            JobStatus::Idle => &mut self.idle,
            JobStatus::Running => &mut self.running,
            JobStatus::Removed => &mut self.removed,
            JobStatus::Completed => &mut self.completed,
            JobStatus::Held => &mut self.held,
            JobStatus::TransferringOutput => &mut self.transferring_output,
            JobStatus::Suspended => &mut self.suspended,
            JobStatus::Unknown => &mut self.unknown,
        }
    }

    pub fn increment(&mut self, status: JobStatus) {
        *self.slot_mut(status) += 1;
    }

    /// The number of jobs in any status.
    pub fn total(&self) -> u64 {
        JobStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }

    /// The number of jobs in any of `statuses`.
    pub fn sum_of(&self, statuses: &[JobStatus]) -> u64 {
        statuses.iter().map(|s| self.get(*s)).sum()
    }
}

impl AddAssign for StatusCounts {
    fn add_assign(&mut self, other: StatusCounts) {
        for status in JobStatus::ALL.iter() {
            *self.slot_mut(*status) += other.get(*status);
        }
    }
}

impl Add for StatusCounts {
    type Output = StatusCounts;

    fn add(mut self, other: StatusCounts) -> StatusCounts {
        self += other;
        self
    }
}


/// The tallies for one user.
///
/// `total` always equals `cpu + gpu`, status by status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MachineStats {
    pub cpu: StatusCounts,
    pub gpu: StatusCounts,
    pub total: StatusCounts,
}

impl MachineStats {
    pub fn get(&self, bucket: Bucket) -> &StatusCounts {
        match bucket {
            Bucket::Cpu => &self.cpu,
            Bucket::Gpu => &self.gpu,
            Bucket::Total => &self.total,
        }
    }

    fn record(&mut self, class: MachineClass, status: JobStatus) {
        match class {
            MachineClass::Cpu => self.cpu.increment(status),
            MachineClass::Gpu => self.gpu.increment(status),
        }

        self.total.increment(status);
    }

    /// The number of jobs tallied for this user.
    pub fn job_count(&self) -> u64 {
        self.total.total()
    }
}


/// Per-user job tallies for the whole queue.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserStats(HashMap<String, MachineStats>);

impl UserStats {
    pub fn get(&self, user: &str) -> Option<&MachineStats> {
        self.0.get(user)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<String, MachineStats> {
        self.0.iter()
    }

    /// The users with the most jobs first, ties broken by username.
    pub fn ranked(&self) -> Vec<(&str, &MachineStats)> {
        self.0.iter()
            .sorted_by(|a, b| b.1.job_count().cmp(&a.1.job_count()).then_with(|| a.0.cmp(b.0)))
            .map(|(user, stats)| (user.as_str(), stats))
            .collect()
    }
}


/// Tally jobs by owner, machine class, and status.
///
/// With `only` set, jobs of the other machine class are left out entirely,
/// including from the per-user totals.
pub fn aggregate<'a, I>(jobs: I, only: Option<MachineClass>) -> UserStats
    where I: IntoIterator<Item = &'a JobRecord>
{
    let mut stats = HashMap::new();

    for job in jobs {
        let class = MachineClass::of(job);

        if let Some(wanted) = only {
            if class != wanted {
                continue;
            }
        }

        stats.entry(job.owner.clone())
            .or_insert_with(MachineStats::default)
            .record(class, job.status());
    }

    UserStats(stats)
}


/// Query the queue and tally what is in it.
pub fn fetch_jobs<Q: JobQuery + ?Sized>(schedd: &Q, only: Option<MachineClass>) -> Result<UserStats, Error> {
    let jobs = schedd.query_jobs()?;
    let stats = aggregate(&jobs, only);
    debug!("tallied {} queued jobs across {} users", jobs.len(), stats.len());
    Ok(stats)
}
