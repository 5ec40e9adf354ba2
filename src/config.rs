// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Runtime configuration.

There is no configuration file. The HTCondor tools and `pinky` are found on
`$PATH` and the usage log lives beside the executable, but each of these can
be pointed elsewhere through an environment variable, which is mostly useful
for sites with unusual installs and for testing against fake tools.

*/

use failure::Error;
use std::env;
use std::path::PathBuf;
use usage;


pub const CONDOR_Q_VAR: &str = "CONDORSTAT_CONDOR_Q";
pub const CONDOR_USERPRIO_VAR: &str = "CONDORSTAT_CONDOR_USERPRIO";
pub const PINKY_VAR: &str = "CONDORSTAT_PINKY";
pub const USAGE_LOG_VAR: &str = "CONDORSTAT_USAGE_LOG";


#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The program used to query the schedd.
    pub condor_q: String,

    /// The program used to list user priorities.
    pub condor_userprio: String,

    /// The program used to look up real names.
    pub pinky: String,

    /// Where to append usage records, if not beside the executable.
    pub usage_log: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            condor_q: "condor_q".to_owned(),
            condor_userprio: "condor_userprio".to_owned(),
            pinky: "pinky".to_owned(),
            usage_log: None,
        }
    }
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Self {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration from an arbitrary variable lookup. Variables
    /// that are set but empty count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Config::default();

        if let Some(v) = get(CONDOR_Q_VAR) {
            config.condor_q = v;
        }

        if let Some(v) = get(CONDOR_USERPRIO_VAR) {
            config.condor_userprio = v;
        }

        if let Some(v) = get(PINKY_VAR) {
            config.pinky = v;
        }

        config.usage_log = get(USAGE_LOG_VAR).map(PathBuf::from);
        config
    }

    /// Where this run should append its usage record.
    pub fn usage_log_path(&self) -> Result<PathBuf, Error> {
        match self.usage_log {
            Some(ref p) => Ok(p.clone()),
            None => usage::default_path(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = lookup(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.condor_q, "condor_q");
        assert!(config.usage_log.is_none());
        assert!(config.usage_log_path().unwrap().ends_with(usage::USAGE_LOG_NAME));
    }

    #[test]
    fn overrides() {
        let config = lookup(&[
            (CONDOR_Q_VAR, "/opt/condor/bin/condor_q"),
            (PINKY_VAR, "/usr/local/bin/pinky"),
            (USAGE_LOG_VAR, "/var/log/condorstat.txt"),
        ]);

        assert_eq!(config.condor_q, "/opt/condor/bin/condor_q");
        assert_eq!(config.condor_userprio, "condor_userprio");
        assert_eq!(config.pinky, "/usr/local/bin/pinky");
        assert_eq!(config.usage_log_path().unwrap(), PathBuf::from("/var/log/condorstat.txt"));
    }

    #[test]
    fn empty_means_unset() {
        let config = lookup(&[(CONDOR_Q_VAR, ""), (USAGE_LOG_VAR, "")]);
        assert_eq!(config, Config::default());
    }
}
