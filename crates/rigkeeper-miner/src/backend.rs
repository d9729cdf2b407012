use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_GMINER_PORT: &str = "3333";

const TREX_API_PORT: u16 = 4067;
const LOLMINER_API_PORT: u16 = 4068;
const GMINER_API_PORT: u16 = 4069;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinerBackend {
    #[default]
    #[serde(rename = "t-rex")]
    TRex,
    #[serde(rename = "lolminer")]
    LolMiner,
    #[serde(rename = "gminer")]
    GMiner,
}

impl MinerBackend {
    pub const ALL: [MinerBackend; 3] = [MinerBackend::TRex, MinerBackend::LolMiner, MinerBackend::GMiner];

    pub fn executable_name(&self) -> &'static str {
        if cfg!(windows) {
            match self {
                MinerBackend::TRex => "t-rex.exe",
                MinerBackend::LolMiner => "lolMiner.exe",
                MinerBackend::GMiner => "miner.exe",
            }
        } else {
            match self {
                MinerBackend::TRex => "t-rex",
                MinerBackend::LolMiner => "lolMiner",
                MinerBackend::GMiner => "miner",
            }
        }
    }

    pub fn api_port(&self) -> u16 {
        match self {
            MinerBackend::TRex => TREX_API_PORT,
            MinerBackend::LolMiner => LOLMINER_API_PORT,
            MinerBackend::GMiner => GMINER_API_PORT,
        }
    }

    pub fn stats_url(&self) -> String {
        match self {
            MinerBackend::TRex => format!("http://127.0.0.1:{}/summary", TREX_API_PORT),
            MinerBackend::LolMiner => format!("http://127.0.0.1:{}", LOLMINER_API_PORT),
            MinerBackend::GMiner => format!("http://127.0.0.1:{}/stat", GMINER_API_PORT),
        }
    }

    /// Argument vector for this backend. Pure; no filesystem access.
    pub fn build_args(&self, config: &SessionConfig) -> Vec<String> {
        let user = format!("{}.{}", config.credential, config.worker_label);

        match self {
            MinerBackend::TRex => vec![
                "-a".into(),
                config.algorithm.clone(),
                "-o".into(),
                format!("stratum+tcp://{}", config.pool),
                "-u".into(),
                user,
                "-p".into(),
                "x".into(),
                "--api-bind-http".into(),
                format!("127.0.0.1:{}", TREX_API_PORT),
            ],
            MinerBackend::LolMiner => vec![
                "--algo".into(),
                config.algorithm.to_uppercase(),
                "--pool".into(),
                config.pool.clone(),
                "--user".into(),
                user,
                "--apiport".into(),
                LOLMINER_API_PORT.to_string(),
            ],
            MinerBackend::GMiner => {
                let (host, port) = split_pool(&config.pool);
                vec![
                    "--algo".into(),
                    config.algorithm.clone(),
                    "--server".into(),
                    host.to_string(),
                    "--port".into(),
                    port.to_string(),
                    "--user".into(),
                    user,
                    "--api".into(),
                    GMINER_API_PORT.to_string(),
                ]
            }
        }
    }

    pub fn launch_spec(&self, miner_dir: &Path, config: &SessionConfig) -> LaunchSpec {
        LaunchSpec {
            backend: *self,
            program: miner_dir.join(self.executable_name()),
            args: self.build_args(config),
            working_dir: miner_dir.to_path_buf(),
        }
    }
}

fn split_pool(pool: &str) -> (&str, &str) {
    match pool.split_once(':') {
        Some((host, port)) if !port.is_empty() => (host, port),
        Some((host, _)) => (host, DEFAULT_GMINER_PORT),
        None => (pool, DEFAULT_GMINER_PORT),
    }
}

impl fmt::Display for MinerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinerBackend::TRex => write!(f, "t-rex"),
            MinerBackend::LolMiner => write!(f, "lolminer"),
            MinerBackend::GMiner => write!(f, "gminer"),
        }
    }
}

impl FromStr for MinerBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "t-rex" | "trex" => Ok(MinerBackend::TRex),
            "lolminer" => Ok(MinerBackend::LolMiner),
            "gminer" => Ok(MinerBackend::GMiner),
            other => Err(format!("Unknown miner backend: {}", other)),
        }
    }
}

/// Everything needed to spawn one miner process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchSpec {
    pub backend: MinerBackend,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchSpec {
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(backend: MinerBackend, pool: &str) -> SessionConfig {
        SessionConfig {
            target: "RVN".into(),
            algorithm: "kawpow".into(),
            pool: pool.into(),
            credential: "addr".into(),
            worker_label: "rig1".into(),
            backend,
        }
    }

    #[test]
    fn test_trex_command_line() {
        let config = session(MinerBackend::TRex, "pool.example:3333");
        let spec = MinerBackend::TRex.launch_spec(Path::new("/opt/miners"), &config);
        assert_eq!(
            spec.command_line(),
            "-a kawpow -o stratum+tcp://pool.example:3333 -u addr.rig1 -p x --api-bind-http 127.0.0.1:4067"
        );
        assert_eq!(spec.working_dir, PathBuf::from("/opt/miners"));
        assert!(spec.program.ends_with(MinerBackend::TRex.executable_name()));
    }

    #[test]
    fn test_lolminer_uppercases_algorithm() {
        let config = session(MinerBackend::LolMiner, "pool.example:3333");
        assert_eq!(
            MinerBackend::LolMiner.build_args(&config).join(" "),
            "--algo KAWPOW --pool pool.example:3333 --user addr.rig1 --apiport 4068"
        );
    }

    #[test]
    fn test_gminer_splits_pool() {
        let config = session(MinerBackend::GMiner, "pool.example:4444");
        assert_eq!(
            MinerBackend::GMiner.build_args(&config).join(" "),
            "--algo kawpow --server pool.example --port 4444 --user addr.rig1 --api 4069"
        );

        let config = session(MinerBackend::GMiner, "pool.example");
        let args = MinerBackend::GMiner.build_args(&config);
        assert_eq!(args[3], "pool.example");
        assert_eq!(args[5], DEFAULT_GMINER_PORT);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("t-rex".parse::<MinerBackend>(), Ok(MinerBackend::TRex));
        assert_eq!("lolMiner".parse::<MinerBackend>(), Ok(MinerBackend::LolMiner));
        assert_eq!(" gminer ".parse::<MinerBackend>(), Ok(MinerBackend::GMiner));
        assert!("nbminer".parse::<MinerBackend>().is_err());

        for backend in MinerBackend::ALL {
            assert_eq!(backend.to_string().parse::<MinerBackend>(), Ok(backend));
        }
    }

    #[test]
    fn test_stats_urls_use_api_ports() {
        for backend in MinerBackend::ALL {
            assert!(backend.stats_url().contains(&backend.api_port().to_string()));
        }
        assert_eq!(MinerBackend::TRex.stats_url(), "http://127.0.0.1:4067/summary");
    }
}
