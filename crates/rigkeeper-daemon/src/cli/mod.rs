mod checks;
mod commands;
mod config_cmd;
mod control;
mod info;
mod init;
mod launch_spec;
mod run;
mod status;
mod utils;

pub use checks::run_checks;
pub use commands::{Cli, Commands};
pub use config_cmd::handle_config;
pub use control::{recover_daemon, reload_daemon, stop_daemon};
pub use info::show_version;
pub use init::init_config;
pub use launch_spec::show_launch_spec;
pub use run::run_daemon;
pub use status::show_status;
pub use utils::{init_logging, load_config};
