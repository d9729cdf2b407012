use super::utils::{print_banner, rule, ACCENT, DIM, OK, RESET};
use rigkeeper_miner::MinerBackend;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn show_version() {
    print_banner();
    println!("{}Build Information{}", OK, RESET);
    println!("{}", rule());
    println!("  Version:   {}{}{}", ACCENT, BUILD_VERSION, RESET);
    println!("  Target:    {}{}-{}{}", DIM, std::env::consts::ARCH, std::env::consts::OS, RESET);
    println!(
        "  Profile:   {}{}{}",
        DIM,
        if cfg!(debug_assertions) { "debug" } else { "release" },
        RESET
    );
    println!();
    println!("{}Supported Miners{}", OK, RESET);
    println!("{}", rule());
    for backend in MinerBackend::ALL {
        println!(
            "  {:<10} {}{}{}  stats on :{}",
            backend.to_string(),
            ACCENT,
            backend.executable_name(),
            RESET,
            backend.api_port()
        );
    }
}
