use clap::Parser;
use tracing::{info, warn};

use vr_gui::app::App;
use vr_gui::build_info;
use vr_gui::config::AppConfig;
use vr_gui::health;
use vr_gui::hmd::RuntimeKind;
use vr_gui::logging;

/// GUI panel in VR, driven by a hand controller
#[derive(Debug, Parser)]
#[command(name = "vr_gui", version = build_info::PKG_VERSION)]
struct Cli {
    /// Configuration profile (defaults to APP_PROFILE, then the build type)
    #[arg(long)]
    profile: Option<String>,

    /// Headset runtime, overriding the profile
    #[arg(long, value_enum)]
    runtime: Option<RuntimeKind>,

    /// Run the health checks and exit
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let profile = cli.profile.unwrap_or_else(AppConfig::default_profile);

    let loaded = AppConfig::load(&profile);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => AppConfig::defaults_for(&profile),
    };
    if let Some(runtime) = cli.runtime {
        config.hmd.runtime = runtime;
    }

    logging::init(&config.logging);
    if let Err(e) = loaded {
        let e = vr_gui::Error::from(e);
        warn!(error = %e, profile = %profile, "Failed to load config, using defaults");
    }
    info!(version = %build_info::version_string(), "vr_gui");

    if cli.check {
        let report = health::run_all_checks(config);
        health::print_report(&report);
        std::process::exit(report.exit_code());
    }

    App::new(config).run()
}
