use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Stop after this many seconds instead of running forever.
    #[arg(long)]
    pub duration: Option<u64>,

    /// Run the dashboard renderer instead of the acquisition loop.
    #[arg(long, default_value_t = false)]
    pub dashboard: bool,

    #[arg(short, long, default_value_t = log::LevelFilter::Info)]
    pub logging_level: log::LevelFilter,

    /// Optional TOML config; defaults cover the Perak deployment.
    #[arg(long)]
    pub config_file: Option<std::path::PathBuf>,
}
