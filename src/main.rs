use clap::Parser;
use log::info;
use perak_radar::acquisition::Collector;
use perak_radar::cli::Cli;
use perak_radar::config::ApplicationConfig;
use perak_radar::dashboard::DashboardRenderer;
use perak_radar::logging::setup_logging;
use perak_radar::opensky::StateQueryClient;
use perak_radar::scheduler::Scheduler;
use perak_radar::store::FlatStore;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.logging_level);

    let config = ApplicationConfig::load_or_default(cli.config_file.as_ref()).unwrap_or_else(
        |e| {
            log::error!("{e}");
            panic!("Config error. Exiting.")
        },
    );

    info!("Main: Application started.");

    let store = FlatStore::new(config.store.path.clone());
    let bounding_box = config.opensky.bounding_box;

    let mut scheduler = Scheduler::new();
    let task_id = if cli.dashboard {
        info!("Main: Rendering dashboard to {}.", config.dashboard.output_path.display());
        let refresh_interval =
            std::time::Duration::from_secs(config.dashboard.refresh_interval_seconds);
        let renderer = DashboardRenderer::new(store, bounding_box, config.dashboard);
        scheduler.add_task(renderer, refresh_interval)
    } else {
        info!("Main: Saving to {}.", store.path().display());
        let collector = Collector::new(StateQueryClient::new(&config.opensky), store, bounding_box);
        scheduler.add_task(
            collector,
            std::time::Duration::from_secs(config.opensky.poll_interval_seconds),
        )
    };

    if let Some(duration) = cli.duration {
        std::thread::sleep(std::time::Duration::from_secs(duration));
        scheduler.stop_all_tasks();
    }

    scheduler.wait_on_task_finish(task_id);

    info!("Main: Program finished.");
}
