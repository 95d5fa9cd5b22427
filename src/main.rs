use dotenv::dotenv;
use switchworld::config::{EnvConfig, RunConfig};
use switchworld::infra::{CompositeObserver, DefaultObserver, EpisodeLogObserver};
use switchworld::runner::{EpisodeRunner, RandomPolicy};
use switchworld::switch::SwitchEnv;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("switchworld=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging()?;

    let env_config = EnvConfig::from_env()?;
    let run_config = RunConfig::from_env()?;
    tracing::info!("Environment: {:?}", env_config);
    tracing::info!("Run: {:?}", run_config);

    let mut observer = CompositeObserver::new(vec![Box::new(DefaultObserver)]);
    if let Some(folder) = &run_config.episode_log_folder {
        let log = EpisodeLogObserver::new(folder)?;
        tracing::info!("Writing episode log to {:?}", log.path());
        observer.push(log);
    }

    let env = SwitchEnv::new(&env_config)?;
    let mut runner = EpisodeRunner::new(env, observer, run_config.max_steps);
    let mut policy = RandomPolicy::new(env_config.seed);

    let stats = runner.run(run_config.episodes, &mut policy)?;
    stats.log_summary();

    Ok(())
}
