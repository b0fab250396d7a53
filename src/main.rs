use std::env;
use std::io;
use std::path::Path;

use log::{error, info};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_wrangler::config::{
    create_output_dir, load_user_config, DEFAULT_CONFIG_PATH, DEFAULT_LOG_LEVEL,
};
use osm_wrangler::errors::Result;
use osm_wrangler::etl::run_pipeline;
use osm_wrangler::store::MemoryStore;

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let user_config = match load_user_config(Path::new(&config_path)) {
        Ok(config) => config,
        Err(err) => {
            // no configured level yet
            setup_logging(DEFAULT_LOG_LEVEL);
            let message = err.to_string();
            error!(config_path = config_path.as_str(), err = message.as_str(); "Could not load config");
            return Err(err);
        }
    };
    setup_logging(&user_config.log_level);

    let output_dir = create_output_dir(&user_config).map_err(|err| {
        let message = err.to_string();
        error!(err = message.as_str(); "Could not create output directory");
        err
    })?;
    let store = run_pipeline(&user_config, &output_dir, MemoryStore::new())?;
    info!(documents = store.len(), output_dir = output_dir.display().to_string().as_str(); "Pipeline finished");

    Ok(())
}
