//! Binary entry point: resolve the data directory, load config, start logging,
//! load the dataset and the local store, then hand over to the TUI.
use anyhow::Context;
use medwise::{
    data_dir, ensure_schema, init_logging, load_config, run_app, App, Dataset, CONFIG_FILE_NAME,
};

fn main() -> anyhow::Result<()> {
    let data_dir = data_dir()?;
    let config = load_config(&data_dir.join(CONFIG_FILE_NAME))?;
    init_logging(&data_dir, &config.log_filter)?;

    let dataset = match &config.dataset_path {
        Some(path) => Dataset::from_path(path)?,
        None => Dataset::bundled().context("bundled dataset is invalid")?,
    };

    let conn = ensure_schema(&data_dir)?;
    let mut app = App::new(conn, dataset);
    run_app(&mut app)
}
