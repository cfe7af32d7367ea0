use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use geopop::{calibrate, distance, panel, predict, report};

#[derive(Parser)]
#[command(
    name = "geopop",
    about = "Predict the geographic origin of individuals from genetic admixture profiles"
)]
struct Args {
    /// CSV of test individuals: SAMPLE_ID, nine admixture components, GROUP_ID
    data_file: PathBuf,

    /// CSV of reference population coordinates: POPULATION, Lat, Long
    geo_file: PathBuf,

    /// Headerless CSV of reference population admixture profiles
    gen_file: PathBuf,

    /// Output path for the tab-separated result table
    #[arg(short, long, default_value = "gps_results.txt")]
    output: PathBuf,

    /// Worker threads for the per-individual loop (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let panel = panel::ReferencePanel::from_paths(&args.geo_file, &args.gen_file)?;
    log::info!("loaded {} reference populations", panel.len());

    let individuals = panel::load_individuals_from_path(&args.data_file)?;
    log::info!("loaded {} test individuals", individuals.len());

    let geo_matrix = distance::pairwise_euclidean(panel.coords());
    let gene_matrix = distance::pairwise_euclidean(panel.genes());
    let model = calibrate::fit(
        &distance::flatten_row_major(&gene_matrix),
        &distance::flatten_row_major(&geo_matrix),
    );
    log::info!(
        "calibrated genetic-to-geographic coefficient {:.6}",
        model.coefficient
    );

    let results = predict::predict_all(&panel, &model, &individuals);

    report::write_results_to_path(&args.output, &results)?;
    log::info!(
        "wrote {} predictions to {}",
        results.len(),
        args.output.display()
    );
    Ok(())
}
