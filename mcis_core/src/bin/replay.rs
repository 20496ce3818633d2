//! Offline MDA replay: runs the washout filter pipeline over one or more
//! input CSV files with no UDP ingest, no session FSM, and no motion-base
//! traffic. Each `<path>` produces a sibling `<path>out.csv`.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use mcis_common::Vector3;
use mcis_core::config::MdaConfig;
use mcis_core::log::{LogRow, MdaLog};
use mcis_core::mda::{Envelope, Mda};

#[derive(Debug, Parser)]
#[command(name = "mcis_replay", about = "Offline MDA replay over recorded telemetry CSVs")]
struct Args {
    /// Path to the 4096-byte binary MDA configuration record.
    #[arg(long, default_value = "mcis.cfg")]
    config: PathBuf,

    /// Disables gravity subtraction in the positional channel.
    #[arg(long = "nograv")]
    no_gravity: bool,

    /// One or more input CSV files, each line `ax,ay,az,p,q,r,phi,theta,psi`.
    inputs: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mda_config = match MdaConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load MDA configuration: {e}");
            std::process::exit(1);
        }
    };

    if args.inputs.is_empty() {
        eprintln!("no input CSV files given");
        std::process::exit(1);
    }

    let envelope = Envelope::default_for_platform();

    for input_path in &args.inputs {
        if let Err(e) = replay_one(input_path, &mda_config, &envelope, !args.no_gravity) {
            eprintln!("failed to replay {}: {e}", input_path.display());
            std::process::exit(1);
        }
    }
}

fn replay_one(
    input_path: &std::path::Path,
    mda_config: &MdaConfig,
    envelope: &Envelope,
    subtract_gravity: bool,
) -> std::io::Result<()> {
    let file = std::fs::File::open(input_path)?;
    let reader = BufReader::new(file);

    let mut output_path = input_path.as_os_str().to_owned();
    output_path.push("out.csv");
    let mut log = MdaLog::create(std::path::Path::new(&output_path))?;

    let mut mda = Mda::new(mda_config, subtract_gravity);

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<f64> = trimmed
            .split(',')
            .map(|f| f.trim().parse().unwrap_or(0.0))
            .collect();
        if fields.len() < 9 {
            eprintln!("skipping malformed line in {}: {line}", input_path.display());
            continue;
        }

        let specific_force = Vector3::new(fields[0], fields[1], fields[2]);
        let angular_rate = Vector3::new(fields[3], fields[4], fields[5]);
        let attitude = Vector3::new(fields[6], fields[7], fields[8]);

        let out = mda.step(specific_force, angular_rate, attitude);
        let (pos, rot) = envelope.clamp(out.pos, out.attitude);

        log.append(&LogRow { specific_force, angular_rate, attitude, pos, rot })?;
    }

    Ok(())
}
