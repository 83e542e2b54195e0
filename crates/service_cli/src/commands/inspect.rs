//! Inspect command implementation
//!
//! Summarises a checkpoint file.

use integrator_engine::checkpoint::read_snapshot_header;
use integrator_engine::rng::SamplerRng;
use integrator_engine::sampler::{AdaptiveSampler, GridSampler, GRID_SAMPLER_KIND};
use std::path::Path;
use tracing::{info, warn};

use crate::{CliError, Result};

/// Run the inspect command
pub fn run(path: &Path) -> Result<()> {
    info!("Inspecting {}", path.display());
    println!("{}", summarise(path)?);
    Ok(())
}

/// Render the envelope and, for grid snapshots, the sampler state
pub fn summarise(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }

    let header = read_snapshot_header(path)?;
    let mut out = format!(
        "snapshot: {}\n  kind     {}\n  format   v{}\n  saved at {}",
        path.display(),
        header.kind,
        header.format_version,
        header.saved_at.to_rfc3339()
    );

    if header.kind == GRID_SAMPLER_KIND {
        let sampler = GridSampler::from_checkpoint(path, SamplerRng::from_seed(0))?;
        out.push('\n');
        out.push_str(&sampler.describe());
        if let Ok(result) = sampler.estimate() {
            out.push_str(&format!(
                "\n  estimate {:.8} +/- {:.3e}",
                result.mean, result.std_error
            ));
        }
    } else {
        warn!(kind = %header.kind, "Unknown sampler kind, state not decoded");
    }
    Ok(out)
}
