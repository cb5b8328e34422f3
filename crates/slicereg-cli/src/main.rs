use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use slicereg_core::InterpolationKernel;
use tracing::info;

mod commands;
mod register;

use commands::GridOptions;
use register::RegisterArgs;

#[derive(Parser)]
#[command(name = "slicereg")]
#[command(about = "Slice-by-slice deformable registration of volumes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register every slice of a moving volume onto one slice of a fixed volume
    Register(RegisterArgs),

    /// Resample a volume onto an isotropic grid covering the same physical extent
    Resample {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Output voxel counts in x, y, z order
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], required = true)]
        size: Vec<usize>,

        /// Interpolation kernel (nearest, linear, bspline); use nearest for labels
        #[arg(short, long, default_value_t = InterpolationKernel::Linear)]
        kernel: InterpolationKernel,
    },

    /// Write a histogram-equalized GIF with one frame per z slice
    Gif {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long)]
        label: String,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Write a quiver-plot GIF of a displacement field, one frame per slice
    Quiver {
        #[arg(short, long)]
        warp: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Physical axis the field was sliced along
        #[arg(long, default_value_t = 2)]
        slice_axis: usize,
    },

    /// Print the eigenvalues of the channel correlation of a volume
    Pca {
        #[arg(short, long)]
        input: PathBuf,

        /// Leading components counted as explained (default: min(10, depth))
        #[arg(short = 'k', long)]
        components: Option<usize>,
    },

    /// Draw one slice of a displacement field as a deformed grid (PNG)
    Grid {
        #[arg(short, long)]
        warp: PathBuf,

        /// Volume drawn in grayscale behind the grid
        #[arg(short, long)]
        background: Option<PathBuf>,

        #[arg(long, default_value_t = 0)]
        slice: usize,

        #[arg(long, default_value_t = 2)]
        slice_axis: usize,

        /// Grid spacing in pixels
        #[arg(long, default_value_t = 3)]
        interval: usize,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Register(args) => {
            register::run(&args)?;
        }
        Commands::Resample { input, output, size, kernel } => {
            let size: [usize; 3] = size
                .try_into()
                .map_err(|s: Vec<usize>| anyhow::anyhow!("--size takes 3 values, got {}", s.len()))?;
            commands::resample(&input, &output, size, kernel)?;
        }
        Commands::Gif { input, name, label, output_dir } => {
            let path = commands::gif(&input, &name, &label, &output_dir)?;
            info!("GIF written to {}", path.display());
        }
        Commands::Quiver { warp, name, output_dir, slice_axis } => {
            let path = commands::quiver(&warp, &name, &output_dir, slice_axis)?;
            info!("Quiver plot written to {}", path.display());
        }
        Commands::Pca { input, components } => {
            commands::pca(&input, components)?;
        }
        Commands::Grid { warp, background, slice, slice_axis, interval, output } => {
            let options = GridOptions {
                slice,
                slice_axis,
                interval,
                ..Default::default()
            };
            commands::grid(&warp, background.as_deref(), &output, &options)?;
            info!("Warped grid written to {}", output.display());
        }
    }

    Ok(())
}
