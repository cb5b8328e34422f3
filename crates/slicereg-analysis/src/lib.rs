//! Summaries and raster renderings of registration inputs and outputs.
//!
//! Everything here works on host-side [`ndarray`] arrays so it can run
//! after a registration has been written to disk.

pub mod error;
pub mod pca;
pub mod equalize;
pub mod gif;
pub mod quiver;
pub mod warped_grid;

pub use error::{AnalysisError, Result};
pub use pca::{percentage_change, summarize, PcaSummary};
pub use equalize::equalize_hist;
pub use gif::{save_gif, write_gif};
pub use quiver::{render_quiver, save_quiver};
pub use warped_grid::{plot_warped_grid, save_warped_grid, DEFAULT_GRID_COLOR};
