//! Dense deformable registration of 2D slices on Burn.

pub mod interpolation;
pub mod io;
pub mod vxm;

pub use io::SliceAdapter;
pub use vxm::{VxmDense, VxmDenseConfig, VxmOutput};
