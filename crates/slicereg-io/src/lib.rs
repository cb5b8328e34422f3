//! NIfTI-1 input and output.
//!
//! Volumes come back as [`slicereg_core::Image`] values in `[z, y, x]` tensor
//! order with sform geometry; displacement fields and multichannel volumes
//! are stored with the component on the fourth NIfTI axis.

pub mod nifti_io;

pub use nifti_io::{
    read_nifti, read_nifti_array, read_nifti_channels, write_nifti, write_nifti_vector, NiftiVolume,
};
