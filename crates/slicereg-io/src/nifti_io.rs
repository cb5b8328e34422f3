use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use nalgebra::{SMatrix, Vector3};
use ndarray::{Array3, Array4, ArrayD, Axis, Ix3, Ix4};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use slicereg_core::image::{Image, ImageMetadata};
use slicereg_core::spatial::{Direction, Point, Spacing};
use std::path::Path;
use tracing::debug;

/// Raw NIfTI voxel data in file axis order (`x, y, z[, c]`) plus its geometry.
#[derive(Debug, Clone)]
pub struct NiftiVolume {
    pub data: ArrayD<f32>,
    pub metadata: ImageMetadata<3>,
}

/// Voxel-to-world affine rows, from sform, then qform, then pixdim alone.
fn header_affine(header: &NiftiHeader) -> [[f64; 4]; 3] {
    let to_f64 = |row: [f32; 4]| row.map(f64::from);
    if header.sform_code > 0 {
        return [to_f64(header.srow_x), to_f64(header.srow_y), to_f64(header.srow_z)];
    }

    let dx = f64::from(header.pixdim[1]);
    let dy = f64::from(header.pixdim[2]);
    let dz = f64::from(header.pixdim[3]);
    if header.qform_code > 0 {
        let b = f64::from(header.quatern_b);
        let c = f64::from(header.quatern_c);
        let d = f64::from(header.quatern_d);
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let dz = dz * qfac;

        return [
            [
                (a * a + b * b - c * c - d * d) * dx,
                (2.0 * b * c - 2.0 * a * d) * dy,
                (2.0 * b * d + 2.0 * a * c) * dz,
                f64::from(header.quatern_x),
            ],
            [
                (2.0 * b * c + 2.0 * a * d) * dx,
                (a * a + c * c - b * b - d * d) * dy,
                (2.0 * c * d - 2.0 * a * b) * dz,
                f64::from(header.quatern_y),
            ],
            [
                (2.0 * b * d - 2.0 * a * c) * dx,
                (2.0 * c * d + 2.0 * a * b) * dy,
                (a * a + d * d - c * c - b * b) * dz,
                f64::from(header.quatern_z),
            ],
        ];
    }

    [[dx, 0.0, 0.0, 0.0], [0.0, dy, 0.0, 0.0], [0.0, 0.0, dz, 0.0]]
}

/// Split a voxel-to-world affine into origin, spacing (column norms) and direction.
fn header_metadata(header: &NiftiHeader) -> ImageMetadata<3> {
    let affine = header_affine(header);
    let origin = Point::new([affine[0][3], affine[1][3], affine[2][3]]);

    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
    let mut spacing = [1.0; 3];
    let mut columns = axes;
    for c in 0..3 {
        let column = Vector3::new(affine[0][c], affine[1][c], affine[2][c]);
        let norm = column.norm();
        if norm > 1e-9 {
            spacing[c] = norm;
            columns[c] = column / norm;
        }
    }

    ImageMetadata::new(
        origin,
        Spacing::new(spacing),
        Direction(SMatrix::<f64, 3, 3>::from_columns(&columns)),
    )
}

/// Header carrying `metadata` as an sform (and matching pixdim).
fn geometry_header(metadata: &ImageMetadata<3>) -> NiftiHeader {
    let origin = metadata.origin();
    let spacing = metadata.spacing();
    let direction = metadata.direction();

    let row = |r: usize| -> [f32; 4] {
        [
            (direction[(r, 0)] * spacing[0]) as f32,
            (direction[(r, 1)] * spacing[1]) as f32,
            (direction[(r, 2)] * spacing[2]) as f32,
            origin[r] as f32,
        ]
    };

    NiftiHeader {
        pixdim: [
            1.0,
            spacing[0] as f32,
            spacing[1] as f32,
            spacing[2] as f32,
            1.0,
            1.0,
            1.0,
            1.0,
        ],
        sform_code: 1,
        qform_code: 0,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        ..NiftiHeader::default()
    }
}

/// Read any NIfTI file into an ndarray in file axis order.
pub fn read_nifti_array<P: AsRef<Path>>(path: P) -> Result<NiftiVolume> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let metadata = header_metadata(obj.header());
    let data = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;

    debug!(path = %path.display(), shape = ?data.shape(), "Read NIfTI volume");
    Ok(NiftiVolume { data, metadata })
}

/// Read a 3-D NIfTI volume.
///
/// The returned tensor is in `[z, y, x]` order.
pub fn read_nifti<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Image<B, 3>> {
    let path = path.as_ref();
    let volume = read_nifti_array(path)?;
    let ndim = volume.data.ndim();
    let array = volume
        .data
        .into_dimensionality::<Ix3>()
        .with_context(|| format!("Expected 3D NIfTI file, found {} dimensions", ndim))?;

    array_to_image(array.view(), &volume.metadata, device)
}

/// Read a 4-D NIfTI file whose fourth axis holds channels, one image per channel.
///
/// A 3-D file is returned as a single channel.
pub fn read_nifti_channels<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Vec<Image<B, 3>>> {
    let path = path.as_ref();
    let volume = read_nifti_array(path)?;
    let array = match volume.data.ndim() {
        3 => volume
            .data
            .into_dimensionality::<Ix3>()
            .context("Failed to view volume as 3D")?
            .insert_axis(Axis(3)),
        4 => volume
            .data
            .into_dimensionality::<Ix4>()
            .context("Failed to view volume as 4D")?,
        n => bail!("Expected 3D or 4D NIfTI file, found {} dimensions", n),
    };

    array
        .axis_iter(Axis(3))
        .map(|channel| array_to_image(channel, &volume.metadata, device))
        .collect()
}

fn array_to_image<B: Backend>(
    array: ndarray::ArrayView3<f32>,
    metadata: &ImageMetadata<3>,
    device: &B::Device,
) -> Result<Image<B, 3>> {
    // file order is [x, y, z]; tensors are [z, y, x]
    let zyx = array.reversed_axes();
    let shape = [zyx.shape()[0], zyx.shape()[1], zyx.shape()[2]];
    let values: Vec<f32> = zyx.iter().copied().collect();
    Ok(Image::from_vec(values, shape, metadata, device)?)
}

/// Write a 3-D image with its geometry as an sform.
pub fn write_nifti<B: Backend, P: AsRef<Path>>(path: P, image: &Image<B, 3>) -> Result<()> {
    let path = path.as_ref();
    let [nz, ny, nx] = image.shape();
    let array = Array3::from_shape_vec((nz, ny, nx), image.to_vec())
        .context("Failed to create ndarray")?
        .reversed_axes();

    WriterOptions::new(path)
        .reference_header(&geometry_header(&image.metadata()))
        .write_nifti(&array)
        .with_context(|| format!("Failed to write NIfTI file {}", path.display()))?;

    debug!(path = %path.display(), size = ?image.size(), "Wrote NIfTI volume");
    Ok(())
}

/// Write a vector field `[components, z, y, x]` as a 4-D NIfTI (`x, y, z, component`).
pub fn write_nifti_vector<B: Backend, P: AsRef<Path>>(
    path: P,
    field: &Tensor<B, 4>,
    metadata: &ImageMetadata<3>,
) -> Result<()> {
    let path = path.as_ref();
    let [nc, nz, ny, nx] = field.dims();
    let values: Vec<f32> = field.to_data().iter::<f32>().collect();
    let array = Array4::from_shape_vec((nc, nz, ny, nx), values)
        .context("Failed to create ndarray")?
        .permuted_axes([3, 2, 1, 0]);

    WriterOptions::new(path)
        .reference_header(&geometry_header(metadata))
        .write_nifti(&array)
        .with_context(|| format!("Failed to write NIfTI file {}", path.display()))?;

    debug!(path = %path.display(), components = nc, "Wrote NIfTI vector field");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use burn_ndarray::NdArray;
    use nalgebra::Rotation3;
    use tempfile::tempdir;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_read_nifti_basic() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.nii");

        // X=3, Y=4, Z=5; value = x + 10 y + 100 z
        let array = Array3::from_shape_fn((3, 4, 5), |(x, y, z)| (x + 10 * y + 100 * z) as f32);
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let device = Default::default();
        let image = read_nifti::<TestBackend, _>(&file_path, &device)?;

        assert_eq!(image.shape(), [5, 4, 3]);
        assert_eq!(image.size(), [3, 4, 5]);

        let values = image.to_vec();
        assert_eq!(values.len(), 3 * 4 * 5);
        // tensor index [z=1, y=2, x=0]
        assert_eq!(values[12 + 2 * 3], 120.0);
        assert_eq!(values[59], 2.0 + 30.0 + 400.0);
        Ok(())
    }

    #[test]
    fn test_write_read_preserves_geometry() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("geometry.nii.gz");
        let device = Default::default();

        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.3);
        let metadata = ImageMetadata::new(
            Point::new([12.5, -4.0, 7.25]),
            Spacing::new([0.5, 1.25, 3.0]),
            Direction(rotation.into_inner()),
        );
        let values: Vec<f32> = (0..24).map(|v| v as f32 * 0.5).collect();
        let image = Image::<TestBackend, 3>::from_vec(values.clone(), [2, 3, 4], &metadata, &device)?;

        write_nifti(&file_path, &image)?;
        let loaded = read_nifti::<TestBackend, _>(&file_path, &device)?;

        assert_eq!(loaded.shape(), [2, 3, 4]);
        assert_eq!(loaded.to_vec(), values);
        for i in 0..3 {
            assert!((loaded.spacing()[i] - metadata.spacing()[i]).abs() < 1e-5);
            assert!((loaded.origin()[i] - metadata.origin()[i]).abs() < 1e-5);
            for j in 0..3 {
                assert!((loaded.direction()[(i, j)] - metadata.direction()[(i, j)]).abs() < 1e-5);
            }
        }
        Ok(())
    }

    #[test]
    fn test_read_channels() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("channels.nii");

        let array = Array4::from_shape_fn((4, 3, 2, 2), |(x, y, z, c)| (x + 10 * y + 100 * z + 1000 * c) as f32);
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let device = Default::default();
        let channels = read_nifti_channels::<TestBackend, _>(&file_path, &device)?;
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].shape(), [2, 3, 4]);
        assert_eq!(channels[1].to_vec()[0], 1000.0);
        assert_eq!(channels[0].to_vec()[23], 3.0 + 20.0 + 100.0);
        Ok(())
    }

    #[test]
    fn test_write_vector_field_layout() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("warp.nii");
        let device = Default::default();

        // [components=2, z=2, y=3, x=4]
        let values: Vec<f32> = (0..48).map(|v| v as f32).collect();
        let field = Tensor::<TestBackend, 1>::from_floats(values.as_slice(), &device).reshape([2, 2, 3, 4]);
        write_nifti_vector(&file_path, &field, &ImageMetadata::default())?;

        let volume = read_nifti_array(&file_path)?;
        assert_eq!(volume.data.shape(), &[4, 3, 2, 2]);
        // x=1, y=2, z=1, c=1 -> 24 + 12 + 8 + 1
        assert_eq!(volume.data[[1, 2, 1, 1]], 45.0);
        Ok(())
    }

    #[test]
    fn test_read_rejects_wrong_rank() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("flat.nii");
        let array = ndarray::Array2::<f32>::zeros((4, 4));
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let device = Default::default();
        assert!(read_nifti::<TestBackend, _>(&file_path, &device).is_err());
        Ok(())
    }
}
