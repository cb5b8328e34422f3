use std::collections::HashSet;
use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use nalgebra::{Rotation3, Vector3 as NaVector3};
use slicereg_core::filter::{resize_image, resize_image_with_extent, ReferenceExtent};
use slicereg_core::image::{Image, ImageMetadata};
use slicereg_core::spatial::{Direction, Direction2, Direction3, Point, Point2, Point3, Spacing2, Spacing3};
use slicereg_core::{CoreError, InterpolationKernel};

type Backend = NdArray<f32>;

fn image_2d(values: Vec<f32>, shape: [usize; 2]) -> Image<Backend, 2> {
    let metadata = ImageMetadata::new(Point2::origin(), Spacing2::uniform(1.0), Direction2::identity());
    Image::from_vec(values, shape, &metadata, &Default::default()).unwrap()
}

#[test]
fn test_identity_resample_returns_source() {
    let values: Vec<f32> = (0..25).map(|v| (v * 7 % 11) as f32).collect();
    let image = image_2d(values.clone(), [5, 5]);

    for kernel in [InterpolationKernel::Nearest, InterpolationKernel::Linear, InterpolationKernel::BSpline] {
        let resized = resize_image(&image, [5, 5], kernel).unwrap();
        assert_eq!(resized.size(), [5, 5]);
        for (got, want) in resized.to_vec().iter().zip(&values) {
            assert!((got - want).abs() < 1e-3, "{kernel}: got {got}, want {want}");
        }
    }
}

#[test]
fn test_output_has_requested_size() {
    let device = Default::default();
    let data = Tensor::<Backend, 3>::ones([6, 5, 4], &device);
    let image = Image::new(data, Point3::origin(), Spacing3::new([0.7, 1.0, 2.5]), Direction3::identity());

    let resized = resize_image(&image, [3, 7, 2], InterpolationKernel::Linear).unwrap();
    assert_eq!(resized.size(), [3, 7, 2]);
    assert_eq!(resized.shape(), [2, 7, 3]);
    assert_eq!(resized.num_voxels(), 42);
}

#[test]
fn test_upsample_spacing() {
    let device = Default::default();
    let data = Tensor::<Backend, 3>::ones([4, 4, 4], &device);
    let image = Image::new(data, Point3::origin(), Spacing3::uniform(1.0), Direction3::identity());

    let resized = resize_image(&image, [8, 8, 8], InterpolationKernel::Linear).unwrap();
    assert_eq!(resized.size(), [8, 8, 8]);
    for axis in 0..3 {
        assert!((resized.spacing()[axis] - 3.0 / 7.0).abs() < 1e-9);
    }
    assert_eq!(*resized.origin(), Point3::origin());
    assert!(resized.direction().is_identity());
}

#[test]
fn test_nearest_keeps_label_set() {
    let labels = [0.0f32, 1.0, 2.0, 5.0];
    let values: Vec<f32> = (0..42).map(|v| labels[(v * 5 + v / 3) % 4]).collect();
    let image = image_2d(values, [6, 7]);

    let resized = resize_image(&image, [11, 9], InterpolationKernel::Nearest).unwrap();
    let allowed: HashSet<u32> = labels.iter().map(|v| v.to_bits()).collect();
    for value in resized.to_vec() {
        assert!(allowed.contains(&value.to_bits()), "unexpected label {value}");
    }
}

#[test]
fn test_reference_center_maps_to_source_center() {
    let device = Default::default();
    // value = ix + 10 iy + 100 iz, linear in the source index
    let mut values = Vec::new();
    for iz in 0..4 {
        for iy in 0..5 {
            for ix in 0..6 {
                values.push((ix + 10 * iy + 100 * iz) as f32);
            }
        }
    }
    let rotation = Rotation3::from_axis_angle(&NaVector3::z_axis(), 0.5);
    let metadata = ImageMetadata::new(
        Point3::new([10.0, -3.0, 2.0]),
        Spacing3::new([1.5, 0.5, 2.0]),
        Direction(rotation.into_inner()),
    );
    let image = Image::<Backend, 3>::from_vec(values, [4, 5, 6], &metadata, &device).unwrap();

    // even sizes put the reference center on voxel (4, 3, 2)
    let resized = resize_image(&image, [8, 6, 4], InterpolationKernel::Linear).unwrap();
    let out = resized.to_vec();
    let center = 2 * 6 * 8 + 3 * 8 + 4;

    // source center index is (3, 2.5, 2)
    let expected = 3.0 + 25.0 + 200.0;
    assert!((out[center] - expected).abs() < 1e-2, "got {}", out[center]);
}

#[test]
fn test_samples_outside_source_are_zero() {
    let image = image_2d(vec![1.0; 64], [8, 8]);

    // downsampling 8 -> 4 with center alignment pushes the first row and column out
    let resized = resize_image(&image, [4, 4], InterpolationKernel::Linear).unwrap();
    let out = resized.to_vec();
    for row in 0..4 {
        for col in 0..4 {
            let value = out[row * 4 + col];
            if row == 0 || col == 0 {
                assert_eq!(value, 0.0, "({row}, {col})");
            } else {
                assert!((value - 1.0).abs() < 1e-5, "({row}, {col}) = {value}");
            }
        }
    }
}

#[test]
fn test_invalid_size() {
    let image = image_2d(vec![0.0; 16], [4, 4]);
    let err = resize_image(&image, [4, 1], InterpolationKernel::Nearest).unwrap_err();
    assert_eq!(err, CoreError::InvalidSize { axis: 1, count: 1 });
}

#[test]
fn test_single_voxel_source_axis_is_rejected() {
    let device = Default::default();
    // one z slice: the source has no physical extent along z
    let data = Tensor::<Backend, 3>::ones([1, 4, 4], &device);
    let image = Image::new(data, Point3::origin(), Spacing3::uniform(1.0), Direction3::identity());
    let err = resize_image(&image, [4, 4, 2], InterpolationKernel::Linear).unwrap_err();
    assert!(matches!(err, CoreError::InvalidSpacing(_)));

    // a wider accumulated extent covers the missing axis
    let mut extent = ReferenceExtent::new();
    extent.update(&slicereg_core::Vector::new([3.0, 3.0, 3.0]));
    let resized = resize_image_with_extent(&image, [4, 4, 2], InterpolationKernel::Linear, &mut extent).unwrap();
    assert!((resized.spacing()[2] - 3.0).abs() < 1e-9);
}

#[test]
fn test_singular_direction() {
    let device = Default::default();
    let data = Tensor::<Backend, 2>::zeros([3, 3], &device);
    let image = Image::new(data, Point::origin(), Spacing2::uniform(1.0), Direction::zeros());
    let err = resize_image(&image, [3, 3], InterpolationKernel::Linear).unwrap_err();
    assert!(matches!(err, CoreError::SingularDirection(_)));
}

#[test]
fn test_extent_accumulates_across_images() {
    let device = Default::default();
    let wide = Image::new(
        Tensor::<Backend, 2>::ones([2, 8], &device),
        Point2::origin(),
        Spacing2::uniform(1.0),
        Direction2::identity(),
    );
    let tall = Image::new(
        Tensor::<Backend, 2>::ones([4, 2], &device),
        Point2::origin(),
        Spacing2::uniform(1.0),
        Direction2::identity(),
    );

    let mut extent = ReferenceExtent::new();
    let first = resize_image_with_extent(&wide, [4, 4], InterpolationKernel::Linear, &mut extent).unwrap();
    let second = resize_image_with_extent(&tall, [4, 4], InterpolationKernel::Linear, &mut extent).unwrap();

    assert_eq!(extent.extent().to_vec(), vec![7.0, 3.0]);
    assert!((first.spacing()[0] - 7.0 / 3.0).abs() < 1e-9);
    assert!((first.spacing()[1] - 1.0 / 3.0).abs() < 1e-9);
    assert!((second.spacing()[0] - 7.0 / 3.0).abs() < 1e-9);
    assert!((second.spacing()[1] - 1.0).abs() < 1e-9);
}
