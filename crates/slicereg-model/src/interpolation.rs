use burn::tensor::{backend::Backend, Int, Tensor};

/// Bilinear interpolation for 2D tensors with zero padding.
///
/// Corners that fall outside the image contribute nothing, so sampling far
/// outside the field of view returns 0.
///
/// # Arguments
/// * `image` - Input image [B, C, H, W]
/// * `grid` - Sampling grid [B, 2, H, W] in voxel coordinates (y, x)
///
/// # Returns
/// * Interpolated image [B, C, H, W]
pub fn bilinear_interpolation<B: Backend>(image: Tensor<B, 4>, grid: Tensor<B, 4>) -> Tensor<B, 4> {
    let [b, c, h, w] = image.dims();
    let [_, _, gh, gw] = grid.dims();

    let y = grid.clone().slice([0..b, 0..1, 0..gh, 0..gw]);
    let x = grid.slice([0..b, 1..2, 0..gh, 0..gw]);

    let y0 = y.clone().floor();
    let y1 = y0.clone().add_scalar(1.0);
    let x0 = x.clone().floor();
    let x1 = x0.clone().add_scalar(1.0);

    let wy1 = y.sub(y0.clone());
    let wy0 = wy1.clone().neg().add_scalar(1.0);
    let wx1 = x.sub(x0.clone());
    let wx0 = wx1.clone().neg().add_scalar(1.0);

    // 1 where the corner lies inside the image
    let inside = |v: &Tensor<B, 4>, len: usize| -> Tensor<B, 4> {
        v.clone().greater_equal_elem(0.0).float() * v.clone().lower_equal_elem((len - 1) as f32).float()
    };
    let wy0 = wy0 * inside(&y0, h);
    let wy1 = wy1 * inside(&y1, h);
    let wx0 = wx0 * inside(&x0, w);
    let wx1 = wx1 * inside(&x1, w);

    let y0_idx = y0.clamp(0.0, (h - 1) as f32).int();
    let y1_idx = y1.clamp(0.0, (h - 1) as f32).int();
    let x0_idx = x0.clamp(0.0, (w - 1) as f32).int();
    let x1_idx = x1.clamp(0.0, (w - 1) as f32).int();

    // Flatten image once: [B, C, H*W]
    let flat_img = image.reshape([b, c, h * w]);
    let stride_h = w as i32;
    let y0_off = y0_idx.mul_scalar(stride_h);
    let y1_off = y1_idx.mul_scalar(stride_h);

    let gather_val = |idx: Tensor<B, 4, Int>| -> Tensor<B, 4> {
        let flat_idx = idx.reshape([b, 1, gh * gw]).repeat(&[1, c, 1]);
        flat_img.clone().gather(2, flat_idx).reshape([b, c, gh, gw])
    };

    let v00 = gather_val(y0_off.clone() + x0_idx.clone());
    let v01 = gather_val(y0_off + x1_idx.clone());
    let v10 = gather_val(y1_off.clone() + x0_idx);
    let v11 = gather_val(y1_off + x1_idx);

    // Interpolate X first, then Y
    let top = v00 * wx0.clone() + v01 * wx1.clone();
    let bottom = v10 * wx0 + v11 * wx1;
    top * wy0 + bottom * wy1
}
