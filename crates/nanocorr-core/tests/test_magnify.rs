use approx::assert_abs_diff_eq;
use ndarray::Array2;

use nanocorr_core::transform::magnify::fourier_zoom;

#[test]
fn test_constant_image_stays_constant() {
    let image = Array2::from_elem((6, 8), 0.7f32);
    let zoomed = fourier_zoom(&image, 2.0).unwrap();
    assert_eq!(zoomed.dim(), (12, 16));
    for &v in zoomed.iter() {
        assert_abs_diff_eq!(v, 0.7, epsilon = 1e-5);
    }
}

#[test]
fn test_odd_image_integer_zoom_keeps_samples() {
    let image = Array2::from_shape_fn((5, 3), |(r, c)| ((r * 3 + c) % 4) as f32 + 0.5);
    let zoomed = fourier_zoom(&image, 3.0).unwrap();
    assert_eq!(zoomed.dim(), (15, 9));
    for r in 0..5 {
        for c in 0..3 {
            assert_abs_diff_eq!(zoomed[[3 * r, 3 * c]], image[[r, c]], epsilon = 1e-4);
        }
    }
}

#[test]
fn test_unit_factor_is_identity() {
    let image = Array2::from_shape_fn((4, 5), |(r, c)| (r * 5 + c) as f32);
    let zoomed = fourier_zoom(&image, 1.0).unwrap();
    assert_eq!(zoomed.dim(), (4, 5));
    for (a, b) in zoomed.iter().zip(image.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
    }
}

#[test]
fn test_fractional_factor_shape() {
    let image = Array2::from_elem((10, 7), 1.0f32);
    let zoomed = fourier_zoom(&image, 1.5).unwrap();
    // rows: 10 + ceil(2.5) + floor(2.5); cols: 7 + ceil(1.75) + floor(1.75)
    assert_eq!(zoomed.dim(), (15, 10));
}

#[test]
fn test_factor_below_one_rejected() {
    let image = Array2::<f32>::zeros((4, 4));
    assert!(fourier_zoom(&image, 0.5).is_err());
    assert!(fourier_zoom(&image, f64::NAN).is_err());
}
