use approx::assert_abs_diff_eq;
use image::{GrayImage, Luma};
use ndarray::{Array2, Array3};
use tempfile::TempDir;

use nanocorr_core::error::NanocorrError;
use nanocorr_core::io::image_io::{
    frame_paths, load_float_stack, load_frame_stack, load_image, normalize_map, save_float_stack,
    save_map, save_map_stack,
};

fn write_png(dir: &TempDir, name: &str, w: u32, h: u32, value: u8) {
    let img = GrayImage::from_pixel(w, h, Luma([value]));
    img.save(dir.path().join(name)).unwrap();
}

#[test]
fn test_load_frame_stack_sorted() {
    let dir = TempDir::new().unwrap();
    write_png(&dir, "frame_002.png", 6, 4, 255);
    write_png(&dir, "frame_001.png", 6, 4, 0);
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let paths = frame_paths(dir.path()).unwrap();
    assert_eq!(paths.len(), 2);

    let stack = load_frame_stack(dir.path()).unwrap();
    assert_eq!(stack.n_frames(), 2);
    assert_eq!((stack.height(), stack.width()), (4, 6));
    assert_abs_diff_eq!(stack.frame(0)[[0, 0]], 0.0);
    assert_abs_diff_eq!(stack.frame(1)[[3, 5]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    let err = load_frame_stack(dir.path()).unwrap_err();
    assert!(matches!(err, NanocorrError::EmptySequence));
}

#[test]
fn test_mismatched_frame_sizes() {
    let dir = TempDir::new().unwrap();
    write_png(&dir, "a.png", 6, 4, 10);
    write_png(&dir, "b.png", 5, 4, 10);
    let err = load_frame_stack(dir.path()).unwrap_err();
    assert!(matches!(err, NanocorrError::DimensionMismatch { .. }));
}

#[test]
fn test_save_map_tiff_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.tiff");
    let map = Array2::from_shape_fn((5, 7), |(r, c)| (r * 7 + c) as f32 - 10.0);

    save_map(&map, &path).unwrap();
    let loaded = load_image(&path).unwrap();
    let expected = normalize_map(&map);

    assert_eq!(loaded.dim(), (5, 7));
    for (a, b) in loaded.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
    }
}

#[test]
fn test_save_map_png() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.png");
    let mut map = Array2::<f32>::zeros((3, 3));
    map[[1, 1]] = 4.0;

    save_map(&map, &path).unwrap();
    let loaded = load_image(&path).unwrap();
    assert_abs_diff_eq!(loaded[[1, 1]], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(loaded[[0, 0]], 0.0);
}

#[test]
fn test_constant_map_normalizes_to_zero() {
    let map = Array2::from_elem((2, 2), 3.5f32);
    assert!(normalize_map(&map).iter().all(|&v| v == 0.0));
}

#[test]
fn test_save_map_stack_names() {
    let dir = TempDir::new().unwrap();
    let stack = Array3::from_shape_fn((3, 4, 4), |(i, r, c)| (i + r + c) as f32);
    let written = save_map_stack(&stack, &dir.path().join("windows.png")).unwrap();

    assert_eq!(written.len(), 3);
    assert!(written[2].ends_with("windows_0002.png"));
    assert!(written.iter().all(|p| p.exists()));
}

#[test]
fn test_float_stack_keeps_signed_shifts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("masks.tiff");

    // Reference channel all zeros; channel 1 uniform dx = -3 (left), dy = 2 (right).
    let mut masks = Array3::<f32>::zeros((2, 4, 8));
    masks.slice_mut(ndarray::s![1, .., ..4]).fill(-3.0);
    masks.slice_mut(ndarray::s![1, .., 4..]).fill(2.0);
    masks[[1, 2, 1]] = -0.375;

    save_float_stack(&masks, &path).unwrap();
    let loaded = load_float_stack(&path).unwrap();

    assert_eq!(loaded.dim(), (2, 4, 8));
    assert_eq!(loaded, masks);
    assert_eq!(loaded[[1, 0, 0]], -3.0);
    assert_eq!(loaded[[1, 0, 4]], 2.0);
    assert!(loaded.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 0.0));
}

#[test]
fn test_load_float_stack_rejects_integer_tiff() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.tiff");
    save_map(&Array2::from_elem((3, 3), 1.0f32), &path).unwrap();
    assert!(load_float_stack(&path).is_err());
}
