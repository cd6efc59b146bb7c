mod common;

use ndarray::Array2;

use nanocorr_core::align::{find_peak, locate_max, locate_max_with};
use nanocorr_core::config::LocatorConfig;

use common::gaussian_surface;

#[test]
fn test_gaussian_between_samples() {
    let surface = gaussian_surface(21, 16, 10.5, 7.5, 2.0);
    let peak = locate_max(&surface);
    assert!((peak.row - 10.5).abs() < 0.2, "row={}", peak.row);
    assert!((peak.col - 7.5).abs() < 0.2, "col={}", peak.col);
}

#[test]
fn test_gaussian_off_grid() {
    let surface = gaussian_surface(16, 16, 6.3, 8.8, 1.8);
    let peak = locate_max(&surface);
    assert!((peak.row - 6.3).abs() < 0.2, "row={}", peak.row);
    assert!((peak.col - 8.8).abs() < 0.2, "col={}", peak.col);
}

#[test]
fn test_sharp_peak_within_one_cell() {
    let mut surface = Array2::<f32>::zeros((12, 14));
    surface[[5, 9]] = 1.0;
    let peak = locate_max(&surface);
    assert!((peak.row - 5.0).abs() <= 1.0, "row={}", peak.row);
    assert!((peak.col - 9.0).abs() <= 1.0, "col={}", peak.col);
}

#[test]
fn test_peak_on_corner_stays_in_domain() {
    let surface = gaussian_surface(8, 8, 0.0, 0.0, 1.5);
    let peak = locate_max(&surface);
    assert!((0.0..=1.0).contains(&peak.row), "row={}", peak.row);
    assert!((0.0..=1.0).contains(&peak.col), "col={}", peak.col);
}

#[test]
fn test_deterministic() {
    let surface = gaussian_surface(15, 15, 7.2, 6.6, 2.5);
    let a = locate_max(&surface);
    let b = locate_max(&surface);
    assert_eq!(a, b);
}

#[test]
fn test_single_row_returns_grid_maximum() {
    let surface = Array2::from_shape_vec((1, 5), vec![0.1, 0.4, 0.9, 0.3, 0.0]).unwrap();
    let peak = locate_max(&surface);
    assert_eq!(peak.row, 0.0);
    assert_eq!(peak.col, 2.0);
}

#[test]
fn test_single_sample_surface() {
    let surface = Array2::from_elem((1, 1), 3.0f32);
    let peak = locate_max(&surface);
    assert_eq!((peak.row, peak.col), (0.0, 0.0));
}

#[test]
fn test_tiny_budget_still_returns_point_near_seed() {
    let surface = gaussian_surface(21, 21, 10.4, 10.3, 2.0);
    let config = LocatorConfig { max_iterations: 1 };
    let peak = locate_max_with(&surface, &config);
    assert!((peak.row - 10.0).abs() <= 1.0);
    assert!((peak.col - 10.0).abs() <= 1.0);
}

#[test]
fn test_find_peak_first_occurrence() {
    let surface = Array2::from_shape_vec((2, 3), vec![1.0, 5.0, 2.0, 5.0, 0.0, f32::NAN]).unwrap();
    assert_eq!(find_peak(&surface), (0, 1, 5.0));
}
