use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use ndarray::{s, Array2, Array3, Axis};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype::Gray32Float, TiffEncoder};
use tracing::debug;

use crate::error::{NanocorrError, Result};
use crate::frame::FrameStack;

/// File extensions recognised as frames when loading a directory.
const FRAME_EXTENSIONS: [&str; 5] = ["tif", "tiff", "png", "jpg", "jpeg"];

/// Load a grayscale image into an array with values in [0, 1].
pub fn load_image(path: &Path) -> Result<Array2<f32>> {
    let img = image::open(path)?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let mut data = Array2::<f32>::zeros((h as usize, w as usize));

    for row in 0..h as usize {
        for col in 0..w as usize {
            let pixel = gray.get_pixel(col as u32, row as u32);
            data[[row, col]] = pixel.0[0] as f32 / 65535.0;
        }
    }

    Ok(data)
}

/// List the frame files of a directory, sorted by file name.
pub fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load the given frame files, in order, into a stack.
pub fn load_frames(paths: &[PathBuf]) -> Result<FrameStack> {
    let frames = paths
        .iter()
        .map(|p| load_image(p))
        .collect::<Result<Vec<_>>>()?;
    FrameStack::from_frames(&frames)
}

/// Load every frame file in `dir` (sorted by name) into a stack.
pub fn load_frame_stack(dir: &Path) -> Result<FrameStack> {
    let paths = frame_paths(dir)?;
    if paths.is_empty() {
        return Err(NanocorrError::EmptySequence);
    }
    debug!(dir = %dir.display(), frames = paths.len(), "Loading frame stack");
    load_frames(&paths)
}

/// Linearly rescale a map to [0, 1]. Constant maps become all zeros.
pub fn normalize_map(map: &Array2<f32>) -> Array2<f32> {
    let (min, max) = map
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= f32::EPSILON {
        return Array2::zeros(map.dim());
    }
    map.mapv(|v| if v.is_finite() { (v - min) / range } else { 0.0 })
}

/// Save a map as 16-bit grayscale TIFF, rescaled to the full range.
pub fn save_map_tiff(map: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = map.dim();
    let normalized = normalize_map(map);

    let pixels: Vec<u16> = normalized
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 65535.0) as u16)
        .collect();

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or(NanocorrError::InvalidDimensions {
            width: w,
            height: h,
        })?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a map as 8-bit grayscale PNG, rescaled to the full range.
pub fn save_map_png(map: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = map.dim();
    let normalized = normalize_map(map);

    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &v) in normalized.indexed_iter() {
        img.put_pixel(col as u32, row as u32, Luma([(v.clamp(0.0, 1.0) * 255.0) as u8]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a map, choosing the format from the file extension (TIFF by default).
pub fn save_map(map: &Array2<f32>, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_map_png(map, path),
        _ => save_map_tiff(map, path),
    }
}

/// Save each slice of a (n, h, w) stack next to `path` as `<stem>_<i>.<ext>`.
pub fn save_map_stack(stack: &Array3<f32>, path: &Path) -> Result<Vec<PathBuf>> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("map")
        .to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("tiff")
        .to_string();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut written = Vec::with_capacity(stack.len_of(Axis(0)));
    for (i, slice) in stack.axis_iter(Axis(0)).enumerate() {
        let out = parent.join(format!("{}_{:04}.{}", stem, i, ext));
        save_map(&slice.to_owned(), &out)?;
        written.push(out);
    }
    Ok(written)
}

/// Write a (n, h, w) stack as one multi-page 32-bit float TIFF.
///
/// Values are stored unscaled, so signed shifts and similarity scores
/// survive a round trip.
pub fn save_float_stack(stack: &Array3<f32>, path: &Path) -> Result<()> {
    let (n, h, w) = stack.dim();
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;

    for page in 0..n {
        let data: Vec<f32> = stack.slice(s![page, .., ..]).iter().copied().collect();
        encoder.write_image::<Gray32Float>(w as u32, h as u32, &data)?;
    }

    debug!(path = %path.display(), pages = n, "Saved float stack");
    Ok(())
}

/// Read a multi-page 32-bit float TIFF written by [`save_float_stack`].
pub fn load_float_stack(path: &Path) -> Result<Array3<f32>> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let (w, h) = decoder.dimensions()?;
    let (h, w) = (h as usize, w as usize);

    let mut pages = Vec::new();
    loop {
        let page_dim = decoder.dimensions()?;
        if page_dim != (w as u32, h as u32) {
            return Err(NanocorrError::DimensionMismatch {
                expected: format!("{}x{}", w, h),
                found: format!("{}x{} (page {})", page_dim.0, page_dim.1, pages.len()),
            });
        }
        match decoder.read_image()? {
            DecodingResult::F32(buf) => pages.push(buf),
            _ => {
                return Err(NanocorrError::InvalidArgument(format!(
                    "{} is not a 32-bit float TIFF",
                    path.display()
                )))
            }
        }
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let n = pages.len();
    Array3::from_shape_vec((n, h, w), pages.concat()).map_err(|_| {
        NanocorrError::InvalidDimensions {
            width: w,
            height: h,
        }
    })
}
