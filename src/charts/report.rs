//! Report Sheet Module
//! Tiles rendered chart images onto a single two-column report sheet.

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use std::path::Path;

use crate::charts::ChartError;

const COLUMNS: u32 = 2;
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Compose rendered chart PNGs into one sheet, two charts per row.
///
/// Every image is scaled to the cell width; each row is as tall as its
/// tallest image. `sheet_width` is the total output width in pixels.
pub fn compose_report<P: AsRef<Path>>(
    images: &[P],
    sheet_width: u32,
    path: &Path,
) -> Result<(), ChartError> {
    if images.is_empty() {
        return Err(ChartError::InvalidInput("no images to compose".into()));
    }
    if sheet_width < 200 {
        return Err(ChartError::InvalidInput("sheet width too small".into()));
    }

    let margin = sheet_width / 40;
    let gap = sheet_width / 60;
    let cell_width = (sheet_width - 2 * margin - (COLUMNS - 1) * gap) / COLUMNS;

    let mut scaled: Vec<RgbaImage> = Vec::with_capacity(images.len());
    for image_path in images {
        let decoded = image::open(image_path)?.to_rgba8();
        let height = (decoded.height() as u64 * cell_width as u64 / decoded.width().max(1) as u64)
            .max(1) as u32;
        scaled.push(imageops::resize(
            &decoded,
            cell_width,
            height,
            FilterType::Triangle,
        ));
    }

    let rows: Vec<&[RgbaImage]> = scaled.chunks(COLUMNS as usize).collect();
    let total_height: u32 = rows
        .iter()
        .map(|row| row.iter().map(|img| img.height()).max().unwrap_or(0) + gap)
        .sum::<u32>()
        + 2 * margin
        - gap;

    let mut sheet = RgbaImage::from_pixel(sheet_width, total_height, WHITE);
    let mut y = margin;
    for row in rows {
        let row_height = row.iter().map(|img| img.height()).max().unwrap_or(0);
        for (i, img) in row.iter().enumerate() {
            let x = margin + i as u32 * (cell_width + gap);
            // center vertically within the row
            let offset = (row_height - img.height()) / 2;
            imageops::overlay(&mut sheet, img, x as i64, (y + offset) as i64);
        }
        y += row_height + gap;
    }

    sheet.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &tempfile::TempDir, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn composes_three_images_into_two_rows() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![
            write_png(&dir, "a.png", 400, 300),
            write_png(&dir, "b.png", 400, 200),
            write_png(&dir, "c.png", 300, 300),
        ];

        let out = dir.path().join("report.png");
        compose_report(&images, 1200, &out).unwrap();

        let sheet = image::open(&out).unwrap().to_rgba8();
        assert_eq!(sheet.width(), 1200);
        assert!(sheet.height() > 0);
    }

    #[test]
    fn empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = compose_report(&Vec::<std::path::PathBuf>::new(), 1200, &dir.path().join("r.png"));
        assert!(matches!(result, Err(ChartError::InvalidInput(_))));
    }
}
