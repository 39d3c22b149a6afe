//! Screenshot comparison against baselines

use std::path::{Path, PathBuf};
use image::{GenericImageView, Pixel, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Result of a visual comparison
#[derive(Debug, Clone)]
pub struct VisualDiff {
    /// Whether the images match (within threshold)
    pub matches: bool,

    /// Percentage of pixels that differ
    pub diff_percent: f64,

    /// Number of different pixels
    pub diff_pixels: u64,

    /// Total pixels compared
    pub total_pixels: u64,

    /// Path to the diff image (if generated)
    pub diff_image_path: Option<PathBuf>,

    /// Hash of the actual screenshot
    pub actual_hash: String,

    /// Hash of the baseline screenshot
    pub baseline_hash: String,
}

/// Configuration for visual testing
#[derive(Debug, Clone)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,
    pub threshold: f64,
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            actual_dir: PathBuf::from("test-results/screenshots"),
            diff_dir: PathBuf::from("test-results/diffs"),
            threshold: 0.5,
            auto_update: false,
        }
    }
}

/// Compares captured screenshots against baselines
pub struct VisualTester {
    baseline_dir: PathBuf,
    actual_dir: PathBuf,
    diff_dir: PathBuf,
    threshold: f64,
    auto_update: bool,
}

impl VisualTester {
    pub fn new(config: VisualConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;

        Ok(Self {
            baseline_dir: config.baseline_dir,
            actual_dir: config.actual_dir,
            diff_dir: config.diff_dir,
            threshold: config.threshold,
            auto_update: config.auto_update,
        })
    }

    /// Compare a screenshot against its baseline
    pub fn compare(&self, name: &str, threshold: Option<f64>) -> E2eResult<VisualDiff> {
        let threshold = threshold.unwrap_or(self.threshold);

        let actual_path = self.actual_dir.join(format!("{}.png", name));
        let baseline_path = self.baseline_dir.join(format!("{}.png", name));

        if !actual_path.exists() {
            return Err(E2eError::Visual(format!(
                "Actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        if !baseline_path.exists() {
            if self.auto_update {
                info!("Adopting '{}' as baseline (update enabled)", name);
                std::fs::copy(&actual_path, &baseline_path)?;

                let actual_hash = hash_file(&actual_path)?;
                return Ok(VisualDiff {
                    matches: true,
                    diff_percent: 0.0,
                    diff_pixels: 0,
                    total_pixels: 0,
                    diff_image_path: None,
                    actual_hash: actual_hash.clone(),
                    baseline_hash: actual_hash,
                });
            }
            return Err(E2eError::BaselineNotFound(
                baseline_path.to_string_lossy().to_string(),
            ));
        }

        let actual_hash = hash_file(&actual_path)?;
        let baseline_hash = hash_file(&baseline_path)?;

        let actual_img = image::open(&actual_path)?;
        let total_pixels = (actual_img.width() as u64) * (actual_img.height() as u64);

        // Identical bytes short-circuit the pixel walk
        if actual_hash == baseline_hash {
            debug!("Screenshots match exactly (same hash)");
            return Ok(VisualDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels,
                diff_image_path: None,
                actual_hash,
                baseline_hash,
            });
        }

        let baseline_img = image::open(&baseline_path)?;

        // A resized viewport is not a partial match
        if actual_img.dimensions() != baseline_img.dimensions() {
            warn!(
                "Screenshot dimensions differ for '{}': actual {:?} vs baseline {:?}",
                name,
                actual_img.dimensions(),
                baseline_img.dimensions()
            );
            return Ok(VisualDiff {
                matches: false,
                diff_percent: 100.0,
                diff_pixels: total_pixels,
                total_pixels,
                diff_image_path: None,
                actual_hash,
                baseline_hash,
            });
        }

        let (width, height) = actual_img.dimensions();
        let actual_rgba = actual_img.to_rgba8();
        let baseline_rgba = baseline_img.to_rgba8();

        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;

        for y in 0..height {
            for x in 0..width {
                let actual_pixel = actual_rgba.get_pixel(x, y);
                let baseline_pixel = baseline_rgba.get_pixel(x, y);

                if pixels_differ(actual_pixel, baseline_pixel) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                } else {
                    // Keep the original but dimmed, so diffs stand out
                    let channels = actual_pixel.channels();
                    diff_img.put_pixel(
                        x,
                        y,
                        image::Rgba([channels[0] / 2, channels[1] / 2, channels[2] / 2, 128]),
                    );
                }
            }
        }

        let diff_percent = (diff_pixels as f64 / total_pixels as f64) * 100.0;
        let matches = diff_percent <= threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.diff_dir.join(format!("{}-diff.png", name));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "Visual regression in '{}': {:.2}% pixels differ (threshold: {:.2}%)",
                name, diff_percent, threshold
            );
        }

        Ok(VisualDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
            actual_hash,
            baseline_hash,
        })
    }

    /// Overwrite the baseline with the actual screenshot
    pub fn update_baseline(&self, name: &str) -> E2eResult<()> {
        let actual_path = self.actual_dir.join(format!("{}.png", name));
        let baseline_path = self.baseline_dir.join(format!("{}.png", name));

        if !actual_path.exists() {
            return Err(E2eError::Visual(format!(
                "Cannot update baseline: actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        std::fs::copy(&actual_path, &baseline_path)?;
        info!("Updated baseline for '{}'", name);

        Ok(())
    }

    /// List all baseline stems
    pub fn list_baselines(&self) -> E2eResult<Vec<String>> {
        let mut baselines = Vec::new();

        for entry in std::fs::read_dir(&self.baseline_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    baselines.push(name.to_string_lossy().to_string());
                }
            }
        }

        Ok(baselines)
    }
}

/// Allow small per-channel differences (anti-aliasing, compression)
fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    const TOLERANCE: i32 = 5;

    let a_channels = a.channels();
    let b_channels = b.channels();

    for i in 0..4 {
        let diff = (a_channels[i] as i32 - b_channels[i] as i32).abs();
        if diff > TOLERANCE {
            return true;
        }
    }

    false
}

fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn tester(root: &Path, auto_update: bool) -> VisualTester {
        VisualTester::new(VisualConfig {
            baseline_dir: root.join("baselines"),
            actual_dir: root.join("screenshots"),
            diff_dir: root.join("diffs"),
            threshold: 0.5,
            auto_update,
        })
        .unwrap()
    }

    fn write_png(path: &Path, width: u32, height: u32, color: Rgba<u8>) {
        let img = RgbaImage::from_pixel(width, height, color);
        img.save(path).unwrap();
    }

    #[test]
    fn test_identical_images_match() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        let color = Rgba([10, 20, 30, 255]);
        write_png(&dir.path().join("screenshots/quiz.png"), 20, 20, color);
        write_png(&dir.path().join("baselines/quiz.png"), 20, 20, color);

        let diff = t.compare("quiz", None).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
        assert_eq!(diff.actual_hash, diff.baseline_hash);
    }

    #[test]
    fn test_different_images_fail_and_write_diff() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        write_png(
            &dir.path().join("screenshots/quiz.png"),
            20,
            20,
            Rgba([255, 255, 255, 255]),
        );
        write_png(
            &dir.path().join("baselines/quiz.png"),
            20,
            20,
            Rgba([0, 0, 0, 255]),
        );

        let diff = t.compare("quiz", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_percent, 100.0);
        assert!(diff.diff_image_path.unwrap().exists());
    }

    #[test]
    fn test_small_channel_noise_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        write_png(
            &dir.path().join("screenshots/quiz.png"),
            20,
            20,
            Rgba([100, 100, 100, 255]),
        );
        write_png(
            &dir.path().join("baselines/quiz.png"),
            20,
            20,
            Rgba([103, 98, 101, 255]),
        );

        let diff = t.compare("quiz", None).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
    }

    #[test]
    fn test_dimension_mismatch_is_total_failure() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        let color = Rgba([10, 20, 30, 255]);
        write_png(&dir.path().join("screenshots/stats.png"), 20, 20, color);
        write_png(&dir.path().join("baselines/stats.png"), 10, 20, color);

        let diff = t.compare("stats", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_percent, 100.0);
    }

    #[test]
    fn test_missing_baseline_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        write_png(
            &dir.path().join("screenshots/quiz.png"),
            20,
            20,
            Rgba([1, 2, 3, 255]),
        );

        assert!(matches!(
            t.compare("quiz", None),
            Err(E2eError::BaselineNotFound(_))
        ));
    }

    #[test]
    fn test_missing_baseline_adopted_when_updating() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), true);

        write_png(
            &dir.path().join("screenshots/quiz.png"),
            20,
            20,
            Rgba([1, 2, 3, 255]),
        );

        let diff = t.compare("quiz", None).unwrap();
        assert!(diff.matches);
        assert!(dir.path().join("baselines/quiz.png").exists());
    }
}
