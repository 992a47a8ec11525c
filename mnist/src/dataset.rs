//! MNIST dataset loader for training and testing.
//!
//! Provides functionality to load the MNIST dataset of handwritten digits
//! from the IDX files cached on disk by the download module. Pixel values are
//! normalized to the 0.0-1.0 range; labels stay as integer digits.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const IMAGE_MAGIC_NUMBER: u32 = 2051;
pub const LABEL_MAGIC_NUMBER: u32 = 2049;
pub const PIXELS_PER_IMAGE: usize = 784;
pub const NUM_CLASSES: usize = 10;

/// Which half of the dataset to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub(crate) fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }

    pub(crate) fn image_file(self) -> &'static str {
        match self {
            Split::Train => "train-images-idx3-ubyte",
            Split::Test => "t10k-images-idx3-ubyte",
        }
    }

    pub(crate) fn label_file(self) -> &'static str {
        match self {
            Split::Train => "train-labels-idx1-ubyte",
            Split::Test => "t10k-labels-idx1-ubyte",
        }
    }
}

/// Errors that can occur while acquiring or parsing MNIST data
#[derive(Debug, Error)]
pub enum MnistError {
    /// Wrapper for standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error for invalid magic numbers in MNIST files
    #[error("Invalid magic number for {kind} file: expected {expected}, got {actual}")]
    InvalidMagicNumber {
        kind: &'static str,
        expected: u32,
        actual: u32,
    },
    /// Error for mismatches between images and labels
    #[error("Data mismatch: {0}")]
    DataMismatch(String),
    /// Error for images whose pixel count is not 28x28
    #[error("Invalid image dimensions: expected {expected} pixels, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },
    /// Error for labels outside the digit range
    #[error("Invalid label {label} at index {index}: labels must be below 10")]
    InvalidLabel { index: usize, label: u8 },
    /// Error for failed dataset downloads
    #[error("Failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Container for one dataset split: flattened images and their digit labels.
#[derive(Debug)]
pub struct MnistData {
    images: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl MnistData {
    /// Creates a new `MnistData` instance from flattened images and labels.
    ///
    /// # Arguments
    /// * `images` - One vector of 784 normalized pixels per sample
    /// * `labels` - One digit (0-9) per sample
    ///
    /// # Returns
    /// * `Ok(MnistData)` if images and labels pair up and are well formed
    /// * `Err(MnistError)` on count mismatch, wrong pixel count, or a label
    ///   outside the digit range
    pub fn new(images: Vec<Vec<f64>>, labels: Vec<u8>) -> Result<Self, MnistError> {
        if images.len() != labels.len() {
            return Err(MnistError::DataMismatch(format!(
                "Number of images ({}) does not match number of labels ({})",
                images.len(),
                labels.len()
            )));
        }
        for image in &images {
            if image.len() != PIXELS_PER_IMAGE {
                return Err(MnistError::InvalidDimensions {
                    expected: PIXELS_PER_IMAGE,
                    actual: image.len(),
                });
            }
        }
        if let Some((index, &label)) = labels
            .iter()
            .enumerate()
            .find(|(_, &label)| label as usize >= NUM_CLASSES)
        {
            return Err(MnistError::InvalidLabel { index, label });
        }
        Ok(Self { images, labels })
    }

    /// Loads one split, downloading the IDX files into `cache_dir` first if
    /// they are not already present.
    pub fn load(cache_dir: impl AsRef<Path>, split: Split) -> Result<Self, MnistError> {
        let files = crate::download::ensure_split_files(cache_dir.as_ref(), split)?;

        let multi_progress = MultiProgress::new();
        let style = create_progress_style(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
        );

        let images_progress = multi_progress.add(ProgressBar::new(0));
        let labels_progress = multi_progress.add(ProgressBar::new(0));
        images_progress.set_style(style.clone());
        labels_progress.set_style(style);

        let images = read_image_file(&files.images, &images_progress)?;
        let labels = read_label_file(&files.labels, &labels_progress)?;

        Self::new(images, labels)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[must_use]
    pub fn images(&self) -> &[Vec<f64>] {
        &self.images
    }

    #[must_use]
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<(&[f64], u8)> {
        let image = self.images.get(index)?;
        let label = *self.labels.get(index)?;
        Some((image.as_slice(), label))
    }

    /// Iterates over `(pixels, label)` pairs in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], u8)> + '_ {
        self.images
            .iter()
            .map(Vec::as_slice)
            .zip(self.labels.iter().copied())
    }
}

/// Creates a progress bar style with a consistent look
pub(crate) fn create_progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .expect("Progress bar template must be valid")
        .progress_chars("##-")
}

/// Reads a 32-bit unsigned integer in big-endian format from a file
fn read_u32(file: &mut File) -> std::io::Result<u32> {
    let mut buffer = [0; 4];
    file.read_exact(&mut buffer)?;
    Ok(u32::from_be_bytes(buffer))
}

/// Reads MNIST image data from an IDX file.
///
/// # Format
/// * 32-bit magic number (2051)
/// * 32-bit number of images
/// * 32-bit number of rows
/// * 32-bit number of columns
/// * Pixels in row-major order (1 byte per pixel)
///
/// # Returns
/// * `Ok(Vec<Vec<f64>>)` containing one flattened image per sample, pixel
///   values scaled to 0.0-1.0
/// * `Err(MnistError)` if file reading fails or the format is invalid
fn read_image_file(path: &Path, progress: &ProgressBar) -> Result<Vec<Vec<f64>>, MnistError> {
    let mut file = File::open(path)?;

    let magic_number = read_u32(&mut file)?;
    if magic_number != IMAGE_MAGIC_NUMBER {
        return Err(MnistError::InvalidMagicNumber {
            kind: "images",
            expected: IMAGE_MAGIC_NUMBER,
            actual: magic_number,
        });
    }

    let num_images = read_u32(&mut file)? as usize;
    let num_rows = read_u32(&mut file)? as usize;
    let num_cols = read_u32(&mut file)? as usize;
    let pixels_per_image = num_rows * num_cols;

    if pixels_per_image != PIXELS_PER_IMAGE {
        return Err(MnistError::InvalidDimensions {
            expected: PIXELS_PER_IMAGE,
            actual: pixels_per_image,
        });
    }

    progress.set_length(num_images as u64);
    progress.set_message("Loading images...");

    let mut images = Vec::with_capacity(num_images);
    let mut buffer = vec![0u8; pixels_per_image];

    for _ in 0..num_images {
        file.read_exact(&mut buffer)?;
        let pixels = buffer
            .iter()
            .map(|&pixel| f64::from(pixel) / 255.0)
            .collect();
        images.push(pixels);
        progress.inc(1);
    }

    progress.finish_with_message("Images loaded successfully");
    Ok(images)
}

/// Reads MNIST label data from an IDX file.
///
/// # Format
/// * 32-bit magic number (2049)
/// * 32-bit number of labels
/// * Labels (1 byte per label)
fn read_label_file(path: &Path, progress: &ProgressBar) -> Result<Vec<u8>, MnistError> {
    let mut file = File::open(path)?;

    let magic_number = read_u32(&mut file)?;
    if magic_number != LABEL_MAGIC_NUMBER {
        return Err(MnistError::InvalidMagicNumber {
            kind: "labels",
            expected: LABEL_MAGIC_NUMBER,
            actual: magic_number,
        });
    }

    let num_labels = read_u32(&mut file)? as usize;
    progress.set_length(num_labels as u64);
    progress.set_message("Loading labels...");

    let mut labels = Vec::with_capacity(num_labels);
    let mut buffer = [0u8; 1];

    for _ in 0..num_labels {
        file.read_exact(&mut buffer)?;
        labels.push(buffer[0]);
        progress.inc(1);
    }

    progress.finish_with_message("Labels loaded successfully");
    Ok(labels)
}
