//! Fetches the MNIST IDX files into an on-disk cache directory.
//!
//! Files are downloaded from the CVDF mirror of the original MNIST
//! distribution, decompressed, and written into `<cache_dir>/<split>/`. A
//! file that is already present is never downloaded again.

use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dataset::{MnistError, Split};

// CVDF mirror of http://yann.lecun.com/exdb/mnist/
const MIRROR_URL: &str = "https://storage.googleapis.com/cvdf-datasets/mnist/";

/// Cached IDX file locations for one split.
pub(crate) struct SplitFiles {
    pub images: PathBuf,
    pub labels: PathBuf,
}

/// Returns the cached IDX files for `split`, downloading any that are
/// missing from `cache_dir` first.
pub(crate) fn ensure_split_files(cache_dir: &Path, split: Split) -> Result<SplitFiles, MnistError> {
    let split_dir = cache_dir.join(split.dir_name());
    if !split_dir.exists() {
        create_dir_all(&split_dir)?;
    }

    let images = download_file(split.image_file(), &split_dir)?;
    let labels = download_file(split.label_file(), &split_dir)?;

    Ok(SplitFiles { images, labels })
}

/// Downloads one gzipped IDX file and stores it decompressed, skipping the
/// download when the destination file already exists.
fn download_file(file_name: &str, dest_dir: &Path) -> Result<PathBuf, MnistError> {
    let dest = dest_dir.join(file_name);
    if dest.exists() {
        return Ok(dest);
    }

    let url = format!("{MIRROR_URL}{file_name}.gz");

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Downloading {file_name}..."));

    let response = reqwest::blocking::get(url.as_str())
        .and_then(|response| response.error_for_status())
        .map_err(|source| MnistError::Download {
            url: url.clone(),
            source,
        })?;
    let bytes = response.bytes().map_err(|source| MnistError::Download {
        url: url.clone(),
        source,
    })?;

    // Decode the gzip payload straight into the cache file
    let mut decoder = GzDecoder::new(&bytes[..]);
    let mut output = File::create(&dest)?;
    std::io::copy(&mut decoder, &mut output)?;

    spinner.finish_with_message(format!("Downloaded {file_name}"));
    Ok(dest)
}
