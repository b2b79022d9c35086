//! Reading the MNIST digits out of their IDX archives.
//!
//! An IDX archive is a big endian header followed by the raw bytes. The images archive has the
//! header `2051, count, rows, cols` and then `count * rows * cols` pixels, one byte each and row
//! major. The labels archive has the header `2049, count` and then one byte per label.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use log::info;

use crate::types::DatasetError;
use crate::utils::progress::styled_progress_bar;

/// The magic number every images archive starts with.
pub const IMAGES_MAGIC_NUMBER: u32 = 2051;
/// The magic number every labels archive starts with.
pub const LABELS_MAGIC_NUMBER: u32 = 2049;

// CVDF mirror of http://yann.lecun.com/exdb/mnist/
const MIRROR_URL: &str = "https://storage.googleapis.com/cvdf-datasets/mnist/";

const DOWNLOAD_TEMPLATE: &str =
    "{msg:<26} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One of the two sets of samples MNIST is published with.
pub enum Split {
    /// The 60000 training samples.
    Train,
    /// The 10000 samples kept for testing.
    Test,
}

impl Split {
    pub fn images_file_name(&self) -> &'static str {
        match self {
            Split::Train => "train-images.idx3-ubyte",
            Split::Test => "t10k-images.idx3-ubyte",
        }
    }

    pub fn labels_file_name(&self) -> &'static str {
        match self {
            Split::Train => "train-labels.idx1-ubyte",
            Split::Test => "t10k-labels.idx1-ubyte",
        }
    }

    fn archives(&self) -> [(&'static str, &'static str); 2] {
        match self {
            Split::Train => [
                ("train-images-idx3-ubyte.gz", self.images_file_name()),
                ("train-labels-idx1-ubyte.gz", self.labels_file_name()),
            ],
            Split::Test => [
                ("t10k-images-idx3-ubyte.gz", self.images_file_name()),
                ("t10k-labels-idx1-ubyte.gz", self.labels_file_name()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The decoded contents of an images archive.
pub struct IdxImages {
    pub rows: usize,
    pub cols: usize,
    /// Every image one after the other, `rows * cols` bytes each.
    pub pixels: Vec<u8>,
}

impl IdxImages {
    pub fn len(&self) -> usize {
        self.pixels.len() / (self.rows * self.cols).max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

fn read_header(bytes: &[u8], fields: usize) -> Result<Vec<u32>, DatasetError> {
    let header_size = fields * 4;
    if bytes.len() < header_size {
        return Err(DatasetError::Truncated {
            expected: header_size,
            actual: bytes.len(),
        });
    }

    Ok(bytes[..header_size]
        .chunks_exact(4)
        .map(|field| u32::from_be_bytes([field[0], field[1], field[2], field[3]]))
        .collect())
}

fn checked_size(dimensions: &[usize]) -> Result<usize, DatasetError> {
    dimensions
        .iter()
        .try_fold(1_usize, |size, dimension| size.checked_mul(*dimension))
        .ok_or_else(|| DatasetError::SizeOverflow {
            dimensions: dimensions.to_vec(),
        })
}

fn check_magic_number(expected: u32, actual: u32) -> Result<(), DatasetError> {
    if expected != actual {
        return Err(DatasetError::InvalidMagicNumber { expected, actual });
    }

    Ok(())
}

fn read_payload(bytes: &[u8], header_size: usize, size: usize) -> Result<Vec<u8>, DatasetError> {
    let expected = size
        .checked_add(header_size)
        .ok_or_else(|| DatasetError::SizeOverflow {
            dimensions: vec![size],
        })?;
    if bytes.len() < expected {
        return Err(DatasetError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }

    Ok(bytes[header_size..expected].to_vec())
}

/// Decodes an images archive that was already read into memory.
///
/// Trailing bytes after the announced payload are ignored.
pub fn parse_images(bytes: &[u8]) -> Result<IdxImages, DatasetError> {
    let header = read_header(bytes, 4)?;
    check_magic_number(IMAGES_MAGIC_NUMBER, header[0])?;

    let count = header[1] as usize;
    let rows = header[2] as usize;
    let cols = header[3] as usize;
    let pixels = read_payload(bytes, 16, checked_size(&[count, rows, cols])?)?;

    Ok(IdxImages { rows, cols, pixels })
}

/// Decodes a labels archive that was already read into memory.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>, DatasetError> {
    let header = read_header(bytes, 2)?;
    check_magic_number(LABELS_MAGIC_NUMBER, header[0])?;

    read_payload(bytes, 8, header[1] as usize)
}

fn read_archive(path: &Path) -> Result<Vec<u8>, DatasetError> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;

    Ok(bytes)
}

/// Reads and decodes the images archive at **path**.
pub fn load_images(path: impl AsRef<Path>) -> Result<IdxImages, DatasetError> {
    parse_images(&read_archive(path.as_ref())?)
}

/// Reads and decodes the labels archive at **path**.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<u8>, DatasetError> {
    parse_labels(&read_archive(path.as_ref())?)
}

#[derive(Debug, Clone, PartialEq)]
/// Grayscale digit images paired with their labels.
///
/// Every image has `rows * cols` pixels going from 0 for the background to 255 for the
/// foreground, and every label is a digit. Nothing changes once it is loaded.
pub struct MnistDataset {
    rows: usize,
    cols: usize,
    pixels: Vec<u8>,
    labels: Vec<u8>,
}

impl MnistDataset {
    /// Pairs the images of an images archive with the labels of a labels archive.
    pub fn new(images: IdxImages, labels: Vec<u8>) -> Result<MnistDataset, DatasetError> {
        MnistDataset::from_raw(images.rows, images.cols, images.pixels, labels)
    }

    /// Builds a dataset out of images already in memory, **pixels** holding every image one
    /// after the other.
    pub fn from_raw(
        rows: usize,
        cols: usize,
        pixels: Vec<u8>,
        labels: Vec<u8>,
    ) -> Result<MnistDataset, DatasetError> {
        let image_size = checked_size(&[rows, cols])?;
        if image_size == 0 || pixels.len() % image_size != 0 {
            return Err(DatasetError::SizeMismatch {
                image_size,
                pixels: pixels.len(),
            });
        }

        let images = pixels.len() / image_size;
        if images != labels.len() {
            return Err(DatasetError::CountMismatch {
                images,
                labels: labels.len(),
            });
        }

        if let Some((index, label)) = labels.iter().enumerate().find(|(_, label)| **label > 9) {
            return Err(DatasetError::InvalidLabel {
                index,
                label: *label,
            });
        }

        Ok(MnistDataset {
            rows,
            cols,
            pixels,
            labels,
        })
    }

    /// Loads the archives of a **split** from **dir**, they must be named like the ones
    /// [download] writes.
    pub fn load_from_dir(dir: impl AsRef<Path>, split: Split) -> Result<MnistDataset, DatasetError> {
        let dir = dir.as_ref();
        let images = load_images(dir.join(split.images_file_name()))?;
        let labels = load_labels(dir.join(split.labels_file_name()))?;
        let dataset = MnistDataset::new(images, labels)?;

        info!(
            "loaded {} samples of {}x{} pixels from {}",
            dataset.len(),
            dataset.rows,
            dataset.cols,
            dir.display()
        );

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The amount of pixels in every image.
    pub fn image_size(&self) -> usize {
        self.rows * self.cols
    }

    /// The pixels of the sample at **index**, row by row.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn image_at(&self, index: usize) -> &[u8] {
        let image_size = self.image_size();
        &self.pixels[index * image_size..(index + 1) * image_size]
    }

    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn label_at(&self, index: usize) -> usize {
        self.labels[index] as usize
    }

    /// Goes through every sample in order as `(pixels, label)`.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], usize)> + '_ {
        self.pixels
            .chunks_exact(self.image_size())
            .zip(self.labels.iter().map(|label| *label as usize))
    }
}

/// Downloads both splits into **dir**, creating it if needed.
///
/// Archives that already exist are left untouched, so calling this again is cheap.
pub fn download(dir: impl AsRef<Path>) -> Result<(), DatasetError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    for split in [Split::Train, Split::Test] {
        for (remote_name, file_name) in split.archives() {
            download_archive(remote_name, &dir.join(file_name))?;
        }
    }

    Ok(())
}

fn download_archive(remote_name: &str, destination: &Path) -> Result<(), DatasetError> {
    if destination.exists() {
        info!("{} already exists, skipping it", destination.display());
        return Ok(());
    }

    let url = format!("{}{}", MIRROR_URL, remote_name);
    info!("downloading {}", url);

    let response = reqwest::blocking::get(&url)?.error_for_status()?;
    let progress_bar = styled_progress_bar(response.content_length().unwrap_or(0), DOWNLOAD_TEMPLATE);
    progress_bar.set_message(remote_name.to_string());

    let inflated = inflate_archive(progress_bar.wrap_read(response), destination);
    progress_bar.finish_and_clear();
    inflated?;

    info!("saved {}", destination.display());

    Ok(())
}

/// Inflates a gzipped archive into **destination**.
///
/// The bytes go to a sibling `.part` file that is only renamed once fully inflated, and that is
/// removed if anything fails.
pub(crate) fn inflate_archive(gzipped: impl Read, destination: &Path) -> Result<(), DatasetError> {
    let partial = destination.with_extension("part");

    let inflated = File::create(&partial).and_then(|mut output| {
        std::io::copy(&mut GzDecoder::new(gzipped), &mut output)?;
        fs::rename(&partial, destination)
    });

    if let Err(err) = inflated {
        if partial.exists() {
            fs::remove_file(&partial)?;
        }
        return Err(err.into());
    }

    Ok(())
}
