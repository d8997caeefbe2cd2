//! Assemble a `TrainingSet` from a directory of face images.
//!
//! Files are taken in natural order of their names (`2.ppm` before `10.ppm`)
//! and grouped into classes of K consecutive images, so a database laid out as
//! `1..=K` for person 0, `K+1..=2K` for person 1, … trains as expected.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::TrainingSet;
use crate::error::FaceError;
use crate::io::raster::{FaceImage, is_image_path, load_image};

/// A training set plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDatabase {
    pub set: TrainingSet,
    /// Source file of each training column.
    pub files: Vec<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// One name per class: the stem of the class's first file.
    pub labels: Vec<String>,
}

/// Compare two strings, treating runs of ASCII digits as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut ai);
                let nb = take_digits(&mut bi);
                // Compare by magnitude first (length without leading zeros),
                // then lexically, then by raw length so "01" sorts after "1".
                let ta = na.trim_start_matches('0');
                let tb = nb.trim_start_matches('0');
                let ord = ta
                    .len()
                    .cmp(&tb.len())
                    .then_with(|| ta.cmp(tb))
                    .then_with(|| na.len().cmp(&nb.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = it.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        out.push(c);
        it.next();
    }
    out
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Image files directly inside `dir`, in natural order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, FaceError> {
    let entries = fs::read_dir(dir).map_err(|e| FaceError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FaceError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_image_path(&path) {
            files.push(path);
        } else {
            warn!(file = %path.display(), "skipping non-image file");
        }
    }

    files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    Ok(files)
}

/// Load every image in `dir` and build a training set with `class_population`
/// images per class.
///
/// All images must share one size; when `expected` is given it must be that size.
pub fn load_training_set(
    dir: &Path,
    class_population: usize,
    expected: Option<(u32, u32)>,
) -> Result<LoadedDatabase, FaceError> {
    let files = list_images(dir)?;
    if files.is_empty() {
        return Err(FaceError::invalid_training_set(format!(
            "no images found in '{}'",
            dir.display()
        )));
    }

    // Check the partition before decoding anything.
    if class_population == 0 || files.len() % class_population != 0 {
        return Err(FaceError::invalid_training_set(format!(
            "{} images in '{}' cannot be split into classes of {class_population}",
            files.len(),
            dir.display()
        )));
    }

    let mut dims = expected;
    let mut vectors = Vec::with_capacity(files.len());
    for path in &files {
        let FaceImage { width, height, pixels } = load_image(path, dims)?;
        if dims.is_none() {
            dims = Some((width, height));
        }
        vectors.push(pixels);
    }
    let (width, height) = dims.unwrap_or((0, 0));
    debug!(images = files.len(), width, height, "training images decoded");

    let set = TrainingSet::from_vectors(&vectors, class_population)?;
    let labels = files
        .chunks(class_population)
        .map(|chunk| file_stem(&chunk[0]))
        .collect();

    Ok(LoadedDatabase {
        set,
        files,
        width,
        height,
        labels,
    })
}
