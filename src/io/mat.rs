//! Legacy binary matrix files (`*.mat`).
//!
//! Layout: `i32 rows`, `i32 cols` (little-endian), then `rows·cols` `f64`
//! values in row-major order. A training run is exported as five files:
//!
//! - `m.mat`: N×1 training mean
//! - `Inverse_V_PCA.mat`: (P−C)×N transposed PCA basis
//! - `Inverse_V_Fisher.mat`: (C−1)×(P−C) transposed Fisher basis
//! - `v_fisherT_x_v_pcaT.mat`: (C−1)×N combined transform
//! - `ProjectedImages_Fisher.mat`: (C−1)×P projected training vectors
//!
//! Legacy recognizers refuse to start unless all five are present.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::Model;
use crate::error::FaceError;
use crate::fit::Training;

pub const MEAN_FILE: &str = "m.mat";
pub const INVERSE_PCA_FILE: &str = "Inverse_V_PCA.mat";
pub const INVERSE_FISHER_FILE: &str = "Inverse_V_Fisher.mat";
pub const COMBINED_FILE: &str = "v_fisherT_x_v_pcaT.mat";
pub const PROJECTED_FILE: &str = "ProjectedImages_Fisher.mat";

/// Every file written by [`export_legacy`].
pub const LEGACY_FILES: [&str; 5] = [
    MEAN_FILE,
    INVERSE_PCA_FILE,
    INVERSE_FISHER_FILE,
    COMBINED_FILE,
    PROJECTED_FILE,
];

const HEADER_BYTES: u64 = 8;

/// Write one matrix in the legacy layout.
pub fn write_matrix(path: &Path, m: &DMatrix<f64>) -> Result<(), FaceError> {
    let rows = i32::try_from(m.nrows())
        .map_err(|_| FaceError::Model(format!("{} rows do not fit the .mat header", m.nrows())))?;
    let cols = i32::try_from(m.ncols())
        .map_err(|_| FaceError::Model(format!("{} columns do not fit the .mat header", m.ncols())))?;

    let file = File::create(path).map_err(|e| FaceError::io(path, e))?;
    let mut w = BufWriter::new(file);
    let mut put = |bytes: &[u8]| w.write_all(bytes).map_err(|e| FaceError::io(path, e));

    put(&rows.to_le_bytes())?;
    put(&cols.to_le_bytes())?;
    for row in m.row_iter() {
        for x in row.iter() {
            put(&x.to_le_bytes())?;
        }
    }
    w.flush().map_err(|e| FaceError::io(path, e))
}

/// Read one matrix in the legacy layout.
///
/// The file length must match the header exactly; it is checked before the
/// matrix is allocated.
pub fn read_matrix(path: &Path) -> Result<DMatrix<f64>, FaceError> {
    let file = File::open(path).map_err(|e| FaceError::io(path, e))?;
    let file_len = file.metadata().map_err(|e| FaceError::io(path, e))?.len();
    let mut r = BufReader::new(file);

    let mut word = [0u8; 4];
    r.read_exact(&mut word).map_err(|e| FaceError::io(path, e))?;
    let rows = i32::from_le_bytes(word);
    r.read_exact(&mut word).map_err(|e| FaceError::io(path, e))?;
    let cols = i32::from_le_bytes(word);

    let (rows, cols) = match (usize::try_from(rows), usize::try_from(cols)) {
        (Ok(r), Ok(c)) => (r, c),
        _ => {
            return Err(FaceError::Model(format!(
                "'{}' has a negative shape {rows}x{cols}",
                path.display()
            )));
        }
    };

    // Both factors fit in i32, so the product fits in u64.
    let expected = HEADER_BYTES + (rows as u64) * (cols as u64) * 8;
    if file_len != expected {
        return Err(FaceError::Model(format!(
            "'{}' is {file_len} bytes, a {rows}x{cols} matrix needs {expected}",
            path.display()
        )));
    }

    let mut m = crate::math::alloc_zeros(rows, cols)?;
    let mut value = [0u8; 8];
    for i in 0..rows {
        for j in 0..cols {
            r.read_exact(&mut value).map_err(|e| FaceError::io(path, e))?;
            m[(i, j)] = f64::from_le_bytes(value);
        }
    }
    Ok(m)
}

/// Export the five legacy matrices of a training run into `dir`.
pub fn export_legacy(dir: &Path, training: &Training) -> Result<(), FaceError> {
    fs::create_dir_all(dir).map_err(|e| FaceError::io(dir, e))?;
    let model = &training.model;

    let mean = DMatrix::from_column_slice(model.pixels(), 1, model.mean().as_slice());
    write_matrix(&dir.join(MEAN_FILE), &mean)?;
    write_matrix(&dir.join(INVERSE_PCA_FILE), &training.pca.basis.transpose())?;
    write_matrix(&dir.join(INVERSE_FISHER_FILE), &training.fisher.basis.transpose())?;
    write_matrix(&dir.join(COMBINED_FILE), model.combined())?;
    write_matrix(&dir.join(PROJECTED_FILE), model.projected())?;

    debug!(dir = %dir.display(), "legacy matrices exported");
    Ok(())
}

/// Rebuild a model from the legacy files in `dir`.
///
/// All five files must be present and agree in shape. The files carry no
/// class population, so the caller supplies it.
pub fn import_legacy(dir: &Path, class_population: usize) -> Result<Model, FaceError> {
    let mean = read_matrix(&dir.join(MEAN_FILE))?;
    if mean.ncols() != 1 {
        return Err(FaceError::Model(format!(
            "{MEAN_FILE} must be a column vector, got {}x{}",
            mean.nrows(),
            mean.ncols()
        )));
    }
    let mean = DVector::from_column_slice(mean.as_slice());
    let inverse_pca = read_matrix(&dir.join(INVERSE_PCA_FILE))?;
    let inverse_fisher = read_matrix(&dir.join(INVERSE_FISHER_FILE))?;
    let combined = read_matrix(&dir.join(COMBINED_FILE))?;
    let projected = read_matrix(&dir.join(PROJECTED_FILE))?;

    if inverse_pca.ncols() != mean.len() {
        return Err(FaceError::Model(format!(
            "{INVERSE_PCA_FILE} is {}x{} but the mean has {} pixels",
            inverse_pca.nrows(),
            inverse_pca.ncols(),
            mean.len()
        )));
    }
    if inverse_fisher.shape() != (combined.nrows(), inverse_pca.nrows()) {
        return Err(FaceError::Model(format!(
            "{INVERSE_FISHER_FILE} is {}x{}, expected {}x{}",
            inverse_fisher.nrows(),
            inverse_fisher.ncols(),
            combined.nrows(),
            inverse_pca.nrows()
        )));
    }

    Model::new(mean, combined, projected, class_population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fisherface-mat-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn header_and_row_major_body() {
        let dir = scratch_dir("layout");
        let path = dir.join("a.mat");
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        write_matrix(&path, &m).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 8 + 6 * 8);
        assert_eq!(&bytes[0..4], &2i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &3i32.to_le_bytes());
        // Second stored value is (0, 1), not (1, 0).
        assert_eq!(&bytes[16..24], &2.0f64.to_le_bytes());

        assert_eq!(read_matrix(&path).unwrap(), m);
        fs::remove_dir_all(&dir).ok();
    }

    fn write_raw(path: &Path, rows: i32, cols: i32, values: &[f64]) {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&rows.to_le_bytes());
        bytes.extend_from_slice(&cols.to_le_bytes());
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        fs::write(path, bytes).unwrap();
    }

    fn training() -> Training {
        use crate::config::TrainConfig;
        use crate::data::synthetic::{SyntheticSpec, generate};

        let data = generate(&SyntheticSpec::default()).unwrap();
        crate::fit::train(&data.training, &TrainConfig::default()).unwrap()
    }

    #[test]
    fn truncated_body_is_rejected() {
        let dir = scratch_dir("short");
        let path = dir.join("short.mat");
        write_raw(&path, 2, 2, &[1.0]);

        assert!(matches!(read_matrix(&path), Err(FaceError::Model(_))));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let dir = scratch_dir("long");
        let path = dir.join("long.mat");
        write_raw(&path, 1, 1, &[1.0, 2.0]);

        assert!(matches!(read_matrix(&path), Err(FaceError::Model(_))));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn huge_header_fails_before_allocating() {
        let dir = scratch_dir("huge");
        let path = dir.join("huge.mat");
        // 100000 x 100000 doubles would be 80 GB.
        write_raw(&path, 100_000, 100_000, &[0.0]);

        let err = read_matrix(&path).unwrap_err();
        assert!(matches!(err, FaceError::Model(_)));
        assert!(err.to_string().contains("needs 80000000008"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn negative_shape_is_rejected() {
        let dir = scratch_dir("negative");
        let path = dir.join("neg.mat");
        write_raw(&path, -1, 2, &[]);

        assert!(matches!(read_matrix(&path), Err(FaceError::Model(_))));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn export_writes_all_five_files_with_bases() {
        let dir = scratch_dir("five");
        let t = training();
        export_legacy(&dir, &t).unwrap();

        for name in LEGACY_FILES {
            assert!(dir.join(name).is_file(), "{name} missing");
        }
        let inverse_pca = read_matrix(&dir.join(INVERSE_PCA_FILE)).unwrap();
        let inverse_fisher = read_matrix(&dir.join(INVERSE_FISHER_FILE)).unwrap();
        assert_eq!(inverse_pca, t.pca.basis.transpose());
        assert_eq!(inverse_fisher, t.fisher.basis.transpose());

        // The two inverse factors compose into the stored combined transform.
        let combined = &inverse_fisher * &inverse_pca;
        let scale = t.model.combined().amax().max(1.0);
        assert!((combined - t.model.combined()).amax() < 1e-9 * scale);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn export_then_import_rebuilds_the_model() {
        let dir = scratch_dir("model");
        let t = training();
        export_legacy(&dir, &t).unwrap();

        let loaded = import_legacy(&dir, t.model.class_population()).unwrap();
        assert_eq!(loaded.mean(), t.model.mean());
        assert_eq!(loaded.combined(), t.model.combined());
        assert_eq!(loaded.projected(), t.model.projected());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn import_requires_every_file() {
        let dir = scratch_dir("missing");
        export_legacy(&dir, &training()).unwrap();
        fs::remove_file(dir.join(INVERSE_FISHER_FILE)).unwrap();

        let err = import_legacy(&dir, 4).unwrap_err();
        assert!(matches!(err, FaceError::Io { .. }));
        fs::remove_dir_all(&dir).ok();
    }
}
