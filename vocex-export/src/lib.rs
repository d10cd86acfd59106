pub mod bundle;
pub mod table;
pub mod wav;

pub use bundle::{bundle_name, package};
pub use table::write_table;
pub use wav::encode_wav;

use thiserror::Error;

/// Failures while turning a finished session into its export bundle.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("archive packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("metadata serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
