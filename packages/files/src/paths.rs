use std::path::{Path, PathBuf};

use crate::model::FileKey;
use crate::stage::FileStage;

/// File extension for a MIME type, falling back to `bin`.
fn extension_for(file_type: &str) -> &'static str {
    mime_guess::get_mime_extensions_str(file_type)
        .and_then(|exts| exts.first())
        .copied()
        .unwrap_or("bin")
}

/// Canonical on-disk location of one file revision.
///
/// Layout: `{base}/submissions/{submission}/{stage dir}/{name}`, where the
/// name embeds the genre designation and the full composite key:
/// `{submission}-{designation}-{fileId}-{revision}.{ext}`.
///
/// The key in the name makes paths collision-free across revisions; the
/// designation makes a genre change imply a path change, so recasting a
/// stored file relocates its bytes.
pub fn canonical_path(
    base: &Path,
    submission_id: i32,
    file_stage: FileStage,
    key: FileKey,
    designation: &str,
    file_type: &str,
) -> PathBuf {
    base.join("submissions")
        .join(submission_id.to_string())
        .join(file_stage.path_segment())
        .join(format!(
            "{submission_id}-{designation}-{key}.{}",
            extension_for(file_type)
        ))
}
