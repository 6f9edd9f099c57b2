//! Flat-file writes with atomic finalize (write `.part`, then rename).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.mp3` → `a.mp3.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Write `data` to `final_path` through a synced temp file and a rename, so a crash
/// leaves either the previous content or the new content, never a torn file.
pub fn write_atomic(final_path: &Path, data: &[u8]) -> io::Result<()> {
    let tp = temp_path(final_path);
    let result = (|| {
        let mut file = fs::File::create(&tp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tp, final_path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tp);
    }
    result
}
