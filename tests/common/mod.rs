#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A Praat long-format TextGrid with one interval tier holding `labels`.
pub fn textgrid(labels: &[&str]) -> String {
    let mut out = String::from(
        "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\nxmin = 0 \nxmax = 10 \ntiers? <exists> \nsize = 1 \nitem []: \n    item [1]:\n        class = \"IntervalTier\" \n        name = \"words\" \n        xmin = 0 \n        xmax = 10 \n",
    );
    out.push_str(&format!("        intervals: size = {} \n", labels.len()));
    for (i, label) in labels.iter().enumerate() {
        out.push_str(&format!(
            "        intervals [{}]:\n            xmin = {} \n            xmax = {} \n            text = \"{}\" \n",
            i + 1,
            i,
            i + 1,
            label
        ));
    }
    out
}

/// Writes `content` at `root/rel`, creating directories.
pub fn put(root: &Path, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Relative paths of all files under `root`, sorted, ignoring the replay marker.
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .filter(|p| p != Path::new(speller_core::replay::REPLAY_MARKER))
        .collect();
    files.sort();
    files
}
