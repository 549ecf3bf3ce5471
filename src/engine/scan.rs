// Directory listing for the input file browser

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions accepted as transcode inputs.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "mov", "avi", "ts", "m2ts", "wmv", "flv", "mpg", "mpeg",
];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Entries shown by the browser: subdirectories plus video files, one level
/// deep, directories first, both sorted by name.
pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path().to_path_buf();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        if entry.file_type().is_dir() {
            dirs.push(path);
        } else if is_video_file(&path) {
            files.push(path);
        }
    }

    dirs.sort();
    files.sort();
    dirs.extend(files);
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("test.mp4")));
        assert!(is_video_file(Path::new("test.MP4")));
        assert!(is_video_file(Path::new("test.mkv")));
        assert!(is_video_file(Path::new("test.mov")));

        assert!(!is_video_file(Path::new("test.txt")));
        assert!(!is_video_file(Path::new("test.png")));
        assert!(!is_video_file(Path::new("test")));
    }

    #[test]
    fn test_list_dir_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mp4"), b"v").unwrap();
        fs::write(dir.path().join("a.mkv"), b"v").unwrap();
        fs::write(dir.path().join("notes.txt"), b"t").unwrap();
        fs::write(dir.path().join(".hidden.mp4"), b"v").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let entries = list_dir(dir.path());
        let names: Vec<_> = entries
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["sub", "a.mkv", "b.mp4"]);
    }
}
