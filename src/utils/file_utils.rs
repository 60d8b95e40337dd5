use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants;

/// Files directly inside `dir` whose name ends with `.<ext>` for one of
/// `extensions`, ignoring case. Not recursive; order is whatever the
/// directory listing yields.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let files = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_allowed_extension(path, extensions))
        .collect();

    Ok(files)
}

/// Suffix match on the whole file name, so a bare `.MP4` counts too.
pub fn has_allowed_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    let name = name.to_ascii_lowercase();
    allowed.iter().any(|allowed_ext| {
        let suffix = format!(".{}", allowed_ext.trim_start_matches('.').to_ascii_lowercase());
        name.ends_with(&suffix)
    })
}

/// `<dir>/<stem>.json` next to the video.
pub fn output_path_for(video: &Path) -> PathBuf {
    video.with_extension(constants::OUTPUT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, File};

    #[test]
    fn test_list_files_filters_case_insensitively() {
        let dir = std::env::temp_dir().join("motion_extract_test_list_files");
        let _ = fs::remove_dir_all(&dir);
        create_dir_all(dir.join("nested.mp4")).unwrap();
        create_dir_all(dir.join("sub")).unwrap();
        for name in ["a.mp4", "B.MOV", "c.Mkv", "d.avi", "notes.txt", "clip.json", "sub/e.mp4"] {
            File::create(dir.join(name)).unwrap();
        }

        let mut names: Vec<String> = list_files(&dir, constants::VIDEO_EXTENSIONS)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec!["B.MOV", "a.mp4", "c.Mkv", "d.avi"]);
    }

    #[test]
    fn test_list_files_missing_dir_is_error() {
        let dir = std::env::temp_dir().join("motion_extract_test_no_such_dir");
        let _ = fs::remove_dir_all(&dir);
        assert!(list_files(&dir, constants::VIDEO_EXTENSIONS).is_err());
    }

    #[test]
    fn test_dot_only_name_is_discovered() {
        let dir = std::env::temp_dir().join("motion_extract_test_dot_name");
        let _ = fs::remove_dir_all(&dir);
        create_dir_all(&dir).unwrap();
        File::create(dir.join(".MP4")).unwrap();
        File::create(dir.join("ok.mp4")).unwrap();

        let found = list_files(&dir, constants::VIDEO_EXTENSIONS).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(output_path_for(&dir.join(".MP4")), dir.join(".MP4.json"));
    }

    #[test]
    fn test_extension_with_leading_dot_is_accepted() {
        assert!(has_allowed_extension(Path::new("x.MP4"), &[".mp4"]));
        assert!(!has_allowed_extension(Path::new("mp4"), &["mp4"]));
        assert!(!has_allowed_extension(Path::new("clip.xmp4"), &["mp4"]));
    }

    #[test]
    fn test_output_path_replaces_extension() {
        assert_eq!(
            output_path_for(Path::new("/data/run.1.MP4")),
            PathBuf::from("/data/run.1.json")
        );
    }
}
