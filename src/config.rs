use std::path::PathBuf;

/// Environment variable naming the documents directory.
pub const BASE_DIR_ENV: &str = "WORD_FILES_PATH";
pub const DEFAULT_BASE_DIR: &str = "./word_files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_dir: PathBuf,
}

impl Config {
    /// `base_dir` comes from `--base-dir` or `WORD_FILES_PATH` (clap reads
    /// both); anything else falls back to `./word_files`.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        let base_dir = base_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));
        Self { base_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_word_files() {
        assert_eq!(Config::new(None).base_dir, PathBuf::from("./word_files"));
        assert_eq!(
            Config::new(Some(PathBuf::new())).base_dir,
            PathBuf::from("./word_files")
        );
        assert_eq!(
            Config::new(Some(PathBuf::from("/srv/docs"))).base_dir,
            PathBuf::from("/srv/docs")
        );
    }
}
