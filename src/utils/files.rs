use std::{
    fs::File,
    io::{self, BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

/// Open a file for line-by-line reading
pub fn file_reader(path: &Path) -> io::Result<Lines<BufReader<File>>> {
    let f = File::open(path)?;

    Ok(BufReader::new(f).lines())
}

/// Append a suffix to a path prefix, e.g. `data/train` + `.x.txt`
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(suffix);

    PathBuf::from(path)
}
