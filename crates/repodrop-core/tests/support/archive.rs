use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write a zip with the given file entries; parent directories are implicit.
pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let file = File::create(path).expect("create zip file");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in files {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(contents.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip");
}

/// Names of the entries directly inside `dir`.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
