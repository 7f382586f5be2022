use std::path::Path;

/// The name of the file, without its directory.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Resolves a path read from a configuration file against the directory of
/// this file. Absolute paths are kept as they are.
pub fn resolve_path(root: Option<&Path>, path: &str) -> String {
    match root {
        Some(r) if Path::new(path).is_relative() => r.join(path).display().to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/data/2024/avaliacao.xlsx"), "avaliacao.xlsx");
        assert_eq!(simplify_file_name("avaliacao.xlsx"), "avaliacao.xlsx");
        assert_eq!(simplify_file_name("/"), "/");
    }

    #[test]
    fn resolved_paths() {
        let root = Path::new("/srv/reports");
        assert_eq!(
            resolve_path(Some(root), "data/a.xlsx"),
            Path::new("/srv/reports/data/a.xlsx").display().to_string()
        );
        assert_eq!(resolve_path(Some(root), "/tmp/a.xlsx"), "/tmp/a.xlsx");
        assert_eq!(resolve_path(None, "a.xlsx"), "a.xlsx");
    }
}
