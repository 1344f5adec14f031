use path_clean::PathClean;
use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::path::Path;

/// Stable hex hash, all 64 bits.
pub fn hash_str(s: &str) -> String {
    let mut hasher = FxHasher::default();
    hasher.write(s.as_bytes());
    format!("{:016x}", hasher.finish())
}

/// Descriptor id of `filename`: a hash of its path relative to `root`, so
/// it survives content edits.
pub fn descriptor_id(root: &Path, filename: &str) -> String {
    let path = Path::new(filename);
    let relative = path.strip_prefix(root).unwrap_or(path);
    let normalized = relative.to_path_buf().clean();
    let mut id = hash_str(&normalized.to_string_lossy().replace('\\', "/"));
    id.truncate(8);
    id
}

pub fn strip_query(id: &str) -> &str {
    id.split_once('?').map_or(id, |(path, _)| path)
}

pub fn basename(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename)
}

/// Extension without the dot.
pub fn extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_descriptor_id() {
        let root = Path::new("/proj");
        let id = descriptor_id(root, "/proj/src/App.vue");
        assert_eq!(id.len(), 8);
        assert_eq!(id, descriptor_id(root, "/proj/src/../src/App.vue"));
        assert_ne!(id, descriptor_id(root, "/proj/src/Other.vue"));
    }

    #[test]
    fn test_hash_full_width() {
        let a = hash_str("\"./a.png\"");
        let b = hash_str("\"./b.png\"");
        assert_eq!(a.len(), 16);
        assert_eq!(b.len(), 16);
        assert_ne!(a, b);
        assert_eq!(a, hash_str("\"./a.png\""));
    }

    #[test]
    fn test_paths() {
        assert_eq!(strip_query("/a/b.vue?v=123"), "/a/b.vue");
        assert_eq!(strip_query("/a/b.vue"), "/a/b.vue");
        assert_eq!(basename("/a/b.vue"), "b.vue");
        assert_eq!(extension("./x.ts"), Some("ts"));
    }
}
