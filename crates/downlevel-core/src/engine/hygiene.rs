/*!
# Fresh Name Allocation

Synthesizes temporary variable names that are unique within a file. The
allocator lives for a whole multi-file run; its counters restart whenever the
file it is asked about differs from the last one it saw.
*/

use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::FileId;

#[derive(Debug, Default)]
pub struct FreshNameAllocator {
    current_file: Option<FileId>,
    counters: HashMap<String, u64>,
    // Every name handed out in the current file, across all prefixes
    issued: HashSet<String>,
}

impl FreshNameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next `prefix<N>` name for `file`
    ///
    /// Skips names listed in `reserved` and names already handed out in this
    /// file under any prefix, so overlapping prefixes such as `t` and `t1`
    /// never produce the same variable.
    pub fn allocate(&mut self, file: &FileId, prefix: &str, reserved: &HashSet<String>) -> String {
        self.observe(file);

        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let name = format!("{prefix}{counter}");
            if !reserved.contains(&name) && !self.issued.contains(&name) {
                trace!(file = %file, name = %name, "allocated fresh name");
                self.issued.insert(name.clone());
                return name;
            }
        }
    }

    // The first observation counts as a file change too
    fn observe(&mut self, file: &FileId) {
        if self.current_file.as_ref() != Some(file) {
            self.counters.clear();
            self.issued.clear();
            self.current_file = Some(file.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_names_within_file() {
        let mut names = FreshNameAllocator::new();
        let file = FileId::new("a.php");
        let reserved = HashSet::new();

        assert_eq!(names.allocate(&file, "tmp", &reserved), "tmp1");
        assert_eq!(names.allocate(&file, "tmp", &reserved), "tmp2");
        assert_eq!(names.allocate(&file, "tmp", &reserved), "tmp3");
    }

    #[test]
    fn test_reset_on_file_change() {
        let mut names = FreshNameAllocator::new();
        let reserved = HashSet::new();
        let a = FileId::new("a.php");
        let b = FileId::new("b.php");

        for _ in 0..5 {
            names.allocate(&a, "tmp", &reserved);
        }
        assert_eq!(names.allocate(&b, "tmp", &reserved), "tmp1");

        // Coming back to a file is a change as well
        assert_eq!(names.allocate(&a, "tmp", &reserved), "tmp1");
    }

    #[test]
    fn test_first_call_starts_fresh() {
        let mut names = FreshNameAllocator::new();
        assert_eq!(names.allocate(&FileId::new("a.php"), "tmp", &HashSet::new()), "tmp1");
    }

    #[test]
    fn test_prefixes_count_independently() {
        let mut names = FreshNameAllocator::new();
        let file = FileId::new("a.php");
        let reserved = HashSet::new();

        assert_eq!(names.allocate(&file, "tmp", &reserved), "tmp1");
        assert_eq!(names.allocate(&file, "object", &reserved), "object1");
        assert_eq!(names.allocate(&file, "tmp", &reserved), "tmp2");
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let mut names = FreshNameAllocator::new();
        let file = FileId::new("a.php");
        let reserved: HashSet<String> = ["tmp1", "tmp2", "tmp4"].iter().map(|s| s.to_string()).collect();

        assert_eq!(names.allocate(&file, "tmp", &reserved), "tmp3");
        assert_eq!(names.allocate(&file, "tmp", &reserved), "tmp5");
    }

    #[test]
    fn test_overlapping_prefixes_never_collide() {
        let mut names = FreshNameAllocator::new();
        let file = FileId::new("a.php");
        let reserved = HashSet::new();

        for _ in 0..11 {
            names.allocate(&file, "t", &reserved);
        }
        // `t11` already came from the `t` counter
        assert_eq!(names.allocate(&file, "t1", &reserved), "t12");
        // and `t12` now belongs to the `t1` counter
        assert_eq!(names.allocate(&file, "t", &reserved), "t13");
    }

    #[test]
    fn test_issued_names_are_forgotten_on_file_change() {
        let mut names = FreshNameAllocator::new();
        let reserved = HashSet::new();

        for _ in 0..11 {
            names.allocate(&FileId::new("a.php"), "t", &reserved);
        }
        assert_eq!(names.allocate(&FileId::new("b.php"), "t1", &reserved), "t11");
    }
}
