//! Groups the members of one size bucket by content digest.

use super::content::{ContentDigest, ContentHasher, PREFIX_LEN};
use super::SizeBucket;
use crate::core::comparator::DuplicateGroup;
use crate::core::pipeline::{CancellationToken, Cancelled};
use crate::core::scanner::FileEntry;
use crate::error::HashError;
use rayon::prelude::*;
use std::collections::HashMap;

/// What hashing one bucket produced
#[derive(Debug, Default)]
pub struct BucketOutcome {
    /// One group per digest shared by two or more files
    pub groups: Vec<DuplicateGroup>,
    /// Files whose full content was hashed
    pub hashed: usize,
    /// Files ruled out by the prefix check without a full read
    pub prefix_eliminated: usize,
    /// Files that could not be read; they are left out of every group
    pub failures: Vec<HashError>,
}

/// Finds byte-identical files inside a size bucket
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactHashMatcher {
    hasher: ContentHasher,
}

impl ExactHashMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash every member of `bucket` and group by digest.
    ///
    /// `on_file` runs once per member when its processing ends, whether it
    /// was hashed, eliminated by the prefix check or failed. Files are
    /// processed in parallel on the current rayon pool. Read failures are
    /// local: the failing file is dropped and the rest of the bucket carries
    /// on.
    pub fn match_bucket<F>(
        &self,
        bucket: &SizeBucket,
        cancel: &CancellationToken,
        on_file: F,
    ) -> Result<BucketOutcome, Cancelled>
    where
        F: Fn(&FileEntry) + Sync,
    {
        cancel.check()?;
        let mut outcome = BucketOutcome::default();

        let survivors: Vec<&FileEntry> = if bucket.size > PREFIX_LEN as u64 {
            self.split_by_prefix(bucket, cancel, &on_file, &mut outcome)?
        } else {
            bucket.files.iter().collect()
        };

        let results: Vec<Option<(&FileEntry, Result<ContentDigest, HashError>)>> = survivors
            .into_par_iter()
            .map(|file| {
                if cancel.is_cancelled() {
                    return None;
                }
                let result = self.hasher.digest_file(file.path());
                on_file(file);
                Some((file, result))
            })
            .collect();
        cancel.check()?;

        let mut by_digest: HashMap<ContentDigest, Vec<FileEntry>> = HashMap::new();
        for (file, result) in results.into_iter().flatten() {
            match result {
                Ok(digest) => {
                    outcome.hashed += 1;
                    by_digest.entry(digest).or_default().push(file.clone());
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", file.path().display(), e);
                    outcome.failures.push(e);
                }
            }
        }

        outcome.groups = by_digest
            .into_iter()
            .filter_map(|(digest, files)| DuplicateGroup::exact(files, digest.to_hex()))
            .collect();
        outcome
            .groups
            .sort_by(|a, b| a.files()[0].path().cmp(b.files()[0].path()));

        tracing::debug!(
            size = bucket.size,
            files = bucket.len(),
            groups = outcome.groups.len(),
            "Bucket matched"
        );

        Ok(outcome)
    }

    /// Drop members whose first `PREFIX_LEN` bytes match no other member.
    fn split_by_prefix<'a, F>(
        &self,
        bucket: &'a SizeBucket,
        cancel: &CancellationToken,
        on_file: &F,
        outcome: &mut BucketOutcome,
    ) -> Result<Vec<&'a FileEntry>, Cancelled>
    where
        F: Fn(&FileEntry) + Sync,
    {
        let prefixes: Vec<Option<(usize, Result<u64, HashError>)>> = bucket
            .files
            .par_iter()
            .enumerate()
            .map(|(index, file)| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some((index, self.hasher.prefix_hash(file.path())))
            })
            .collect();
        cancel.check()?;

        let mut by_prefix: HashMap<u64, Vec<usize>> = HashMap::new();
        for (index, result) in prefixes.into_iter().flatten() {
            match result {
                Ok(prefix) => by_prefix.entry(prefix).or_default().push(index),
                Err(e) => {
                    let file = &bucket.files[index];
                    tracing::warn!("Skipping {}: {}", file.path().display(), e);
                    on_file(file);
                    outcome.failures.push(e);
                }
            }
        }

        let mut kept = Vec::new();
        for indices in by_prefix.into_values() {
            if indices.len() > 1 {
                kept.extend(indices);
            } else {
                outcome.prefix_eliminated += indices.len();
                indices.iter().for_each(|&i| on_file(&bucket.files[i]));
            }
        }

        // Input order for the full pass
        kept.sort_unstable();
        let survivors = kept.into_iter().map(|i| &bucket.files[i]).collect();

        Ok(survivors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::GroupKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> FileEntry {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        FileEntry::probe(&path).unwrap()
    }

    fn bucket(files: Vec<FileEntry>) -> SizeBucket {
        SizeBucket {
            size: files[0].size(),
            files,
        }
    }

    #[test]
    fn three_identical_files_form_one_group() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write(&dir, "a", b"AAAA"),
            write(&dir, "b", b"AAAA"),
            write(&dir, "c", b"AAAA"),
        ];

        let outcome = ExactHashMatcher::new()
            .match_bucket(&bucket(files), &CancellationToken::new(), |_| {})
            .unwrap();

        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.kind(), GroupKind::Hash);
        assert_eq!(group.len(), 3);
        assert!(group.files().iter().all(|f| f.size() == 4));
        assert_eq!(group.total_size(), 12);
    }

    #[test]
    fn different_content_same_size_is_split() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write(&dir, "a", b"AAAA"),
            write(&dir, "b", b"BBBB"),
            write(&dir, "c", b"AAAA"),
            write(&dir, "d", b"CCCC"),
        ];

        let outcome = ExactHashMatcher::new()
            .match_bucket(&bucket(files), &CancellationToken::new(), |_| {})
            .unwrap();

        assert_eq!(outcome.groups.len(), 1);
        let names: Vec<_> = outcome.groups[0]
            .files()
            .iter()
            .map(|f| f.path().file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(outcome.hashed, 4);
    }

    #[test]
    fn unreadable_member_is_skipped() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write(&dir, "a", b"AAAA"),
            write(&dir, "gone", b"AAAA"),
            write(&dir, "b", b"AAAA"),
        ];
        std::fs::remove_file(dir.path().join("gone")).unwrap();

        let outcome = ExactHashMatcher::new()
            .match_bucket(&bucket(files), &CancellationToken::new(), |_| {})
            .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].len(), 2);
    }

    #[test]
    fn prefix_check_eliminates_early_differences() {
        let dir = TempDir::new().unwrap();
        let same = vec![9u8; PREFIX_LEN * 2];
        let mut different = same.clone();
        different[0] = 0;

        let files = vec![
            write(&dir, "a", &same),
            write(&dir, "b", &same),
            write(&dir, "c", &different),
        ];

        let seen = AtomicUsize::new(0);
        let outcome = ExactHashMatcher::new()
            .match_bucket(&bucket(files), &CancellationToken::new(), |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(outcome.prefix_eliminated, 1);
        assert_eq!(outcome.hashed, 2);
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn late_difference_survives_prefix_but_not_digest() {
        let dir = TempDir::new().unwrap();
        let a = vec![1u8; PREFIX_LEN * 2];
        let mut b = a.clone();
        *b.last_mut().unwrap() = 2;

        let files = vec![write(&dir, "a", &a), write(&dir, "b", &b)];

        let outcome = ExactHashMatcher::new()
            .match_bucket(&bucket(files), &CancellationToken::new(), |_| {})
            .unwrap();

        assert_eq!(outcome.hashed, 2);
        assert!(outcome.groups.is_empty());
    }

    #[test]
    fn cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let files = vec![write(&dir, "a", b"AAAA"), write(&dir, "b", b"AAAA")];
        let token = CancellationToken::new();
        token.cancel();

        let result = ExactHashMatcher::new().match_bucket(&bucket(files), &token, |_| {});
        assert_eq!(result.unwrap_err(), Cancelled);
    }

    #[test]
    fn cancelling_mid_bucket_stops_remaining_files() {
        let dir = TempDir::new().unwrap();
        let files: Vec<FileEntry> = (0..100)
            .map(|i| write(&dir, &format!("{i:03}"), b"AAAA"))
            .collect();
        let token = CancellationToken::new();
        let seen = AtomicUsize::new(0);
        let single = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();

        let result = single.install(|| {
            ExactHashMatcher::new().match_bucket(&bucket(files), &token, |_| {
                if seen.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                    token.cancel();
                }
            })
        });

        assert_eq!(result.unwrap_err(), Cancelled);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
