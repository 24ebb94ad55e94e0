//! Pipeline execution implementation.

use super::{CancellationToken, Cancelled, ScanOptions};
use crate::core::comparator::{DuplicateGroup, GroupKind, SimilarityClusterer};
use crate::core::exact::{bucket_by_size, ExactHashMatcher};
use crate::core::hasher::{DifferenceHasher, Fingerprint};
use crate::core::scanner::{FileEntry, ImageFilter};
use crate::error::{DuplicateFinderError, HashError};
use crate::events::{
    null_sender, Event, EventSender, FileProgress, PipelineEvent, PipelinePhase,
    PipelineSummary, SkippedFile,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Counters collected during a scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Candidate paths that turned out to be readable regular files
    pub files_considered: usize,
    /// Files whose full content was hashed
    pub files_hashed: usize,
    /// Images that produced a fingerprint
    pub images_fingerprinted: usize,
    /// Files dropped along the way, one message each
    pub skipped: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Result of a completed scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Identical groups first, then similar groups
    pub groups: Vec<DuplicateGroup>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn hash_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|g| g.kind() == GroupKind::Hash)
    }

    pub fn similar_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|g| g.kind() == GroupKind::Similar)
    }

    /// Bytes freed by keeping the largest file of every group
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.reclaimable_bytes()).sum()
    }

    fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            files_considered: self.stats.files_considered,
            hash_groups: self.hash_groups().count(),
            similar_groups: self.similar_groups().count(),
            reclaimable_bytes: self.reclaimable_bytes(),
            duration_ms: self.stats.duration_ms,
        }
    }
}

/// How a scan ended
#[derive(Debug)]
pub enum ScanOutcome {
    Completed(ScanReport),
    /// Cancellation was requested; no partial groups are returned
    Cancelled,
}

impl ScanOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanOutcome::Cancelled)
    }

    pub fn into_report(self) -> Option<ScanReport> {
        match self {
            ScanOutcome::Completed(report) => Some(report),
            ScanOutcome::Cancelled => None,
        }
    }
}

/// Builder for a configured pipeline
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    options: ScanOptions,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options
    pub fn options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the comparison threshold
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.options.threshold = threshold;
        self
    }

    /// Validate the options and build the pipeline
    pub fn build(self) -> Result<DuplicatePipeline, DuplicateFinderError> {
        self.options.validate()?;
        let clusterer = SimilarityClusterer::new(self.options.threshold)?;

        let pool = match self.options.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| DuplicateFinderError::Config(e.to_string()))?,
            ),
            None => None,
        };

        Ok(DuplicatePipeline {
            filter: self.options.image_filter(),
            options: self.options,
            clusterer,
            pool,
        })
    }
}

/// Coordinates the exact and perceptual branches over a set of files
pub struct DuplicatePipeline {
    options: ScanOptions,
    filter: ImageFilter,
    clusterer: SimilarityClusterer,
    pool: Option<rayon::ThreadPool>,
}

impl DuplicatePipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan without progress events or cancellation
    pub fn scan_paths(&self, paths: &[PathBuf]) -> Result<ScanOutcome, DuplicateFinderError> {
        self.scan(paths, &null_sender(), &CancellationToken::new())
    }

    /// Scan `paths` for duplicates.
    ///
    /// Paths are files; directories and unreadable entries are dropped.
    /// Progress goes to `events` without ever blocking. Once `cancel` fires,
    /// the scan stops at its next check and returns
    /// [`ScanOutcome::Cancelled`].
    pub fn scan(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, DuplicateFinderError> {
        let run = || self.run(paths, events, cancel);
        let result = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        match result {
            Ok(report) => {
                events.send(Event::Pipeline(PipelineEvent::Completed {
                    summary: report.summary(),
                }));
                Ok(ScanOutcome::Completed(report))
            }
            Err(Cancelled) => {
                tracing::info!("Scan cancelled");
                events.send(Event::Pipeline(PipelineEvent::Cancelled));
                Ok(ScanOutcome::Cancelled)
            }
        }
    }

    fn run(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, Cancelled> {
        let start_time = Instant::now();
        let mut stats = ScanStats::default();

        events.send(Event::Pipeline(PipelineEvent::Started {
            total_candidates: paths.len(),
        }));

        // Phase 1: Collecting
        let entries = self.collect(paths, events, cancel, &mut stats)?;
        stats.files_considered = entries.len();
        tracing::info!(
            candidates = paths.len(),
            files = entries.len(),
            "Collected candidate files"
        );

        // Phase 2: Exact hashing
        let mut groups = if self.options.enable_hash_scan {
            self.exact_groups(&entries, events, cancel, &mut stats)?
        } else {
            Vec::new()
        };

        // Phase 3: Fingerprinting and clustering
        if self.options.enable_image_scan {
            groups.extend(self.similar_groups(&entries, events, cancel, &mut stats)?);
        }

        stats.duration_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            groups = groups.len(),
            skipped = stats.skipped.len(),
            duration_ms = stats.duration_ms,
            "Scan complete"
        );

        Ok(ScanReport { groups, stats })
    }

    fn collect(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
        cancel: &CancellationToken,
        stats: &mut ScanStats,
    ) -> Result<Vec<FileEntry>, Cancelled> {
        enter_phase(events, PipelinePhase::Collecting);

        let mut seen = HashSet::new();
        let unique: Vec<&PathBuf> = paths.iter().filter(|p| seen.insert(*p)).collect();
        let total = unique.len();
        let completed = AtomicUsize::new(0);

        let probed: Vec<Option<Result<FileEntry, String>>> = unique
            .par_iter()
            .map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }
                let result = FileEntry::probe(path).map_err(|e| {
                    tracing::debug!("Dropping {}: {}", path.display(), e);
                    e.to_string()
                });
                report_progress(events, PipelinePhase::Collecting, &completed, total, path);
                Some(result)
            })
            .collect();
        cancel.check()?;

        let mut entries = Vec::with_capacity(total);
        for result in probed.into_iter().flatten() {
            match result {
                Ok(entry) => entries.push(entry),
                Err(message) => stats.skipped.push(message),
            }
        }
        Ok(entries)
    }

    fn exact_groups(
        &self,
        entries: &[FileEntry],
        events: &EventSender,
        cancel: &CancellationToken,
        stats: &mut ScanStats,
    ) -> Result<Vec<DuplicateGroup>, Cancelled> {
        enter_phase(events, PipelinePhase::ExactHashing);

        let buckets = bucket_by_size(entries, self.options.min_size);
        let total: usize = buckets.iter().map(|b| b.len()).sum();
        let completed = AtomicUsize::new(0);
        let matcher = ExactHashMatcher::new();
        let mut groups = Vec::new();

        for bucket in &buckets {
            cancel.check()?;
            let outcome = matcher.match_bucket(bucket, cancel, |file| {
                report_progress(
                    events,
                    PipelinePhase::ExactHashing,
                    &completed,
                    total,
                    file.path(),
                );
            })?;

            stats.files_hashed += outcome.hashed;
            for failure in outcome.failures {
                record_skip(events, PipelinePhase::ExactHashing, &failure, stats);
            }
            groups.extend(outcome.groups);
        }

        tracing::info!(
            buckets = buckets.len(),
            hashed = stats.files_hashed,
            groups = groups.len(),
            "Exact hashing complete"
        );
        Ok(groups)
    }

    fn similar_groups(
        &self,
        entries: &[FileEntry],
        events: &EventSender,
        cancel: &CancellationToken,
        stats: &mut ScanStats,
    ) -> Result<Vec<DuplicateGroup>, Cancelled> {
        enter_phase(events, PipelinePhase::Fingerprinting);

        let images: Vec<&FileEntry> = entries
            .iter()
            .filter(|e| self.filter.should_include(e.path()))
            .collect();
        let total = images.len();
        let completed = AtomicUsize::new(0);
        let hasher = DifferenceHasher::new();

        let results: Vec<(&FileEntry, Result<_, HashError>)> = images
            .par_iter()
            .filter_map(|entry| {
                if cancel.is_cancelled() {
                    return None;
                }
                let result = hasher.hash_file(entry.path());
                report_progress(
                    events,
                    PipelinePhase::Fingerprinting,
                    &completed,
                    total,
                    entry.path(),
                );
                Some((*entry, result))
            })
            .collect();
        cancel.check()?;

        let mut pool = Vec::with_capacity(results.len());
        for (entry, result) in results {
            match result {
                Ok(hash) => pool.push(Fingerprint::new(entry.clone(), hash)),
                Err(e) => {
                    tracing::debug!("Not fingerprinting {}: {}", entry.path().display(), e);
                    record_skip(events, PipelinePhase::Fingerprinting, &e, stats);
                }
            }
        }
        stats.images_fingerprinted = pool.len();
        tracing::info!(
            images = total,
            fingerprinted = pool.len(),
            "Fingerprinting complete"
        );

        enter_phase(events, PipelinePhase::Clustering);
        let groups = self.clusterer.cluster(pool, cancel, events)?;
        tracing::info!(groups = groups.len(), "Clustering complete");
        Ok(groups)
    }
}

fn enter_phase(events: &EventSender, phase: PipelinePhase) {
    tracing::debug!(%phase, "Entering phase");
    events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
}

fn report_progress(
    events: &EventSender,
    phase: PipelinePhase,
    completed: &AtomicUsize,
    total: usize,
    path: &Path,
) {
    let completed = completed.fetch_add(1, Ordering::SeqCst) + 1;
    events.send(Event::Progress(FileProgress {
        phase,
        completed,
        total,
        current_path: path.to_path_buf(),
    }));
}

fn record_skip(
    events: &EventSender,
    phase: PipelinePhase,
    error: &HashError,
    stats: &mut ScanStats,
) {
    let message = error.to_string();
    if let Some(path) = error.path() {
        events.send(Event::Skipped(SkippedFile {
            phase,
            path: path.to_path_buf(),
            message: message.clone(),
        }));
    }
    stats.skipped.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn hash_only() -> DuplicatePipeline {
        DuplicatePipeline::builder()
            .options(ScanOptions::new().image_scan(false))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_rejects_invalid_threshold() {
        let result = DuplicatePipeline::builder().threshold(65).build();
        assert!(matches!(result, Err(DuplicateFinderError::Compare(_))));
    }

    #[test]
    fn builder_accepts_dedicated_pool() {
        let pipeline = DuplicatePipeline::builder()
            .options(ScanOptions::new().threads(2))
            .build()
            .unwrap();
        assert_eq!(pipeline.options().threads, Some(2));
    }

    #[test]
    fn empty_input_gives_empty_report() {
        let report = hash_only().scan_paths(&[]).unwrap().into_report().unwrap();
        assert!(report.groups.is_empty());
        assert_eq!(report.stats.files_considered, 0);
    }

    #[test]
    fn identical_files_are_grouped() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write(&dir, "a.txt", b"AAAA"),
            write(&dir, "b.txt", b"AAAA"),
            write(&dir, "c.txt", b"AAAB"),
        ];

        let report = hash_only().scan_paths(&paths).unwrap().into_report().unwrap();

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].len(), 2);
        assert_eq!(report.stats.files_considered, 3);
        assert_eq!(report.stats.files_hashed, 3);
        assert_eq!(report.reclaimable_bytes(), 4);
    }

    #[test]
    fn repeated_paths_are_counted_once() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", b"AAAA");

        let report = hash_only()
            .scan_paths(&[a.clone(), a])
            .unwrap()
            .into_report()
            .unwrap();

        assert!(report.groups.is_empty());
        assert_eq!(report.stats.files_considered, 1);
    }

    #[test]
    fn directories_and_missing_paths_are_dropped() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            dir.path().to_path_buf(),
            dir.path().join("missing.txt"),
            write(&dir, "a.txt", b"x"),
        ];

        let report = hash_only().scan_paths(&paths).unwrap().into_report().unwrap();

        assert_eq!(report.stats.files_considered, 1);
        assert_eq!(report.stats.skipped.len(), 2);
    }

    #[test]
    fn disabled_branches_find_nothing() {
        let dir = TempDir::new().unwrap();
        let paths = vec![write(&dir, "a.txt", b"AAAA"), write(&dir, "b.txt", b"AAAA")];

        let pipeline = DuplicatePipeline::builder()
            .options(ScanOptions::new().hash_scan(false).image_scan(false))
            .build()
            .unwrap();
        let report = pipeline.scan_paths(&paths).unwrap().into_report().unwrap();

        assert!(report.groups.is_empty());
        assert_eq!(report.stats.files_considered, 2);
    }

    #[test]
    fn cancelled_token_yields_cancelled_outcome() {
        let dir = TempDir::new().unwrap();
        let paths = vec![write(&dir, "a.txt", b"AAAA"), write(&dir, "b.txt", b"AAAA")];
        let token = CancellationToken::new();
        token.cancel();
        let (sender, receiver) = EventChannel::new();

        let outcome = hash_only().scan(&paths, &sender, &token).unwrap();
        drop(sender);

        assert!(outcome.is_cancelled());
        assert!(receiver
            .iter()
            .any(|e| matches!(e, Event::Pipeline(PipelineEvent::Cancelled))));
    }

    #[test]
    fn full_progress_channel_does_not_block() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..20)
            .map(|i| write(&dir, &format!("{i}.txt"), b"same"))
            .collect();
        let (sender, _receiver) = EventChannel::bounded(1);

        let outcome = hash_only()
            .scan(&paths, &sender, &CancellationToken::new())
            .unwrap();

        let report = outcome.into_report().unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].len(), 20);
    }

    #[test]
    fn progress_reaches_total() {
        let dir = TempDir::new().unwrap();
        let paths = vec![write(&dir, "a.txt", b"AAAA"), write(&dir, "b.txt", b"AAAA")];
        let (sender, receiver) = EventChannel::new();

        hash_only()
            .scan(&paths, &sender, &CancellationToken::new())
            .unwrap();
        drop(sender);

        let hashing: Vec<FileProgress> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::Progress(p) if p.phase == PipelinePhase::ExactHashing => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(hashing.len(), 2);
        assert!(hashing.iter().any(|p| p.completed == 2 && p.total == 2));
    }

    #[test]
    fn undecodable_images_are_reported_as_skipped() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write(&dir, "one.png", b"not a png at all"),
            write(&dir, "two.jpg", b"nor a jpeg, longer"),
        ];
        let pipeline = DuplicatePipeline::builder()
            .options(ScanOptions::new().hash_scan(false))
            .build()
            .unwrap();
        let (sender, receiver) = EventChannel::new();

        let report = pipeline
            .scan(&paths, &sender, &CancellationToken::new())
            .unwrap()
            .into_report()
            .unwrap();
        drop(sender);

        assert_eq!(report.stats.images_fingerprinted, 0);
        assert_eq!(report.stats.skipped.len(), 2);
        let skipped: Vec<SkippedFile> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::Skipped(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(skipped.len(), 2);
        assert!(skipped
            .iter()
            .all(|s| s.phase == PipelinePhase::Fingerprinting));
    }
}
