//! Adapter discovery and version matching.
//!
//! # Responsibility
//! - Collect adapter candidates from the runtime path and the bundled archive.
//! - Pick the most version-specific candidate covering the host release.
//! - Install the result into the adapter slot, or invalidate it with a
//!   logged diagnostic.
//!
//! # Invariants
//! - At most one candidate is instantiated per `load`.
//! - Narrowest covering range wins; ties go to the earlier-added candidate.
//! - Load failures never escape `load_into`; the slot is invalidated instead.

use crate::adapter::host::{HostInfo, HostVariant};
use crate::adapter::{HostAdapter, LoadedAdapter};
use crate::config::AdapterConfig;
use crate::event::{Event, EventBus};
use crate::lifecycle::Lifecycled;
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Inclusive range of host release lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: u32,
    max: u32,
}

impl VersionRange {
    /// Creates `[min, max]`, swapping bounds given in reverse.
    pub fn new(min: u32, max: u32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn single(release: u32) -> Self {
        Self::new(release, release)
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, release: u32) -> bool {
        self.min <= release && release <= self.max
    }

    /// Number of releases covered; smaller is more specific.
    pub fn width(&self) -> u32 {
        self.max - self.min
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.min, self.max)
    }
}

/// Where a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateSource {
    /// Linked into the running process.
    RuntimePath,
    /// Shipped inside the extension bundle.
    BundledArchive,
}

impl CandidateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RuntimePath => "runtime_path",
            Self::BundledArchive => "bundled_archive",
        }
    }
}

/// Boxed construction error reported by a candidate factory.
pub type FactoryError = Box<dyn Error + Send + Sync>;

type Factory = Box<dyn Fn(&HostInfo) -> Result<Box<dyn HostAdapter>, FactoryError> + Send + Sync>;

/// One adapter implementation that may be instantiated.
pub struct AdapterCandidate {
    name: String,
    source: CandidateSource,
    range: VersionRange,
    factory: Factory,
}

impl AdapterCandidate {
    pub fn new<F>(
        name: impl Into<String>,
        source: CandidateSource,
        range: VersionRange,
        factory: F,
    ) -> Self
    where
        F: Fn(&HostInfo) -> Result<Box<dyn HostAdapter>, FactoryError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source,
            range,
            factory: Box::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> CandidateSource {
        self.source
    }

    pub fn range(&self) -> VersionRange {
        self.range
    }

    /// Whether this candidate declares support for `host`.
    pub fn supports(&self, host: &HostInfo) -> bool {
        self.range.contains(host.version.release())
    }
}

impl Debug for AdapterCandidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterCandidate")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("range", &self.range)
            .finish()
    }
}

/// Adapter load failures.
#[derive(Debug)]
pub enum AdapterLoadError {
    /// No candidate declares support for the host release.
    NoCandidatesFound { host: String, considered: usize },
    /// The matching candidate failed to construct.
    InstantiationFailed {
        candidate: String,
        range: VersionRange,
        cause: FactoryError,
    },
    /// The host is not a variant this loader serves; another platform
    /// should be responsible.
    AmbiguousHost { variant: HostVariant },
}

impl Display for AdapterLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCandidatesFound { host, considered } => write!(
                f,
                "no adapter supports host version {host} ({considered} candidates considered)"
            ),
            Self::InstantiationFailed {
                candidate,
                range,
                cause,
            } => write!(
                f,
                "adapter `{candidate}` for releases {range} failed to initialize: {cause}"
            ),
            Self::AmbiguousHost { variant } => write!(
                f,
                "host variant `{variant}` is not served by this adapter loader"
            ),
        }
    }
}

impl Error for AdapterLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InstantiationFailed { cause, .. } => Some(cause.as_ref()),
            Self::NoCandidatesFound { .. } | Self::AmbiguousHost { .. } => None,
        }
    }
}

/// Explicit candidate table plus selection policy.
pub struct AdapterLoader {
    candidates: Vec<AdapterCandidate>,
    expected_variants: Vec<HostVariant>,
    enabled_sources: BTreeSet<CandidateSource>,
    disabled: BTreeSet<String>,
}

impl Default for AdapterLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterLoader {
    /// Loader scanning both sources and serving Paper, Spigot and CraftBukkit.
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            expected_variants: vec![
                HostVariant::Paper,
                HostVariant::Spigot,
                HostVariant::CraftBukkit,
            ],
            enabled_sources: [CandidateSource::RuntimePath, CandidateSource::BundledArchive]
                .into_iter()
                .collect(),
            disabled: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        let mut loader = Self::new();
        if !config.scan_runtime_path {
            loader.enabled_sources.remove(&CandidateSource::RuntimePath);
        }
        if !config.scan_bundled_archive {
            loader.enabled_sources.remove(&CandidateSource::BundledArchive);
        }
        loader.disabled = config.disabled.iter().cloned().collect();
        loader
    }

    /// Adds one candidate. Returns whether it was accepted.
    pub fn add_candidate(&mut self, candidate: AdapterCandidate) -> bool {
        let reason = if !self.enabled_sources.contains(&candidate.source) {
            Some("source_disabled")
        } else if self.disabled.contains(&candidate.name) {
            Some("disabled_by_config")
        } else if self.candidates.iter().any(|existing| existing.name == candidate.name) {
            Some("duplicate_name")
        } else {
            None
        };

        if let Some(reason) = reason {
            info!(
                "event=adapter_candidate_skipped module=adapter status=skipped candidate={} source={} reason={}",
                candidate.name,
                candidate.source.as_str(),
                reason
            );
            return false;
        }

        debug!(
            "event=adapter_candidate_added module=adapter status=ok candidate={} source={} range={}",
            candidate.name,
            candidate.source.as_str(),
            candidate.range
        );
        self.candidates.push(candidate);
        true
    }

    /// Adds every candidate reported by one source. Returns how many were accepted.
    pub fn add_from_source(
        &mut self,
        source: CandidateSource,
        candidates: impl IntoIterator<Item = AdapterCandidate>,
    ) -> usize {
        candidates
            .into_iter()
            .filter(|candidate| {
                if candidate.source != source {
                    warn!(
                        "event=adapter_candidate_skipped module=adapter status=skipped candidate={} source={} reason=source_mismatch",
                        candidate.name,
                        source.as_str()
                    );
                    return false;
                }
                true
            })
            .map(|candidate| self.add_candidate(candidate))
            .filter(|accepted| *accepted)
            .count()
    }

    pub fn candidates(&self) -> &[AdapterCandidate] {
        &self.candidates
    }

    /// Selects and instantiates the most specific candidate for `host`.
    pub fn load(&self, host: &HostInfo) -> Result<LoadedAdapter, AdapterLoadError> {
        if !self.expected_variants.contains(&host.variant) {
            return Err(AdapterLoadError::AmbiguousHost {
                variant: host.variant.clone(),
            });
        }

        let release = host.version.release();
        let mut selected: Option<&AdapterCandidate> = None;
        for candidate in self.candidates.iter().filter(|c| c.supports(host)) {
            match selected {
                Some(current) if current.range.width() <= candidate.range.width() => {}
                _ => selected = Some(candidate),
            }
        }
        let candidate = selected.ok_or_else(|| AdapterLoadError::NoCandidatesFound {
            host: host.version.to_string(),
            considered: self.candidates.len(),
        })?;

        debug!(
            "event=adapter_selected module=adapter status=ok candidate={} range={} release={}",
            candidate.name, candidate.range, release
        );
        let adapter =
            (candidate.factory)(host).map_err(|cause| AdapterLoadError::InstantiationFailed {
                candidate: candidate.name.clone(),
                range: candidate.range,
                cause,
            })?;

        Ok(LoadedAdapter {
            candidate: candidate.name.clone(),
            range: candidate.range,
            adapter,
        })
    }

    /// Loads into `slot`, logging and invalidating on failure.
    ///
    /// Posts `AdapterLoaded` or `AdapterInvalidated` on `events`.
    pub fn load_into(
        &self,
        slot: &Lifecycled<LoadedAdapter>,
        host: &HostInfo,
        events: &EventBus,
    ) -> Result<(), AdapterLoadError> {
        match self.load(host) {
            Ok(loaded) => {
                let name = loaded.name().to_string();
                info!(
                    "event=adapter_loaded module=adapter status=ok adapter={} candidate={} range={} host={} variant={}",
                    name, loaded.candidate, loaded.range, host.version, host.variant
                );
                slot.set(loaded);
                events.post(&Event::AdapterLoaded { adapter: name });
                Ok(())
            }
            Err(err) => {
                match &err {
                    AdapterLoadError::AmbiguousHost { variant } => info!(
                        "event=adapter_load_failed module=adapter status=skipped reason=ambiguous_host variant={} message={}",
                        variant, err
                    ),
                    AdapterLoadError::NoCandidatesFound { host: version, considered } => warn!(
                        "event=adapter_load_failed module=adapter status=error reason=no_candidates host={} considered={} message={}",
                        version, considered, err
                    ),
                    AdapterLoadError::InstantiationFailed {
                        candidate,
                        range,
                        cause,
                    } => error!(
                        "event=adapter_load_failed module=adapter status=error reason=instantiation_failed candidate={} range={} cause={}",
                        candidate, range, cause
                    ),
                }
                slot.invalidate();
                events.post(&Event::AdapterInvalidated);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AdapterCandidate, AdapterLoadError, AdapterLoader, CandidateSource, VersionRange,
    };
    use crate::adapter::host::{HostInfo, HostVariant, HostVersion};
    use crate::adapter::HostAdapter;
    use crate::config::AdapterConfig;
    use crate::event::{EventBus, EventKind};
    use crate::lifecycle::Lifecycled;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubAdapter {
        name: String,
    }

    impl HostAdapter for StubAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn data_version(&self) -> u32 {
            3337
        }
    }

    fn stub(name: &str, source: CandidateSource, min: u32, max: u32) -> AdapterCandidate {
        let adapter_name = name.to_string();
        AdapterCandidate::new(name, source, VersionRange::new(min, max), move |_| {
            Ok(Box::new(StubAdapter {
                name: adapter_name.clone(),
            }) as Box<dyn HostAdapter>)
        })
    }

    fn host(release: u32) -> HostInfo {
        HostInfo::new(HostVersion::new(1, release, 0), HostVariant::Paper)
    }

    fn loader_with_two_ranges() -> AdapterLoader {
        let mut loader = AdapterLoader::new();
        loader.add_candidate(stub("legacy", CandidateSource::BundledArchive, 13, 17));
        loader.add_candidate(stub("modern", CandidateSource::BundledArchive, 18, 20));
        loader
    }

    #[test]
    fn selects_candidate_covering_host_release() {
        let loaded = loader_with_two_ranges()
            .load(&host(19))
            .expect("release 19 is covered");
        assert_eq!(loaded.candidate, "modern");
        assert_eq!(loaded.name(), "modern");
        assert_eq!(loaded.range, VersionRange::new(18, 20));
    }

    #[test]
    fn uncovered_release_reports_no_candidates_and_leaves_slot_invalid() {
        let loader = loader_with_two_ranges();
        let slot = Lifecycled::invalid();
        let bus = EventBus::new();
        let err = loader
            .load_into(&slot, &host(25), &bus)
            .expect_err("release 25 is not covered");
        assert!(matches!(
            err,
            AdapterLoadError::NoCandidatesFound { considered: 2, .. }
        ));
        assert!(!slot.is_valid());
    }

    #[test]
    fn narrowest_range_wins_with_ties_to_first_added() {
        let mut loader = AdapterLoader::new();
        loader.add_candidate(stub("broad", CandidateSource::RuntimePath, 13, 20));
        loader.add_candidate(stub("exact_a", CandidateSource::BundledArchive, 19, 19));
        loader.add_candidate(stub("exact_b", CandidateSource::BundledArchive, 19, 19));
        let loaded = loader.load(&host(19)).expect("release 19 is covered");
        assert_eq!(loaded.candidate, "exact_a");

        let loaded = loader.load(&host(15)).expect("release 15 is covered");
        assert_eq!(loaded.candidate, "broad");
    }

    #[test]
    fn instantiation_failure_carries_cause() {
        let mut loader = AdapterLoader::new();
        loader.add_candidate(AdapterCandidate::new(
            "broken",
            CandidateSource::BundledArchive,
            VersionRange::single(19),
            |_| Err("missing native symbol".into()),
        ));
        let err = loader.load(&host(19)).err().expect("factory fails");
        match &err {
            AdapterLoadError::InstantiationFailed {
                candidate, range, ..
            } => {
                assert_eq!(candidate, "broken");
                assert_eq!(*range, VersionRange::single(19));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("missing native symbol"));
    }

    #[test]
    fn unexpected_host_variant_is_ambiguous() {
        let loader = loader_with_two_ranges();
        let host = HostInfo::new(
            HostVersion::new(1, 19, 0),
            HostVariant::Other("fabric".to_string()),
        );
        let err = loader.load(&host).err().expect("variant is not served");
        assert!(matches!(err, AdapterLoadError::AmbiguousHost { .. }));
    }

    #[test]
    fn ambiguous_host_clears_a_previously_loaded_slot() {
        let loader = loader_with_two_ranges();
        let slot = Lifecycled::invalid();
        let bus = EventBus::new();
        let invalidated = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invalidated);
        bus.subscribe(EventKind::AdapterInvalidated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        loader
            .load_into(&slot, &host(19), &bus)
            .expect("release 19 is covered");
        assert!(slot.is_valid());

        let fabric = HostInfo::new(
            HostVersion::new(1, 19, 0),
            HostVariant::Other("fabric".to_string()),
        );
        let err = loader
            .load_into(&slot, &fabric, &bus)
            .expect_err("variant is not served");
        assert!(matches!(err, AdapterLoadError::AmbiguousHost { .. }));
        assert!(!slot.is_valid());
        assert_eq!(invalidated.load(Ordering::SeqCst), 1);

        loader
            .load_into(&slot, &host(19), &bus)
            .expect("loader stays usable after an ambiguous host");
        assert!(slot.is_valid());
    }

    #[test]
    fn only_the_selected_candidate_is_instantiated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut loader = AdapterLoader::new();
        for (name, min, max) in [("a", 13, 20), ("b", 18, 20), ("c", 19, 19)] {
            let calls = Arc::clone(&calls);
            let adapter_name = name.to_string();
            loader.add_candidate(AdapterCandidate::new(
                name,
                CandidateSource::RuntimePath,
                VersionRange::new(min, max),
                move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Box::new(StubAdapter {
                        name: adapter_name.clone(),
                    }) as Box<dyn HostAdapter>)
                },
            ));
        }
        loader.load(&host(19)).expect("release 19 is covered");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn config_disables_sources_and_candidates() {
        let config = AdapterConfig {
            scan_runtime_path: false,
            scan_bundled_archive: true,
            disabled: vec!["legacy".to_string()],
        };
        let mut loader = AdapterLoader::from_config(&config);
        assert!(!loader.add_candidate(stub("runtime", CandidateSource::RuntimePath, 13, 20)));
        let accepted = loader.add_from_source(
            CandidateSource::BundledArchive,
            [
                stub("legacy", CandidateSource::BundledArchive, 13, 17),
                stub("modern", CandidateSource::BundledArchive, 18, 20),
                stub("stray", CandidateSource::RuntimePath, 18, 20),
            ],
        );
        assert_eq!(accepted, 1);
        let names: Vec<&str> = loader.candidates().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["modern"]);
    }

    #[test]
    fn duplicate_candidate_names_are_skipped() {
        let mut loader = AdapterLoader::new();
        assert!(loader.add_candidate(stub("modern", CandidateSource::RuntimePath, 18, 20)));
        assert!(!loader.add_candidate(stub("modern", CandidateSource::BundledArchive, 19, 19)));
        assert_eq!(loader.candidates().len(), 1);
    }

    #[test]
    fn load_into_installs_and_announces() {
        let loader = loader_with_two_ranges();
        let slot = Lifecycled::invalid();
        let bus = EventBus::new();
        let loaded_events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loaded_events);
        bus.subscribe(EventKind::AdapterLoaded, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        loader
            .load_into(&slot, &host(14), &bus)
            .expect("release 14 is covered");
        let active = slot.read().expect("adapter installed");
        assert_eq!(active.name(), "legacy");
        assert_eq!(loaded_events.load(Ordering::SeqCst), 1);

        loader
            .load_into(&slot, &host(30), &bus)
            .expect_err("release 30 is not covered");
        assert!(slot.read().is_none());
    }

    #[test]
    fn version_range_normalizes_bounds() {
        let range = VersionRange::new(20, 18);
        assert_eq!(range, VersionRange::new(18, 20));
        assert!(range.contains(18) && range.contains(20));
        assert!(!range.contains(21));
        assert_eq!((range.min(), range.max()), (18, 20));
        assert_eq!(range.width(), 2);
        assert_eq!(range.to_string(), "[18,20]");
    }
}
