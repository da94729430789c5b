//! Best-effort loading of one or more listing datasets.
//!
//! Every file of a [`DatasetSelection`] is read and parsed on its own tokio
//! task. A file that cannot be read or decoded is logged and recorded as a
//! [`SourceFailure`]; the remaining files still contribute. [`Loader::load`]
//! therefore never fails, and an all-failed load is simply empty.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info};

use crate::dataset::{City, DatasetId, ListingRecord, Period};
use crate::fetch::{BasicClient, HttpClient, SourceRoot};
use crate::parser::{DistancePolicy, parse_listings};

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Which datasets a load cycle needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSelection {
    One(DatasetId),
    /// Both periods of one city.
    City(City),
    /// Both periods of every city.
    AllCities,
}

impl DatasetSelection {
    /// The datasets in load order: cities in [`City::ALL`] order, weekdays first.
    pub fn datasets(&self) -> Vec<DatasetId> {
        let cities: &[City] = match self {
            DatasetSelection::One(id) => return vec![*id],
            DatasetSelection::City(city) => std::slice::from_ref(city),
            DatasetSelection::AllCities => &City::ALL,
        };
        cities
            .iter()
            .flat_map(|&city| Period::ALL.into_iter().map(move |p| DatasetId::new(city, p)))
            .collect()
    }
}

/// A source that contributed nothing to a load.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub dataset: DatasetId,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Records of every loaded source, concatenated in selection order.
    pub records: Vec<ListingRecord>,
    pub loaded: Vec<DatasetId>,
    pub failures: Vec<SourceFailure>,
}

impl LoadOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct Loader<C = BasicClient> {
    client: Arc<C>,
    root: SourceRoot,
    concurrency: usize,
    policy: DistancePolicy,
}

impl Loader<BasicClient> {
    pub fn basic(root: SourceRoot) -> Self {
        Self::new(BasicClient::new(), root)
    }
}

impl<C: HttpClient + 'static> Loader<C> {
    pub fn new(client: C, root: SourceRoot) -> Self {
        Self {
            client: Arc::new(client),
            root,
            concurrency: DEFAULT_CONCURRENCY,
            policy: DistancePolicy::Required,
        }
    }

    /// Caps the number of sources read at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_distance_policy(mut self, policy: DistancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> &SourceRoot {
        &self.root
    }

    /// Reads, parses and concatenates every dataset of `selection`.
    ///
    /// Returns only after every source has either loaded or failed.
    #[tracing::instrument(skip(self), fields(root = %self.root, concurrency = self.concurrency))]
    pub async fn load(&self, selection: DatasetSelection) -> LoadOutcome {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = vec![];

        for dataset in selection.datasets() {
            let sem = semaphore.clone();
            let client = self.client.clone();
            let root = self.root.clone();
            let policy = self.policy;

            let source_span = tracing::info_span!("load_source", dataset = %dataset);

            let task = tokio::spawn(
                async move {
                    let _permit = sem.acquire_owned().await?;
                    let text = root.read_text(&*client, &dataset.file_name()).await?;
                    debug!(bytes = text.len(), "Source read, parsing");
                    parse_listings(&text, dataset, policy)
                }
                .instrument(source_span),
            );

            tasks.push((dataset, task));
        }

        let mut outcome = LoadOutcome::default();

        for (dataset, task) in tasks {
            let error = match task.await {
                Ok(Ok(records)) => {
                    info!(dataset = %dataset, records = records.len(), "Source loaded");
                    outcome.loaded.push(dataset);
                    outcome.records.extend(records);
                    continue;
                }
                Ok(Err(e)) => format!("{e:#}"),
                Err(e) => format!("load task aborted: {e}"),
            };

            error!(dataset = %dataset, error = %error, "Source unavailable, skipping");
            outcome.failures.push(SourceFailure { dataset, error });
        }

        info!(
            loaded = outcome.loaded.len(),
            failed = outcome.failures.len(),
            records = outcome.records.len(),
            "Load finished"
        );

        outcome
    }
}
