//! # Harvest Pipeline
//!
//! Ties the stages of a run together: keyword discovery, cache-aware
//! collection, then the frequency summary and word cloud. The pipeline owns
//! no global state; the transport, record store, pacer and renderer are all
//! handed in, which keeps a full run testable without network or disk.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::bilibili::ApiClient;
use crate::config::HarvestConfig;
use crate::crawler::{
    CollectProgress, Collection, Discovery, Pacer, RandomPacer, RecordStore, Storage,
    StorageConfig, collect, discover,
};
use crate::error::Result;
use crate::http::{HttpClient, Transport};
use crate::report::{
    FrequencyTable, Renderer, SummaryReport, WordCloudRenderer, image_path, summarize,
    summary_path, write_summary,
};

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Discovery found nothing to collect
    NoHandles,

    /// Handles were found but no entries were collected
    EmptyCorpus,

    /// Summary written, and the image too when rendering succeeded
    Reported {
        table: FrequencyTable,
        summary_path: PathBuf,
        image_path: Option<PathBuf>,
    },
}

/// Everything a run produced
#[derive(Debug)]
pub struct RunSummary {
    pub keyword: String,
    pub discovery: Discovery,
    pub collection: Collection,
    pub outcome: RunOutcome,
}

impl RunSummary {
    /// Entries collected across all handles
    pub fn total_entries(&self) -> usize {
        self.collection.corpus.len()
    }
}

/// Runs the harvest for a keyword
pub struct Harvester<T, S, P, R> {
    client: ApiClient<T>,
    store: S,
    pacer: P,
    renderer: R,
    config: HarvestConfig,
}

impl Harvester<HttpClient, Storage, RandomPacer, WordCloudRenderer> {
    /// Production wiring: reqwest transport, XML file cache, random pauses
    pub fn from_config(config: HarvestConfig) -> Result<Self> {
        let transport = HttpClient::new(&config.headers)?;
        let client = ApiClient::new(transport, config.endpoints.clone());
        let store = Storage::with_config(StorageConfig {
            base_path: config.cache_dir.clone(),
        });
        let pacer = RandomPacer::from_config(&config);
        let renderer = WordCloudRenderer::new(config.font_path.clone());
        Ok(Self::new(client, store, pacer, renderer, config))
    }
}

impl<T, S, P, R> Harvester<T, S, P, R>
where
    T: Transport,
    S: RecordStore,
    P: Pacer,
    R: Renderer,
{
    pub fn new(
        client: ApiClient<T>,
        store: S,
        pacer: P,
        renderer: R,
        config: HarvestConfig,
    ) -> Self {
        Self {
            client,
            store,
            pacer,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Discover handles for `keyword`
    pub async fn discover(&self, keyword: &str) -> Discovery {
        discover(&self.client, &self.pacer, keyword, &self.config).await
    }

    /// Run discovery, collection and reporting for `keyword`
    ///
    /// Per-handle failures and early discovery stops never fail the run. The
    /// only errors returned come from writing the summary report.
    #[instrument(skip(self, progress))]
    pub async fn run(
        &self,
        keyword: &str,
        progress: Option<mpsc::Sender<CollectProgress>>,
    ) -> Result<RunSummary> {
        let discovery = self.discover(keyword).await;
        if discovery.handles.is_empty() {
            info!("No videos found for '{}'", keyword);
            return Ok(RunSummary {
                keyword: keyword.to_string(),
                discovery,
                collection: Collection::default(),
                outcome: RunOutcome::NoHandles,
            });
        }

        let collection = collect(
            &self.client,
            &self.store,
            &self.pacer,
            &discovery.handles,
            progress,
        )
        .await;

        let outcome = self.report(keyword, &collection.corpus).await?;
        Ok(RunSummary {
            keyword: keyword.to_string(),
            discovery,
            collection,
            outcome,
        })
    }

    /// Summarize and render `corpus`, skipping both when it is empty
    pub async fn report(&self, keyword: &str, corpus: &[String]) -> Result<RunOutcome> {
        if corpus.is_empty() {
            info!("Corpus is empty, skipping summary and rendering");
            return Ok(RunOutcome::EmptyCorpus);
        }

        let table = summarize(corpus, self.config.top_k);
        let summary_path = summary_path(&self.config.output_dir, keyword);
        write_summary(&summary_path, &SummaryReport::new(keyword, &table)).await?;
        info!("Summary written to {}", summary_path.display());

        let image_path = if self.config.render {
            let path = image_path(&self.config.output_dir, keyword);
            match self.renderer.render(&corpus.join(" "), &path) {
                Ok(()) => Some(path),
                Err(e) => {
                    warn!("Word cloud not rendered: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(RunOutcome::Reported {
            table,
            summary_path,
            image_path,
        })
    }
}
