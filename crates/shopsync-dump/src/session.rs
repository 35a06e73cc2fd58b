//! Orchestrates one full dump session (spec §4.5, §4.6): runs every writer
//! against the source tenant, then the enrichment pass over the files just
//! written.

use crate::error::DumpError;
use crate::writers::{blogs_articles, collections, definitions, files, metaobjects, misc, pages, products, shop_metafields};
use shopsync_bulk::BulkRuntime;
use shopsync_client::GraphQlClient;
use shopsync_core::stats::{Outcome, RunStats};
use shopsync_rewrite::Enricher;
use std::path::Path;

pub struct DumpSession {
    client: GraphQlClient,
    runtime: BulkRuntime,
    output_dir: std::path::PathBuf,
}

impl DumpSession {
    pub fn new(client: GraphQlClient, runtime: BulkRuntime, output_dir: impl Into<std::path::PathBuf>) -> Self {
        DumpSession { client, runtime, output_dir: output_dir.into() }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<RunStats, DumpError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| DumpError::Io {
            path: self.output_dir.display().to_string(),
            source,
        })?;

        let mut stats = RunStats::default();

        stats.push(self.run_phase("products", products::dump_products(&self.runtime, &self.output_dir)).await?);
        stats.push(self.run_phase("collections", collections::dump_collections(&self.runtime, &self.output_dir)).await?);
        stats.push(self.run_phase("pages", pages::dump_pages(&self.runtime, &self.output_dir)).await?);

        let (blog_count, article_count) =
            blogs_articles::dump_blogs_and_articles(&self.runtime, &self.output_dir).await?;
        stats.push(counted_phase("blogs", blog_count));
        stats.push(counted_phase("articles", article_count));

        stats.push(self.run_phase("files", files::dump_files(&self.runtime, &self.output_dir)).await?);
        stats.push(self.run_phase("shop-metafields", shop_metafields::dump_shop_metafields(&self.runtime, &self.output_dir)).await?);

        let metaobject_types = metaobjects::discover_metaobject_types(&self.client).await?;
        let metaobject_count = metaobjects::dump_metaobjects(&self.runtime, &self.output_dir, &metaobject_types).await?;
        stats.push(counted_phase("metaobjects", metaobject_count));

        definitions::dump_definitions(&self.client, &self.output_dir).await?;
        misc::dump_menus(&self.client, &self.output_dir).await?;
        misc::dump_redirects(&self.client, &self.output_dir).await?;
        misc::dump_policies(&self.client, &self.output_dir).await?;
        misc::dump_discounts(&self.client, &self.output_dir).await?;
        misc::dump_markets(&self.client, &self.output_dir).await?;

        self.enrich(&self.output_dir)?;

        Ok(stats)
    }

    async fn run_phase(
        &self,
        name: &'static str,
        fut: impl std::future::Future<Output = Result<usize, DumpError>>,
    ) -> Result<shopsync_core::stats::PhaseStats, DumpError> {
        let count = fut.await?;
        Ok(counted_phase(name, count))
    }

    fn enrich(&self, dir: &Path) -> Result<(), DumpError> {
        let enricher = Enricher::build(dir).map_err(|source| DumpError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        enricher.enrich_dir(dir).map_err(|source| DumpError::Io {
            path: dir.display().to_string(),
            source,
        })
    }
}

fn counted_phase(name: &'static str, count: usize) -> shopsync_core::stats::PhaseStats {
    let mut stats = shopsync_core::stats::PhaseStats::new(name);
    for _ in 0..count {
        stats.record(Outcome::Created);
    }
    stats
}
