//! Orchestrates the fixed ten-phase apply sequence (spec §4.6), rebuilding
//! the destination index between phases so later phases can resolve
//! references to entities just created.

use crate::error::ApplyError;
use crate::phases::{articles, blogs, collections, files, metafields, metaobjects, pages, products};
use crate::source::discover_metaobject_dumps;
use shopsync_client::GraphQlClient;
use shopsync_core::stats::RunStats;
use shopsync_index::IndexBuilder;
use std::path::Path;

pub async fn run(client: &GraphQlClient, output_dir: &Path) -> Result<RunStats, ApplyError> {
    let mut stats = RunStats::default();
    let metaobject_types: Vec<String> = discover_metaobject_dumps(output_dir)?.into_iter().map(|(t, _)| t).collect();

    // Phase 1: build initial index.
    let mut index = IndexBuilder::new(client).build(&metaobject_types).await?;

    // Phase 2: files.
    stats.push(files::apply_files(client, output_dir, &index).await?);

    // Phase 3: products + variants + publications.
    stats.push(products::apply_products(client, output_dir, &index).await?);

    // Phase 4: collections + publications.
    stats.push(collections::apply_collections(client, output_dir, &index).await?);

    // Phase 5: blogs.
    stats.push(blogs::apply_blogs(client, output_dir, &index).await?);

    // Phase 6: articles.
    stats.push(articles::apply_articles(client, output_dir, &index).await?);

    // Phase 7: pages.
    stats.push(pages::apply_pages(client, output_dir, &index).await?);

    // Phase 8: rebuild index so phase 9 can resolve references to
    // products/collections/pages/blogs/articles/files just created.
    index = IndexBuilder::new(client).build(&metaobject_types).await?;

    // Phase 9: metaobjects.
    for phase_stats in metaobjects::apply_metaobjects(client, output_dir, &index).await? {
        stats.push(phase_stats);
    }

    // Rebuild once more so phase 10 can resolve metaobject references.
    index = IndexBuilder::new(client).build(&metaobject_types).await?;

    // Phase 10: metafields for all owner types, including shop.
    stats.push(metafields::apply_metafields(client, output_dir, &index).await?);

    Ok(stats)
}
