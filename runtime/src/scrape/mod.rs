//! Per-entity scrapers.
//!
//! [`BazaarScraper`] reads heroes, items, and skills from the static wiki and
//! monsters and merchants from the rendered companion site. Failed pages are
//! skipped; a step only errors when its source cannot be used at all.

pub mod rendered;
pub mod wiki;

use crate::acquisition::{RenderedSource, StaticSource};
use crate::error::IngestResult;
use async_trait::async_trait;
use bazaar_core::heroes::HERO_ROSTER;
use bazaar_core::{EntityBatch, EntityKind, FallbackCounter};
use std::sync::Arc;
use tracing::{info, warn};
use wiki::PageOwner;

/// Produces one entity type's batch.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Scrape every record of `kind`. Category defaults applied along the
    /// way are counted into `fallbacks`.
    async fn scrape(
        &self,
        kind: EntityKind,
        fallbacks: &mut FallbackCounter,
    ) -> IngestResult<EntityBatch>;
}

pub struct BazaarScraper {
    wiki: Arc<dyn StaticSource>,
    site: Arc<dyn RenderedSource>,
}

impl BazaarScraper {
    pub fn new(wiki: Arc<dyn StaticSource>, site: Arc<dyn RenderedSource>) -> Self {
        Self { wiki, site }
    }

    async fn heroes(&self) -> EntityBatch {
        let mut heroes = Vec::with_capacity(HERO_ROSTER.len());
        for hero in HERO_ROSTER {
            let html = self.wiki.fetch_document(hero.name).await;
            heroes.push(wiki::parse_hero_page(html.as_deref(), hero));
        }
        EntityBatch::Heroes(heroes)
    }

    async fn items(&self) -> EntityBatch {
        let mut items = Vec::new();
        for owner in PageOwner::all() {
            let page = owner.item_page();
            match self.wiki.fetch_document(&page).await {
                Some(html) => items.extend(wiki::parse_item_page(&html, owner)),
                None => warn!(page, "skipping item page"),
            }
        }
        EntityBatch::Items(items)
    }

    async fn skills(&self) -> EntityBatch {
        let mut skills = Vec::new();
        for owner in PageOwner::all() {
            let page = owner.skill_page();
            match self.wiki.fetch_document(&page).await {
                Some(html) => skills.extend(wiki::parse_skill_page(&html, owner)),
                None => warn!(page, "skipping skill page"),
            }
        }
        EntityBatch::Skills(skills)
    }

    async fn monsters(&self) -> EntityBatch {
        let html = self
            .site
            .fetch_rendered(rendered::MONSTERS_PATH, Some(rendered::WAIT_SELECTOR))
            .await;
        EntityBatch::Monsters(
            html.map(|html| rendered::parse_monster_page(&html))
                .unwrap_or_default(),
        )
    }

    async fn merchants(&self, fallbacks: &mut FallbackCounter) -> EntityBatch {
        let html = self
            .site
            .fetch_rendered(rendered::MERCHANTS_PATH, Some(rendered::WAIT_SELECTOR))
            .await;
        EntityBatch::Merchants(
            html.map(|html| rendered::parse_merchant_page(&html, fallbacks))
                .unwrap_or_default(),
        )
    }
}

#[async_trait]
impl Scraper for BazaarScraper {
    async fn scrape(
        &self,
        kind: EntityKind,
        fallbacks: &mut FallbackCounter,
    ) -> IngestResult<EntityBatch> {
        let batch = match kind {
            EntityKind::Hero => self.heroes().await,
            EntityKind::Item => self.items().await,
            EntityKind::Skill => self.skills().await,
            EntityKind::Monster => self.monsters().await,
            EntityKind::Merchant => self.merchants(fallbacks).await,
        };
        info!(entity = %kind, count = batch.len(), "scraped");
        Ok(batch)
    }
}
