// src/services/reclamation_service.rs
//
// Runs orphan reclamation over every content repository. Referencing kinds
// go first: removing an orphaned recipe can orphan the items and category it
// pointed at, which the later passes then pick up.

use std::sync::Arc;

use serde::Serialize;

use crate::config::DEFAULT_ORPHAN_BATCH_SIZE;
use crate::error::AppResult;
use crate::repositories::{
    reclaim_orphans, CategoryRepository, ItemRepository, RecipeRepository, ReclamationReport,
    TechnologyRepository,
};

/// Reports of one reclamation run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GarbageCollectionReport {
    pub reports: Vec<ReclamationReport>,
}

impl GarbageCollectionReport {
    pub fn total_deleted(&self) -> usize {
        self.reports.iter().map(|r| r.deleted).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.reports.iter().all(ReclamationReport::is_complete)
    }
}

pub struct ReclamationService {
    category_repo: Arc<dyn CategoryRepository>,
    item_repo: Arc<dyn ItemRepository>,
    recipe_repo: Arc<dyn RecipeRepository>,
    technology_repo: Arc<dyn TechnologyRepository>,
    batch_size: usize,
}

impl ReclamationService {
    pub fn new(
        category_repo: Arc<dyn CategoryRepository>,
        item_repo: Arc<dyn ItemRepository>,
        recipe_repo: Arc<dyn RecipeRepository>,
        technology_repo: Arc<dyn TechnologyRepository>,
    ) -> Self {
        Self {
            category_repo,
            item_repo,
            recipe_repo,
            technology_repo,
            batch_size: DEFAULT_ORPHAN_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn run(&self) -> AppResult<GarbageCollectionReport> {
        let reports = vec![
            reclaim_orphans(self.technology_repo.as_ref(), self.batch_size)?,
            reclaim_orphans(self.recipe_repo.as_ref(), self.batch_size)?,
            reclaim_orphans(self.category_repo.as_ref(), self.batch_size)?,
            reclaim_orphans(self.item_repo.as_ref(), self.batch_size)?,
        ];
        let report = GarbageCollectionReport { reports };

        if !report.is_complete() {
            log::warn!("orphan reclamation left failed batches behind");
        }
        log::info!("orphan reclamation removed {} rows", report.total_deleted());

        Ok(report)
    }
}
