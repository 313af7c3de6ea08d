//! Business logic services

pub mod catalog;
pub mod inventory;
pub mod reports;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub inventory: inventory::InventoryService,
    pub reports: reports::ReportAggregator,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.books.clone()),
            inventory: inventory::InventoryService::new(repository.inventory.clone()),
            reports: reports::ReportAggregator::new(repository.books, repository.borrows),
        }
    }
}
