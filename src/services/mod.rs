pub mod analytics_service;
pub mod chart_service;
pub mod chart_store;
pub mod page_service;
pub mod price_service;
pub mod symbol_service;

#[cfg(test)]
pub mod testing;

pub use chart_store::ChartStore;
