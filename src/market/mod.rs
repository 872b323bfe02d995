pub mod domain;
pub mod repository;
pub mod workflow;

pub use domain::{Decision, DomainError, IdeaDraft, IdeaSearch, Viewer};
pub use repository::{
    ApplicationFilter, IdeaFilter, MarketRepository, RepositoryError, SqliteMarketRepository,
};
