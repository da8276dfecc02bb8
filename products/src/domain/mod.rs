//! Domain layer: models, repository contracts and use cases.

pub mod error;
pub mod model;
pub mod repository;
pub mod usecase;

pub use error::RepositoryError;
pub use model::{Page, PageRequest, ProductItem};
pub use repository::{ProductsRepository, RepositoryFuture, TermsRepository};
pub use usecase::{GetProductsUseCase, GetTermsHistoryUseCase, ProductPages, SaveTermUseCase};
