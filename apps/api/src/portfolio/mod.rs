// Portfolio: past work samples indexed by tech stack, queried by job skills.

pub mod store;

pub use store::{CsvPortfolio, PortfolioIndex, PortfolioLink};
