pub mod cache;
pub mod normalize;
pub mod resolver;
pub mod service;

pub use cache::*;
pub use normalize::title_case;
pub use resolver::*;
pub use service::*;
