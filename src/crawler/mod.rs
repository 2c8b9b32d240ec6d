mod batch;
mod episodes;
mod runner;
mod session;

#[cfg(test)]
mod testing;

pub use batch::crawl_batch;
pub use episodes::extract_episode_ids;
pub use runner::{RetryPolicy, ScrapeRunner};
pub use session::HttpSessionFactory;
