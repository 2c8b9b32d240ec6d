mod report;
mod series;
mod settings;

pub use report::{CrawlReport, ScrapeObservation, TaskBatch};
pub use series::{NewSeries, Series};
pub use settings::Settings;
