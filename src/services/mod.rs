pub mod analysis;
pub mod backtester;
pub mod cache;
pub mod optimizer;
pub mod signals;

pub use analysis::SignalService;
pub use backtester::Backtester;
pub use cache::{Cache, FetchCache, FetchFuture};
pub use optimizer::{GridSearch, ParameterGrid};
pub use signals::{IndicatorBank, IndicatorFrame, SignalScorer};
