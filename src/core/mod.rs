/// Core functionality modules
///
/// Event recording and history retrieval in front of the store.

pub mod recorder;
pub mod retriever;

pub use recorder::Recorder;
pub use retriever::{HistoryFilter, Retriever};
