mod listener;
mod manager;
mod search;
mod summarizer;

pub use listener::ContactListListener;
pub use manager::{ContactListManager, LoadOutcome};
pub use search::filter_contacts;
pub use summarizer::Summarizer;

use listener::StubListener;
