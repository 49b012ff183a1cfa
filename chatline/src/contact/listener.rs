use async_trait::async_trait;

use crate::models::ContactSummary;

#[async_trait]
pub trait ContactListListener: Send + Sync {
    async fn on_contacts_loaded(&self, contacts: Vec<ContactSummary>);

    async fn on_load_failed(&self, reason: String);
}

pub(super) struct StubListener;

#[async_trait]
impl ContactListListener for StubListener {
    async fn on_contacts_loaded(&self, _contacts: Vec<ContactSummary>) {}

    async fn on_load_failed(&self, _reason: String) {}
}
