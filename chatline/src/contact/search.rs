use crate::models::ContactSummary;

/// Filter the contact list by display name or username, ignoring case.
///
/// An empty query, or one that matches nobody, yields the full list.
pub fn filter_contacts(contacts: &[ContactSummary], query: &str) -> Vec<ContactSummary> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return contacts.to_vec();
    }
    let matches: Vec<ContactSummary> = contacts
        .iter()
        .filter(|c| {
            c.display_name.to_lowercase().contains(&query)
                || c.username
                    .as_deref()
                    .map(|u| u.to_lowercase().contains(&query))
                    .unwrap_or(false)
        })
        .cloned()
        .collect();
    if matches.is_empty() {
        contacts.to_vec()
    } else {
        matches
    }
}
