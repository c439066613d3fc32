//! Find-or-create the remote contact for an order's purchaser.

use orderbridge_accounting::{AccountingClient, Contact, Filter};
use orderbridge_commerce::Purchaser;

use crate::error::{Stage, SyncError};
use crate::settings::ContactMatch;

#[derive(Debug, Clone)]
pub struct ContactResolver<C> {
    client: C,
    strategy: ContactMatch,
}

impl<C> ContactResolver<C>
where
    C: AccountingClient,
{
    pub fn new(client: C, strategy: ContactMatch) -> Self {
        Self { client, strategy }
    }

    /// Query used to look up an existing contact for `purchaser`.
    pub fn filter_for(&self, purchaser: &Purchaser) -> Filter {
        let name = purchaser.display_name.as_str();
        let email = purchaser.email.as_str();
        match self.strategy {
            ContactMatch::LegacyDisplayName => {
                Filter::eq("Name", name).or(Filter::eq("EmailAddress", name))
            }
            ContactMatch::Name => Filter::eq("Name", name),
            ContactMatch::Email => Filter::eq("EmailAddress", email),
            ContactMatch::NameOrEmail => {
                Filter::eq("Name", name).or(Filter::eq("EmailAddress", email))
            }
        }
    }

    /// Existing contact for `purchaser`, or a newly created one.
    pub fn resolve(&self, purchaser: &Purchaser) -> Result<Contact, SyncError> {
        let filter = self.filter_for(purchaser);
        let found = self.client.find_contact(&filter).map_err(|err| {
            tracing::error!(
                message = %err.message,
                code = err.code,
                filter = %filter,
                "contact lookup failed"
            );
            SyncError::remote(Stage::Contact, err)
        })?;

        if let Some(contact) = found {
            tracing::info!(contact = %purchaser.display_name, "matched existing contact");
            return Ok(contact);
        }

        let contact = Contact::new(purchaser.display_name.clone())
            .with_first_name(purchaser.first_name.clone())
            .with_last_name(purchaser.last_name.clone())
            .with_email(purchaser.email.clone());

        let saved = self.client.save_contact(&contact).map_err(|err| {
            tracing::error!(
                message = %err.message,
                code = err.code,
                contact = %purchaser.display_name,
                "contact creation failed"
            );
            SyncError::remote(Stage::Contact, err)
        })?;
        tracing::info!(contact = %saved.name, "created contact");
        Ok(saved)
    }
}
