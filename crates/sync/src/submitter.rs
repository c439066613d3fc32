//! Invoice submission and order ↔ invoice linking.

use orderbridge_accounting::{AccountingClient, Invoice, InvoiceId, RemoteError};
use orderbridge_commerce::Order;
use orderbridge_infra::LinkStore;

use crate::error::{Stage, SyncError};
use crate::invoice_builder::InvoiceBuilder;

/// Saves an invoice, corrects rounding drift, and writes the order's link.
///
/// Exactly one link is written per successful submission and none on
/// failure. Deduplication is the caller's job.
#[derive(Debug, Clone)]
pub struct InvoiceSubmitter<C, L> {
    client: C,
    links: L,
    builder: InvoiceBuilder,
}

impl<C, L> InvoiceSubmitter<C, L>
where
    C: AccountingClient,
    L: LinkStore,
{
    pub fn new(client: C, links: L, builder: InvoiceBuilder) -> Self {
        Self {
            client,
            links,
            builder,
        }
    }

    pub fn submit(&self, order: &Order, invoice: &Invoice) -> Result<Invoice, SyncError> {
        let mut saved = self.save(order, invoice)?;

        match saved.total {
            Some(total) => {
                if let Some(line) = self.builder.rounding_line(order, total) {
                    tracing::info!(
                        order_id = %order.id,
                        remote_total = %total,
                        adjustment = %line.unit_amount,
                        "adding rounding adjustment"
                    );
                    saved.add_line_item(line);
                    saved = self.save(order, &saved)?;
                }
            }
            None => tracing::warn!(
                order_id = %order.id,
                "accounting service returned no invoice total; skipping rounding check"
            ),
        }

        let invoice_id = invoice_id(&saved)?;
        self.links.create(order.id, invoice_id).map_err(|err| {
            tracing::error!(
                order_id = %order.id,
                invoice_id = %invoice_id,
                error = %err,
                "invoice saved but link could not be recorded"
            );
            SyncError::from(err)
        })?;

        tracing::info!(
            order_id = %order.id,
            invoice_id = %invoice_id,
            invoice_number = %saved.invoice_number,
            "invoice submitted"
        );
        Ok(saved)
    }

    fn save(&self, order: &Order, invoice: &Invoice) -> Result<Invoice, SyncError> {
        self.client.save_invoice(invoice).map_err(|err| {
            tracing::error!(
                message = %err.message,
                code = err.code,
                order_id = %order.id,
                "invoice save failed"
            );
            SyncError::remote(Stage::Invoice, err)
        })
    }
}

fn invoice_id(invoice: &Invoice) -> Result<InvoiceId, SyncError> {
    invoice.id.ok_or_else(|| {
        SyncError::remote(
            Stage::Invoice,
            RemoteError::new("saved invoice has no InvoiceID", 0),
        )
    })
}
