//! Deal command handlers

use anyhow::{bail, Context, Result};

use dealbook_core::validation::parse_json;
use dealbook_core::{Api, DealPatch, DealStatus, NewDeal, PositionUpdate, Priority, RecordId};

use crate::output::Output;
use crate::prompt::confirm;

/// Deal fields given on the command line
pub struct DealFields {
    pub account: Option<String>,
    pub name: Option<String>,
    pub quarter: Option<String>,
    pub status: Option<DealStatus>,
    pub priority: Option<Priority>,
    pub area: Option<String>,
    pub vendor: Option<RecordId>,
    pub forecast: Option<i64>,
}

impl DealFields {
    fn into_patch(self) -> DealPatch {
        DealPatch {
            account_name: self.account,
            deal_name: self.name,
            quarter: self.quarter,
            status: self.status,
            priority: self.priority,
            area: self.area,
            vendor_id: self.vendor,
            forecast_amount: self.forecast,
        }
    }
}

/// Create a new deal at the end of the list
pub fn create(api: &mut Api, token: Option<&str>, new: NewDeal, output: &Output) -> Result<()> {
    let deal = api.create_deal(token, new).context("Failed to create deal")?;

    output.success(&format!("Created deal: {}", deal.id));
    output.print_deal(&deal);

    Ok(())
}

/// List deals in display order, optionally filtered
pub fn list(
    api: &Api,
    token: Option<&str>,
    quarter: Option<String>,
    status: Option<DealStatus>,
    output: &Output,
) -> Result<()> {
    let deals: Vec<_> = api
        .list_deals(token)?
        .into_iter()
        .filter(|d| quarter.as_deref().map_or(true, |q| d.quarter == q))
        .filter(|d| status.map_or(true, |s| d.status == s))
        .collect();

    output.print_deals(&deals);
    Ok(())
}

/// Show a single deal
pub fn show(api: &Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let deal = api.get_deal(token, id)?;
    output.print_deal(&deal);
    Ok(())
}

/// Change the given fields of a deal
pub fn edit(
    api: &mut Api,
    token: Option<&str>,
    id: RecordId,
    fields: DealFields,
    output: &Output,
) -> Result<()> {
    let patch = fields.into_patch();
    if patch.is_empty() {
        bail!("Nothing to change. Pass at least one field, e.g. --status Done");
    }

    let deal = api
        .update_deal(token, id, patch)
        .context("Failed to update deal")?;

    output.success("Deal updated");
    output.print_deal(&deal);

    Ok(())
}

/// Delete a deal
pub fn delete(api: &mut Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let deal = api.get_deal(token, id)?;

    // Confirm deletion
    if output.should_prompt() {
        println!(
            "Delete deal: #{} - {} / {}",
            deal.id, deal.account_name, deal.deal_name
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    api.delete_deal(token, id).context("Failed to delete deal")?;

    output.success(&format!("Deleted deal: {}", id));

    Ok(())
}

/// Move a deal to a 0-based index in the current order
pub fn move_to(
    api: &mut Api,
    token: Option<&str>,
    id: RecordId,
    to: usize,
    output: &Output,
) -> Result<()> {
    let deals = api
        .move_deal(token, id, to)
        .with_context(|| format!("Failed to move deal {}", id))?;

    output.success(&format!("Moved deal {} to position {}", id, to));
    output.print_deals(&deals);

    Ok(())
}

/// Apply a JSON batch of `{"id": .., "position": ..}` entries
pub fn reorder(api: &mut Api, token: Option<&str>, positions: &str, output: &Output) -> Result<()> {
    let updates: Vec<PositionUpdate> = parse_json(positions)?;
    let requested = updates.len();

    let applied = api
        .reorder_deals(token, updates)
        .context("Failed to reorder deals")?;

    output.success(&format!("Applied {} of {} position(s)", applied, requested));
    Ok(())
}

/// Show pipeline totals
pub fn summary(
    api: &Api,
    token: Option<&str>,
    quarter: Option<String>,
    output: &Output,
) -> Result<()> {
    let summary = api.deal_summary(token, quarter.as_deref())?;
    output.print_summary(&summary);
    Ok(())
}
