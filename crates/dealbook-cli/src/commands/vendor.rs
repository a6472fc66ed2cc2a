//! Vendor command handlers

use anyhow::{bail, Context, Result};

use dealbook_core::{Api, NewVendor, RecordId, VendorPatch};

use crate::output::Output;
use crate::prompt::confirm;

pub fn create(
    api: &mut Api,
    token: Option<&str>,
    name: String,
    user: Option<RecordId>,
    output: &Output,
) -> Result<()> {
    let vendor = api
        .create_vendor(token, NewVendor { name, user_id: user })
        .context("Failed to create vendor")?;

    output.success(&format!("Created vendor: {}", vendor.id));
    output.print_vendor(&vendor);
    Ok(())
}

pub fn list(api: &Api, token: Option<&str>, output: &Output) -> Result<()> {
    let vendors = api.list_vendors(token)?;
    output.print_vendors(&vendors);
    Ok(())
}

pub fn show(api: &Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let vendor = api.get_vendor(token, id)?;
    output.print_vendor(&vendor);
    Ok(())
}

pub fn edit(
    api: &mut Api,
    token: Option<&str>,
    id: RecordId,
    name: Option<String>,
    user: Option<RecordId>,
    output: &Output,
) -> Result<()> {
    if name.is_none() && user.is_none() {
        bail!("Nothing to change. Pass --name or --user");
    }

    let vendor = api
        .update_vendor(token, id, VendorPatch { name, user_id: user })
        .context("Failed to update vendor")?;

    output.success("Vendor updated");
    output.print_vendor(&vendor);
    Ok(())
}

pub fn delete(api: &mut Api, token: Option<&str>, id: RecordId, output: &Output) -> Result<()> {
    let vendor = api.get_vendor(token, id)?;

    if output.should_prompt() {
        println!("Delete vendor: #{} - {}", vendor.id, vendor.name);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    api.delete_vendor(token, id)
        .context("Failed to delete vendor")?;

    output.success(&format!("Deleted vendor: {}", id));
    Ok(())
}
