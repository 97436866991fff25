//! Stock entry command handlers.

use chrono::{Local, NaiveDateTime};
use tabled::Tabled;

use stocker_api::DATE_TIME_FORMAT;
use stocker_core::{
    MutationOutcome, NewStockEntry, Session, StockEntry, StockEntryFilter, StockEntryUpdate,
    Warehouse,
};

use crate::cli::{CreateEntryArgs, EntriesArgs, EntriesCommand, GlobalOpts, UpdateEntryArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Barcode")]
    barcode: String,
    #[tabled(rename = "Shelf")]
    shelf: String,
    #[tabled(rename = "Qty")]
    qty: String,
    #[tabled(rename = "UOM")]
    uom: String,
}

impl From<&StockEntry> for EntryRow {
    fn from(e: &StockEntry) -> Self {
        Self {
            id: e.entry_id.clone(),
            date: e.date.clone(),
            item: e.item_code.clone(),
            barcode: e.barcode.clone(),
            shelf: e.shelf.clone(),
            qty: util::fmt_qty(e.qty),
            uom: e.uom.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: EntriesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        EntriesCommand::List { today, warehouse } => {
            let mut filter = util::warehouse_or_selected(session, warehouse)
                .map_or_else(StockEntryFilter::default, StockEntryFilter::warehouse);
            if today {
                filter = filter.today();
            }

            let entries = session.api().list_stock_entries(&filter).await?;
            let out = output::render_list(
                &global.output,
                &entries,
                |e| EntryRow::from(e),
                |e| e.entry_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EntriesCommand::Create(create) => {
            let outcome = create_entry(session, create).await?;
            print_outcome(&outcome, "Created", global)
        }

        EntriesCommand::Update(update) => {
            let update = build_update(session, update)?;
            let outcome = session
                .api()
                .update_stock_entry(&update)
                .await?
                .into_result()?;
            print_outcome(&outcome, "Updated", global)
        }

        EntriesCommand::Delete { entry_id } => {
            if !util::confirm(&format!("Delete stock entry '{entry_id}'?"), global.yes)? {
                return Ok(());
            }
            let outcome = session
                .api()
                .delete_stock_entry(&entry_id)
                .await?
                .into_result()?;
            print_outcome(&outcome, "Deleted", global)
        }
    }
}

// ── Create / update ─────────────────────────────────────────────────

async fn create_entry(
    session: &Session,
    args: CreateEntryArgs,
) -> Result<MutationOutcome, CliError> {
    if let Some(id) = args.warehouse {
        let shelf = args.shelf.clone().or_else(|| session.shelf());
        session.restore_selection(
            Some(Warehouse {
                warehouse_id: id,
                warehouse_name: String::new(),
            }),
            shelf.as_deref(),
        );
    } else if args.shelf.is_some() {
        session.set_shelf(args.shelf.as_deref());
    }

    // Without an explicit item the barcode is looked up first.
    let Some(item_id) = args.item_id else {
        return Ok(session
            .record_count(&args.barcode, args.qty, args.uom.as_deref())
            .await?);
    };

    check_qty(args.qty)?;
    let entry = NewStockEntry {
        item_id,
        uom: args.uom.unwrap_or_default(),
        qty: args.qty,
        warehouse: session.require_warehouse()?.warehouse_id,
        barcode: args.barcode.trim().to_owned(),
        shelf: session.require_shelf()?,
        date_time: Some(Local::now().naive_local()),
    };
    Ok(session
        .api()
        .create_stock_entry(&entry)
        .await?
        .into_result()?)
}

fn build_update(session: &Session, args: UpdateEntryArgs) -> Result<StockEntryUpdate, CliError> {
    check_qty(args.qty)?;
    let warehouse = match args.warehouse {
        Some(id) => id,
        None => session.require_warehouse()?.warehouse_id,
    };
    let shelf = match args.shelf {
        Some(shelf) => shelf,
        None => session.require_shelf()?,
    };
    let date = match args.date.as_deref() {
        Some(raw) => parse_date_time(raw)?,
        None => Local::now().naive_local(),
    };

    Ok(StockEntryUpdate {
        entry_id: args.entry_id,
        warehouse,
        barcode: args.barcode,
        shelf,
        date,
        item_code: args.item_code,
        uom: args.uom,
        qty: args.qty,
    })
}

fn check_qty(qty: f64) -> Result<(), CliError> {
    if qty.is_finite() && qty > 0.0 {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "qty".into(),
            reason: format!("must be greater than zero, got {qty}"),
        })
    }
}

fn parse_date_time(raw: &str) -> Result<NaiveDateTime, CliError> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT).map_err(|e| {
        CliError::Validation {
            field: "date".into(),
            reason: format!("expected YYYY-MM-DD HH:MM:SS, got '{raw}': {e}"),
        }
    })
}

// ── Output ──────────────────────────────────────────────────────────

fn print_outcome(
    outcome: &MutationOutcome,
    verb: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        outcome,
        |o| {
            let id = o.entry_id.as_deref().unwrap_or("-");
            let mut lines = vec![output::success(&format!("{verb} stock entry {id}"), color)];
            if let Some(message) = o.message.as_deref().filter(|m| !m.is_empty()) {
                lines.push(output::detail_line("Message", message, color));
            }
            lines.join("\n")
        },
        |o| o.entry_id.clone().unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn date_time_uses_server_format() {
        let parsed = parse_date_time(" 2024-03-09 08:30:00 ").unwrap();
        assert_eq!(parsed.to_string(), "2024-03-09 08:30:00");
        assert!(parse_date_time("09/03/2024").is_err());
    }

    #[test]
    fn zero_negative_or_nan_qty_is_rejected() {
        assert!(check_qty(0.0).is_err());
        assert!(check_qty(2.5).is_ok());
        assert!(check_qty(-1.0).is_err());
        assert!(check_qty(f64::NAN).is_err());
    }
}
