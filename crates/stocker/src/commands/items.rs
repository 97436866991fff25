//! Item command handlers.

use tabled::Tabled;

use stocker_core::{CoreError, Item, ItemDetail, Session};

use crate::cli::{GlobalOpts, ItemsArgs, ItemsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "UOM")]
    uom: String,
    #[tabled(rename = "Qty")]
    qty: String,
}

impl From<&Item> for ItemRow {
    fn from(i: &Item) -> Self {
        Self {
            code: i.item_code.clone().unwrap_or_default(),
            name: i.item_name.clone().unwrap_or_default(),
            uom: i.uom.clone().unwrap_or_default(),
            qty: util::fmt_qty(Some(i.qty)),
        }
    }
}

fn detail(item: &ItemDetail, barcode: &str, color: bool) -> String {
    [
        ("Barcode", barcode.to_owned()),
        ("Item", item.item_id.clone().unwrap_or_else(|| "-".into())),
        ("Name", item.item_name.clone().unwrap_or_else(|| "-".into())),
        ("UOM", item.uom.clone().unwrap_or_else(|| "-".into())),
        ("Total qty", util::fmt_qty(item.total_qty)),
        ("Shelf qty", util::fmt_qty(item.shelf_qty)),
    ]
    .iter()
    .map(|(label, value)| output::detail_line(label, value, color))
    .collect::<Vec<_>>()
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: ItemsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ItemsCommand::List { warehouse, barcode } => {
            let warehouse = util::warehouse_or_selected(session, warehouse);
            let items = session
                .api()
                .list_items(warehouse.as_deref(), barcode.as_deref())
                .await?;
            let out = output::render_list(
                &global.output,
                &items,
                |i| ItemRow::from(i),
                |i| i.item_code.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ItemsCommand::Show { barcode, warehouse } => {
            let warehouse = util::warehouse_or_selected(session, warehouse);
            let item = session
                .api()
                .get_item_by_barcode(&barcode, warehouse.as_deref())
                .await?
                .ok_or_else(|| CoreError::NotFound {
                    entity_type: "Item".into(),
                    identifier: barcode.trim().to_owned(),
                })?;

            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &item,
                |i| detail(i, barcode.trim(), color),
                |i| i.item_id.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
