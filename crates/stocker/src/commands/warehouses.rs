//! Warehouse listing and selection.

use tabled::Tabled;

use stocker_core::{Session, Warehouse};

use crate::cli::{GlobalOpts, UseArgs, WarehousesArgs, WarehousesCommand};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WarehouseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "")]
    selected: &'static str,
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: WarehousesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        WarehousesCommand::List => {
            let warehouses = session.api().list_warehouses().await?;
            let current = session.warehouse().map(|w| w.warehouse_id);
            let out = output::render_list(
                &global.output,
                &warehouses,
                |w| WarehouseRow {
                    id: w.warehouse_id.clone(),
                    name: w.warehouse_name.clone(),
                    selected: if current.as_deref() == Some(w.warehouse_id.as_str()) {
                        "*"
                    } else {
                        ""
                    },
                },
                |w| w.warehouse_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// `stocker use`: pick a warehouse (and optionally a shelf), refresh the
/// token and persist the selection.
pub async fn select(
    session: &Session,
    args: UseArgs,
    mut cfg: Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.clear {
        session.select_warehouse(None).await?;
        session.set_shelf(None);
        cfg.selection.set_warehouse(None);
        cfg.selection.shelf = None;
        config::save_config(&cfg)?;
        if !global.quiet {
            eprintln!("Selection cleared");
        }
        return Ok(());
    }

    let wanted = args.warehouse.as_deref().unwrap_or_default();
    let warehouses = session.api().list_warehouses().await?;
    let warehouse = find_warehouse(&warehouses, wanted)
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "Warehouse".into(),
            identifier: wanted.to_owned(),
            list_command: "warehouses list".into(),
        })?;

    session.select_warehouse(Some(warehouse.clone())).await?;
    if args.shelf.is_some() {
        session.set_shelf(args.shelf.as_deref());
    }

    cfg.selection.set_warehouse(Some(&warehouse));
    cfg.selection.shelf = session.shelf();
    config::save_config(&cfg)?;

    if !global.quiet {
        let color = output::should_color(&global.color);
        let message = match session.shelf() {
            Some(shelf) => format!("Using {} / shelf {shelf}", warehouse.label()),
            None => format!("Using {}", warehouse.label()),
        };
        eprintln!("{}", output::success(&message, color));
    }
    Ok(())
}

/// Match by exact ID first, then by case-insensitive name.
fn find_warehouse<'a>(warehouses: &'a [Warehouse], wanted: &str) -> Option<&'a Warehouse> {
    let wanted = wanted.trim();
    warehouses
        .iter()
        .find(|w| w.warehouse_id == wanted)
        .or_else(|| {
            warehouses
                .iter()
                .find(|w| w.warehouse_name.eq_ignore_ascii_case(wanted))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warehouse(id: &str, name: &str) -> Warehouse {
        Warehouse {
            warehouse_id: id.into(),
            warehouse_name: name.into(),
        }
    }

    #[test]
    fn id_match_wins_over_name() {
        let all = [warehouse("Main", "Annex"), warehouse("W2", "Main")];
        assert_eq!(
            find_warehouse(&all, "Main").map(|w| w.warehouse_id.as_str()),
            Some("Main")
        );
    }

    #[test]
    fn name_match_ignores_case() {
        let all = [warehouse("W1", "Main Store")];
        assert_eq!(
            find_warehouse(&all, " main store ").map(|w| w.warehouse_id.as_str()),
            Some("W1")
        );
        assert!(find_warehouse(&all, "W9").is_none());
    }
}
