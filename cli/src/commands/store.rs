use anyhow::Result;
use std::process;
use tabled::{Table, Tabled, settings::Style};

use larder_core::db::Database;
use larder_core::models::NewStore;

use super::helpers::{json_error, truncate};
use super::resolve_store;

pub(crate) fn cmd_store_add(
    db: &Database,
    name: &str,
    maps_url: Option<String>,
    photo: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let store = db.insert_store(&NewStore {
        name: name.to_string(),
        photo,
        maps_url,
        notes,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&store)?);
    } else {
        let (name, id) = (&store.name, store.id);
        println!("Added store: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_store_list(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct StoreRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Map")]
        maps_url: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let stores = db.list_stores()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stores)?);
        return Ok(());
    }
    if stores.is_empty() {
        eprintln!("No stores yet. Add one with: larder store add <name>");
        return Ok(());
    }

    let rows: Vec<StoreRow> = stores
        .iter()
        .map(|s| StoreRow {
            id: s.id,
            name: truncate(&s.name, 30),
            maps_url: truncate(s.maps_url.as_deref().unwrap_or_default(), 40),
            notes: truncate(s.notes.as_deref().unwrap_or_default(), 30),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}

pub(crate) fn cmd_store_delete(db: &Database, store: &str, json: bool) -> Result<()> {
    let store = match resolve_store(db, store) {
        Ok(s) => s,
        Err(e) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            process::exit(2);
        }
    };

    db.delete_store(store.id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": store.id }));
    } else {
        let (name, id) = (&store.name, store.id);
        println!("Deleted store: {name} (id: {id}). Its products were kept.");
    }
    Ok(())
}
