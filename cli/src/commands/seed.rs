use anyhow::Result;

use larder_core::PlannerService;

pub(crate) fn cmd_seed(service: &PlannerService, json: bool) -> Result<()> {
    let summary = service.seed()?;

    if json {
        println!("{}", serde_json::json!({ "seeded": summary }));
        return Ok(());
    }
    match summary {
        Some(s) => println!(
            "Seeded {} stores, {} products and {} recipes",
            s.stores, s.products, s.recipes
        ),
        None => println!("Database already has stores, nothing to seed"),
    }
    Ok(())
}
