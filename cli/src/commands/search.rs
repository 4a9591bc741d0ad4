use anyhow::Result;
use std::process;

use larder_core::PlannerService;
use larder_core::models::Product;
use larder_core::reconcile::{Action, Bucket};

use super::helpers::print_product_table;

pub(crate) fn cmd_search(service: &PlannerService, term: &str, json: bool) -> Result<()> {
    let buckets = service.search(term)?;

    if buckets.is_empty() {
        if json {
            println!("{}", serde_json::to_string_pretty(&buckets)?);
        } else {
            eprintln!("No products match '{term}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
        return Ok(());
    }

    let sections = [
        (Bucket::InList, "On the list", &buckets.in_list),
        (Bucket::Recent, "Recently used", &buckets.recent),
        (Bucket::New, "Other products", &buckets.new),
    ];
    for (bucket, title, products) in sections {
        if products.is_empty() {
            continue;
        }
        let hint = match bucket.action() {
            Action::Remove => "larder list remove <id>",
            Action::Add => "larder list add <id>",
        };
        println!("{title} ({hint}):");
        let refs: Vec<&Product> = products.iter().collect();
        print_product_table(&refs);
    }
    Ok(())
}
