//! Example: renumber conflicting identifiers in a meta file pair
//!
//! Runs the catalog pass and then the kit pass over a `carcols.meta` /
//! `carvariations.meta` pair, optionally limited to one vehicle, and prints
//! what changed. The files are rewritten in place, so run it on copies.
//!
//! Usage: cargo run --example resolve <carcols.meta> <carvariations.meta> [vehicle]

use std::env;

use vehicle_meta::{ConflictResolver, Inventory, ResolverConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args.len() > 4 {
        eprintln!(
            "Usage: {} <carcols.meta> <carvariations.meta> [vehicle]",
            args[0]
        );
        std::process::exit(1);
    }

    let vehicle = args.get(3).map(String::as_str);
    let config = ResolverConfig::default();
    let mut resolver = ConflictResolver::open(&args[1], &args[2], &config)?;

    eprintln!("Before:");
    eprint!(
        "{}",
        Inventory::collect(resolver.catalog().document(), resolver.variations().document())
    );

    let sirens = resolver.resolve_catalog_conflicts(vehicle)?;
    println!("Siren settings:\n{}", sirens);

    let kits = resolver.resolve_kit_conflicts(vehicle)?;
    println!("Modkits:\n{}", kits);

    eprintln!(
        "{} identifiers now claimed",
        resolver.allocator().claimed_count()
    );
    Ok(())
}
