use analyzer::resolution::IndexOptions;
use analyzer::runner::{NameLocation, resolve_names};
use anyhow::Result;
use std::path::PathBuf;

pub fn run(sources: &[PathBuf], names: &[String], strict_parse: bool) -> Result<()> {
    let options = IndexOptions {
        strict_parse,
        ..IndexOptions::default()
    };

    for resolution in resolve_names(sources, names, options)? {
        match resolution.resolved {
            Some((qualified_name, NameLocation::Source(path))) => {
                println!("{} -> {qualified_name} ({})", resolution.name, path.display())
            }
            Some((qualified_name, NameLocation::External)) => {
                println!("{} -> {qualified_name} (external)", resolution.name)
            }
            None => println!("{} -> unresolved", resolution.name),
        }
    }
    Ok(())
}
