//! `partpick lookup` command - check stock and price for one supplier code

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::utils::{load_config, open_lookup};
use crate::cli::helpers::format_price;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{LookupError, LookupSession, PartLookup};

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Supplier code to look up (e.g., C25804)
    pub code: String,

    /// Quantity to quote a price for
    #[arg(long, short = 'n', default_value_t = 1)]
    pub qty: u64,

    /// Use an offline YAML catalog instead of the live LCSC catalog
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

pub fn run(args: LookupArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = load_config()?;
    if args.catalog.is_some() {
        config.catalog = args.catalog.clone();
    }

    let mut session = LookupSession::new(open_lookup(&config)?);
    let mut result = session
        .query(&args.code)
        .map_err(|e| miette::miette!("{}", e))?;

    if result.is_eligible_for(args.qty) {
        match session.quote_price(&result.code, args.qty) {
            Ok(quote) => result.quote = Some(quote),
            Err(e @ LookupError::Fatal { .. }) => return Err(miette::miette!("{}", e)),
            Err(e) => tracing::debug!("no price for '{}': {e}", result.code),
        }
    }
    session.close().map_err(|e| miette::miette!("{}", e))?;

    if global.format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&result).map_err(|e| miette::miette!("{}", e))?;
        println!("{}", json);
        return Ok(());
    }

    let status = if result.in_stock {
        style("In-Stock").green()
    } else {
        style("Out of Stock").red()
    };
    println!("{} {}", style(&result.code).cyan().bold(), status);
    println!("  Available:  {}", style(result.available_quantity).cyan());
    match result.quote {
        Some(quote) => {
            println!(
                "  Unit price: {} at {} unit(s)",
                style(format_price(quote.unit_price)).yellow(),
                quote.rounded_purchase_quantity
            );
        }
        None if !global.quiet => {
            println!(
                "  {}",
                style(format!("Cannot be bought in a quantity of {}", args.qty)).dim()
            );
        }
        None => {}
    }

    Ok(())
}
