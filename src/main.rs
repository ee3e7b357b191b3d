use chrono::Local;
use ratecard::billing::calculator::minor_units;
use ratecard::billing::{format_money, validate, Quote, RatePlanType, ValidatedModel};
use ratecard::catalog::{find_rate_plan, CatalogClient, RatePlan, DUPLICATE_NAME_MESSAGE};
use ratecard::cli::Cli;
use ratecard::config::{Config, ConfigLoader};
use ratecard::utils::{block_on, init_logging};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse_args();

    // Handle configuration commands
    if cli.init {
        Config::init()?;
        return Ok(());
    }

    if cli.print {
        ConfigLoader::load().print()?;
        return Ok(());
    }

    if cli.check {
        let config = Config::load()?;
        config.check()?;
        println!("✓ Configuration valid");
        return Ok(());
    }

    let config = ConfigLoader::load();

    // Catalog listings
    if cli.list {
        let client = CatalogClient::new(&config)?;
        let plans = block_on(client.rate_plans_with_fallback())??;
        print_rate_plans(&plans);
        return Ok(());
    }

    if cli.products {
        let client = CatalogClient::new(&config)?;
        let products = block_on(client.list_products())??;
        let today = Local::now().date_naive();
        for product in &products {
            let marker = if product.is_effective_on(today) { "✓" } else { "·" };
            println!(
                "{} {:<32} {:<10} {}",
                marker,
                product.product_name,
                product.product_type,
                product.status.as_deref().unwrap_or("-")
            );
        }
        return Ok(());
    }

    if let Some(name) = &cli.check_name {
        let client = CatalogClient::new(&config)?;
        if block_on(client.check_product_name(name))?? {
            eprintln!("✗ {}", DUPLICATE_NAME_MESSAGE);
            std::process::exit(1);
        }
        println!("✓ Product name {:?} is available", name.trim());
        return Ok(());
    }

    // Load the rate plan to work on
    let plan = if let Some(path) = &cli.plan {
        RatePlan::load(path)?
    } else if let Some(name) = &cli.fetch {
        let client = CatalogClient::new(&config)?;
        let plans = block_on(client.rate_plans_with_fallback())??;
        match find_rate_plan(&plans, name) {
            Some(plan) => plan.clone(),
            None => {
                eprintln!("Error: No rate plan named {:?}", name);
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("Error: Provide a rate plan with --plan FILE or --fetch NAME");
        std::process::exit(2);
    };

    let validated = match ValidatedModel::new(plan.pricing.clone()) {
        Ok(validated) => validated,
        Err(e) => {
            eprintln!("✗ {}: {}", plan.rate_plan_name, e.user_message());
            eprintln!("  ({})", e);
            std::process::exit(1);
        }
    };

    let usage = match cli.usage {
        Some(usage) if !cli.validate => usage,
        _ => {
            println!(
                "✓ {} ({}) is valid",
                plan.rate_plan_name,
                validated.model().rate_plan_type()
            );
            return Ok(());
        }
    };

    let currency = cli
        .currency
        .clone()
        .or_else(|| plan.currency.clone())
        .unwrap_or_else(|| config.billing.currency.clone());

    match validated.quote(usage, &currency) {
        Ok(quote) => {
            print_quote(&plan, &quote, cli.breakdown);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_rate_plans(plans: &[RatePlan]) {
    if plans.is_empty() {
        println!("No rate plans found");
        return;
    }

    for plan in plans {
        let status = match validate(&plan.pricing) {
            Ok(()) => "✓".to_string(),
            Err(e) => format!("✗ {}", e.user_message()),
        };
        let frequency = plan
            .billing_frequency
            .map_or_else(|| "-".to_string(), |f| f.to_string());
        println!(
            "{:<32} {:<13} {:<8} {}",
            plan.rate_plan_name,
            plan.pricing.rate_plan_type(),
            frequency,
            status
        );
    }
}

fn print_quote(plan: &RatePlan, quote: &Quote, breakdown: bool) {
    println!("Rate plan: {} ({})", plan.rate_plan_name, quote.rate_plan_type);
    if let Some(product) = &plan.product_name {
        println!("Product:   {}", product);
    }
    println!("Usage:     {}", quote.usage);

    if breakdown {
        let scale = minor_units(&quote.currency) as usize;
        for line in &quote.lines {
            let label = match line.tier_index {
                Some(index) => format!("tier {}", index + 1),
                None if quote.rate_plan_type == RatePlanType::FlatFee => "flat fee".to_string(),
                None => "usage".to_string(),
            };
            match line.unit_price {
                Some(unit_price) => println!(
                    "  {:<9} [{} – {})  {} × {} = {:.*}",
                    label, line.from, line.to, line.quantity, unit_price, scale, line.amount
                ),
                None => println!(
                    "  {:<9} [{} – {})  flat {:.*}",
                    label, line.from, line.to, scale, line.amount
                ),
            }
        }
    }

    println!("Charge:    {}", format_money(quote.total, &quote.currency));
}
