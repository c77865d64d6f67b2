//! # Seed Data Generator
//!
//! Populates the local store with a development catalog and three plans.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by the config (default ./consulta.db)
//! cargo run -p consulta-db --bin seed
//!
//! # Specify database path
//! cargo run -p consulta-db --bin seed -- --db ./data/consulta.db
//!
//! # Print the module grid priced for another tier
//! cargo run -p consulta-db --bin seed -- --tier rei
//! ```
//!
//! ## Generated Data
//! - 4 panels, one of them (38) exempt from discounts by default
//! - 11 modules with BRL prices
//! - Plans `valete`, `rei` and `rainha` built through the plan editor, so
//!   their panel lists and features are derived the same way the admin
//!   form derives them

use std::env;
use std::path::PathBuf;

use consulta_core::{
    Module, ModuleId, Money, OperationalStatus, Panel, PanelId, PanelTemplate, PlanCategory,
    PlanDraft,
};
use consulta_db::{AppConfig, Database, PlanEditor};
use tracing_subscriber::EnvFilter;

/// (id, name, icon, color, template, premium)
const PANELS: &[(i64, &str, &str, &str, PanelTemplate, bool)] = &[
    (1, "Pessoa Física", "user", "#2563eb", PanelTemplate::Standard, false),
    (2, "Veículos", "car", "#16a34a", PanelTemplate::Modern, false),
    (3, "Empresas", "building", "#9333ea", PanelTemplate::Corporate, false),
    (38, "Consultas Premium", "crown", "#ca8a04", PanelTemplate::Dark, true),
];

/// (id, panel_id, title, price in centavos)
const MODULES: &[(i64, i64, &str, i64)] = &[
    (1, 1, "CPF Simples", 490),
    (2, 1, "CPF Completo", 1290),
    (3, 1, "Score de Crédito", 1990),
    (4, 1, "Telefones por CPF", 890),
    (10, 2, "Placa", 990),
    (11, 2, "Chassi", 1490),
    (12, 2, "Renavam", 1190),
    (20, 3, "CNPJ Completo", 1590),
    (21, 3, "Quadro Societário", 1990),
    (380, 38, "Dossiê Completo", 4990),
    (381, 38, "Busca Nacional", 3990),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,consulta=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn panel(&(id, name, icon, color, template, premium): &(i64, &str, &str, &str, PanelTemplate, bool)) -> Panel {
    Panel {
        id: PanelId::new(id),
        name: name.to_string(),
        slug: consulta_core::slugify(name),
        description: Some(format!("Consultas de {}", name.to_lowercase())),
        icon: Some(icon.to_string()),
        color: Some(color.to_string()),
        background_color: None,
        category: None,
        template,
        is_active: true,
        is_premium: premium,
        sort_order: id as i32,
    }
}

fn module(&(id, panel_id, title, price_cents): &(i64, i64, &str, i64)) -> Module {
    let slug = consulta_core::slugify(title);
    Module {
        id: ModuleId::new(id),
        panel_id: PanelId::new(panel_id),
        title: title.to_string(),
        api_endpoint: Some(format!("/dashboard/{}", slug)),
        slug,
        description: None,
        icon: None,
        color: None,
        price: Money::from_cents(price_cents),
        cost_price: Money::from_cents(price_cents * 40 / 100),
        operational_status: OperationalStatus::On,
        is_active: true,
        is_premium: false,
        sort_order: id as i32,
    }
}

fn fill_plan(
    draft: &mut PlanDraft,
    name: &str,
    price_cents: i64,
    category: PlanCategory,
    discount_percentage: f64,
) {
    draft.set_name(name);
    let fields = draft.fields_mut();
    fields.price = Money::from_cents(price_cents);
    fields.category = category;
    fields.discount_percentage = discount_percentage;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut tier = String::from("rainha");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--tier" | "-t" => {
                if i + 1 < args.len() {
                    tier = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Consulta Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (overrides config)");
                println!("  -c, --config <PATH>   Config file (default: platform config dir)");
                println!("  -t, --tier <SLUG>     Tier used for the price grid (default: rainha)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("🌱 Consulta Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.panels().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} panels", existing);
        println!("  Skipping catalog seed to avoid duplicates.");
    } else {
        for row in PANELS {
            db.panels().insert(&panel(row)).await?;
        }
        for row in MODULES {
            db.modules().insert(&module(row)).await?;
        }
        println!("✓ Inserted {} panels, {} modules", PANELS.len(), MODULES.len());

        let mut editor = PlanEditor::new(db.clone());

        let mut valete = editor.open_new().await?;
        fill_plan(&mut valete, "Valete", 2990, PlanCategory::Basic, 5.0);
        valete.selection_mut().toggle_module(ModuleId::new(1), true);
        valete.selection_mut().toggle_module(ModuleId::new(10), true);
        editor.save(&mut valete).await?;

        let mut rei = editor.open_new().await?;
        fill_plan(&mut rei, "Rei", 4990, PlanCategory::Professional, 10.0);
        rei.selection_mut().toggle_panel(PanelId::new(1), true);
        rei.selection_mut().toggle_module(ModuleId::new(10), true);
        rei.fields_mut().is_popular = true;
        editor.save(&mut rei).await?;

        let mut rainha = editor.open_new().await?;
        fill_plan(&mut rainha, "Rainha", 9990, PlanCategory::Enterprise, 15.0);
        rainha.fields_mut().original_price = Some(Money::from_cents(12990));
        for id in [1, 2, 3] {
            rainha.selection_mut().toggle_panel(PanelId::new(id), true);
        }
        rainha.selection_mut().toggle_module(ModuleId::new(380), true);
        editor.save(&mut rainha).await?;

        println!("✓ Created plans valete, rei, rainha");
    }

    let plans = db.plans().list().await?;
    let policy = config.discount_policy(&plans);
    let panels = db.panels().list().await?;

    println!();
    println!("Module prices for tier '{}':", tier);
    for module in db.modules().list().await?.iter().filter(|m| m.is_active) {
        let quote = policy.quote(module.price, Some(&tier), Some(module.panel_id));
        let panel_name = panels
            .iter()
            .find(|p| p.id == module.panel_id)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        println!(
            "  {:<18} {:<20} {:>10} → {:>10} ({}%)",
            panel_name,
            module.title,
            module.price.to_string(),
            quote.final_price.to_string(),
            quote.discount.percentage()
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
