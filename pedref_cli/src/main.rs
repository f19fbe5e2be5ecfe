use clap::{Parser, Subcommand};
use pedref_core::records::{
    add_checklist_item, add_contact, list_checklist, list_contacts, load_preferences,
    remove_checklist_item, remove_contact, save_preferences, set_checklist_done, ChecklistItem,
    Contact, Preferences,
};
use pedref_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "pedref")]
#[command(about = "Pediatric emergency reference tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ProfileOverrides {
    /// Weight in kg (overrides the stored profile for this call)
    #[arg(long)]
    weight_kg: Option<f64>,

    /// Age in months (overrides the stored profile for this call)
    #[arg(long)]
    age_months: Option<f64>,

    /// Length in cm (overrides the stored profile for this call)
    #[arg(long)]
    length_cm: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a medication dose
    Dose {
        /// Medication id (e.g. epinephrine)
        medication: String,

        /// Select a specific indication
        #[arg(long)]
        indication: Option<String>,

        #[command(flatten)]
        overrides: ProfileOverrides,
    },

    /// Resolve an equipment size
    Size {
        /// Equipment id (e.g. ett-uncuffed)
        equipment: String,

        #[command(flatten)]
        overrides: ProfileOverrides,
    },

    /// Resolve a vital-sign reference range
    Vitals {
        /// Vital id (e.g. heart-rate)
        vital: String,

        #[command(flatten)]
        overrides: ProfileOverrides,
    },

    /// Estimate the patient's weight
    Weight {
        /// Estimation method (standard, apls, erc, luscombe)
        #[arg(long)]
        method: Option<String>,

        #[command(flatten)]
        overrides: ProfileOverrides,
    },

    /// Show or edit the stored patient profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage emergency contacts
    Contacts {
        #[command(subcommand)]
        command: ContactCommands,
    },

    /// Manage the preparation checklist
    Checklist {
        #[command(subcommand)]
        command: ChecklistCommands,
    },

    /// Show or set preferences
    Prefs {
        /// Set the default estimation method
        #[arg(long)]
        method: Option<String>,
    },

    /// Seed the reference collections from the bundled catalog
    Seed,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Print the stored profile
    Show,
    /// Set one or more measurements
    Set {
        #[command(flatten)]
        values: ProfileOverrides,
    },
    /// Clear the stored profile entirely
    Reset,
}

#[derive(Subcommand)]
enum ContactCommands {
    Add {
        name: String,
        phone: String,
        #[arg(long)]
        role: Option<String>,
    },
    List,
    Remove {
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum ChecklistCommands {
    Add { text: String },
    List,
    Done { id: Uuid },
    Remove { id: Uuid },
}

fn main() -> Result<()> {
    pedref_core::logging::init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = FileStore::open(&data_dir);

    if pedref_core::connectivity::is_offline() {
        println!("(offline - using cached reference data)");
    }

    match cli.command {
        Commands::Dose {
            medication,
            indication,
            overrides,
        } => cmd_dose(store, &config, &medication, indication.as_deref(), overrides),
        Commands::Size {
            equipment,
            overrides,
        } => cmd_size(store, &config, &equipment, overrides),
        Commands::Vitals { vital, overrides } => cmd_vitals(store, &config, &vital, overrides),
        Commands::Weight { method, overrides } => cmd_weight(store, &config, method, overrides),
        Commands::Profile { command } => cmd_profile(store, command),
        Commands::Contacts { command } => cmd_contacts(store, command),
        Commands::Checklist { command } => cmd_checklist(store, command),
        Commands::Prefs { method } => cmd_prefs(store, method),
        Commands::Seed => cmd_seed(store),
    }
}

/// Stored profile with per-invocation overrides applied on top
fn effective_profile(store: &FileStore, overrides: &ProfileOverrides) -> PatientProfile {
    let stored = load_profile(store);
    PatientProfile {
        weight_kg: overrides.weight_kg.or(stored.weight_kg),
        age_months: overrides.age_months.or(stored.age_months),
        length_cm: overrides.length_cm.or(stored.length_cm),
    }
}

/// Method precedence: stored preference, then config
fn resolved_method(store: &FileStore, config: &Config) -> EstimationMethod {
    if store.get(Collection::Preferences, "preferences").is_some() {
        load_preferences(store).estimation_method
    } else {
        config.estimation.method
    }
}

fn cmd_dose(
    store: FileStore,
    config: &Config,
    medication: &str,
    indication: Option<&str>,
    overrides: ProfileOverrides,
) -> Result<()> {
    let method = resolved_method(&store, config);
    let profile = effective_profile(&store, &overrides);
    let engine = ResolutionEngine::with_method(store, method);

    match engine.resolve_dose(&profile, medication, indication)? {
        Resolution::Resolved(result) => {
            let label = &engine.catalog().medications[medication].label;
            println!(
                "{} - {} ({}): {}",
                label,
                result.indication,
                result.route.label(),
                result.formatted
            );
            if result.capped {
                println!("  (capped at maximum dose)");
            }
            if result.weight_estimated {
                println!("  (weight estimated: {} kg)", result.weight_kg);
            }
            if let Some(notes) = &result.notes {
                println!("  Note: {}", notes);
            }
        }
        Resolution::InsufficientPatientData => {
            println!("Add patient info (weight, age, or length) to resolve a dose.");
        }
        Resolution::NoMatchingRange => {
            println!("No dosing entry applies to this patient.");
        }
    }
    Ok(())
}

fn cmd_size(
    store: FileStore,
    config: &Config,
    equipment: &str,
    overrides: ProfileOverrides,
) -> Result<()> {
    let method = resolved_method(&store, config);
    let profile = effective_profile(&store, &overrides);
    let engine = ResolutionEngine::with_method(store, method);

    match engine.resolve_equipment_size(&profile, equipment)? {
        Resolution::Resolved(result) => {
            let label = &engine.catalog().equipment[equipment].label;
            println!("{}: {}", label, result.formatted);
            if let SizeSource::Formula(_) = result.source {
                println!("  (computed by formula)");
            }
            if result.weight_estimated {
                println!("  (matched against estimated weight)");
            }
            if let Some(notes) = &result.notes {
                println!("  Note: {}", notes);
            }
        }
        Resolution::InsufficientPatientData => {
            println!("Add patient info (weight, age, or length) to resolve a size.");
        }
        Resolution::NoMatchingRange => {
            println!("No size entry applies to this patient.");
        }
    }
    Ok(())
}

fn cmd_vitals(
    store: FileStore,
    config: &Config,
    vital: &str,
    overrides: ProfileOverrides,
) -> Result<()> {
    let method = resolved_method(&store, config);
    let profile = effective_profile(&store, &overrides);
    let engine = ResolutionEngine::with_method(store, method);

    match engine.resolve_vital_range(&profile, vital)? {
        Resolution::Resolved(result) => {
            let label = &engine.catalog().vitals[vital].label;
            println!(
                "{} ({}): {}\u{2013}{} {}",
                label, result.label, result.low, result.high, result.unit
            );
        }
        Resolution::InsufficientPatientData => {
            println!("Add the patient's age to resolve vital-sign ranges.");
        }
        Resolution::NoMatchingRange => {
            println!("No vital band applies to this patient.");
        }
    }
    Ok(())
}

fn cmd_weight(
    store: FileStore,
    config: &Config,
    method: Option<String>,
    overrides: ProfileOverrides,
) -> Result<()> {
    let method = match method {
        Some(raw) => EstimationMethod::parse_name(&raw).ok_or_else(|| {
            Error::Config(format!("unknown estimation method '{}'", raw))
        })?,
        None => resolved_method(&store, config),
    };
    let profile = effective_profile(&store, &overrides);
    let engine = ResolutionEngine::with_method(store, method);

    match engine.estimate_weight(&profile) {
        Some(weight) => println!(
            "Estimated weight: {:.1} kg ({} method)",
            weight,
            method.label()
        ),
        None => println!("Add the patient's age or length to estimate weight."),
    }
    Ok(())
}

fn cmd_profile(store: FileStore, command: ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::Show => {
            let profile = load_profile(&store);
            if profile.is_empty() {
                println!("No patient profile stored.");
            } else {
                print_measurement("Weight", profile.weight_kg, "kg");
                print_measurement("Age", profile.age_months, "months");
                print_measurement("Length", profile.length_cm, "cm");
            }
        }
        ProfileCommands::Set { values } => {
            let mut profile = load_profile(&store);
            if let Some(w) = values.weight_kg {
                profile.weight_kg = Some(w);
            }
            if let Some(a) = values.age_months {
                profile.age_months = Some(a);
            }
            if let Some(l) = values.length_cm {
                profile.length_cm = Some(l);
            }
            if save_profile(&store, &profile) {
                println!("Profile saved.");
            } else {
                println!("Could not save profile (storage unavailable).");
            }
        }
        ProfileCommands::Reset => {
            if reset_profile(&store) {
                println!("Profile cleared.");
            } else {
                println!("Could not clear profile (storage unavailable).");
            }
        }
    }
    Ok(())
}

fn print_measurement(label: &str, value: Option<f64>, unit: &str) {
    match value {
        Some(v) => println!("  {}: {} {}", label, v, unit),
        None => println!("  {}: -", label),
    }
}

fn cmd_contacts(store: FileStore, command: ContactCommands) -> Result<()> {
    match command {
        ContactCommands::Add { name, phone, role } => {
            let contact = Contact::new(name, role, phone);
            if add_contact(&store, &contact) {
                println!("Added contact {} ({})", contact.name, contact.id);
            } else {
                println!("Could not add contact (storage unavailable).");
            }
        }
        ContactCommands::List => {
            let contacts = list_contacts(&store);
            if contacts.is_empty() {
                println!("No contacts stored.");
            }
            for contact in contacts {
                let role = contact.role.as_deref().unwrap_or("-");
                println!("{}  {}  {}  [{}]", contact.id, contact.name, contact.phone, role);
            }
        }
        ContactCommands::Remove { id } => {
            if remove_contact(&store, id) {
                println!("Removed contact.");
            } else {
                println!("No such contact.");
            }
        }
    }
    Ok(())
}

fn cmd_checklist(store: FileStore, command: ChecklistCommands) -> Result<()> {
    match command {
        ChecklistCommands::Add { text } => {
            let item = ChecklistItem::new(text);
            if add_checklist_item(&store, &item) {
                println!("Added checklist item {} ({})", item.text, item.id);
            } else {
                println!("Could not add item (storage unavailable).");
            }
        }
        ChecklistCommands::List => {
            let items = list_checklist(&store);
            if items.is_empty() {
                println!("Checklist is empty.");
            }
            for item in items {
                let mark = if item.done { "x" } else { " " };
                println!("[{}] {}  {}", mark, item.id, item.text);
            }
        }
        ChecklistCommands::Done { id } => {
            if set_checklist_done(&store, id, true) {
                println!("Marked done.");
            } else {
                println!("No such checklist item.");
            }
        }
        ChecklistCommands::Remove { id } => {
            if remove_checklist_item(&store, id) {
                println!("Removed checklist item.");
            } else {
                println!("No such checklist item.");
            }
        }
    }
    Ok(())
}

fn cmd_prefs(store: FileStore, method: Option<String>) -> Result<()> {
    match method {
        Some(raw) => {
            let method = EstimationMethod::parse_name(&raw).ok_or_else(|| {
                Error::Config(format!("unknown estimation method '{}'", raw))
            })?;
            let prefs = Preferences {
                estimation_method: method,
            };
            if save_preferences(&store, &prefs) {
                println!("Estimation method set to {}.", method.label());
            } else {
                println!("Could not save preferences (storage unavailable).");
            }
        }
        None => {
            let prefs = load_preferences(&store);
            println!("Estimation method: {}", prefs.estimation_method.label());
        }
    }
    Ok(())
}

fn cmd_seed(store: FileStore) -> Result<()> {
    let catalog = build_default_catalog()?;
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid bundled catalog".into()));
    }

    for collection in [
        Collection::Medications,
        Collection::Equipment,
        Collection::VitalSigns,
    ] {
        let defaults = pedref_core::catalog::builtin_records(collection);
        if seed_if_empty(&store, collection, &defaults) {
            println!(
                "{}: {} records",
                collection.as_str(),
                store.get_all(collection).len()
            );
        } else {
            println!("{}: seeding failed (storage unavailable)", collection.as_str());
        }
    }
    Ok(())
}
