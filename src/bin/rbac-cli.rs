use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rbac_router::config::load_config;
use rbac_router::{RoleRegistry, RoleSpec};

#[derive(Parser)]
#[command(name = "rbac-cli")]
#[command(about = "Inspect the role table of an rbac-router configuration", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "rbac-router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List roles and the roles referencing them
    Roles,
    /// Print the compiled permission set of a role
    Resolve { role: String },
    /// Check whether any of the given roles grants a permission
    Check {
        permission: String,
        /// Comma or space separated role names
        roles: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let mut registry = RoleRegistry::new();
    registry.setup(config.roles, true)?;

    match cli.command {
        Commands::Roles => {
            for name in registry.role_names() {
                let dependents = registry.dependents_of(&name);
                if dependents.is_empty() {
                    println!("{}", name);
                } else {
                    println!("{} (used by {})", name, dependents.join(", "));
                }
            }
        }
        Commands::Resolve { role } => {
            let mut permissions: Vec<&String> = registry.resolve(&role)?.iter().collect();
            permissions.sort();
            for permission in permissions {
                println!("{}", permission);
            }
        }
        Commands::Check { permission, roles } => {
            let granted = registry.matches(&permission, &RoleSpec::from(roles))?;
            println!("{}", if granted { "granted" } else { "denied" });
            if !granted {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
