//! Create or promote an admin account.

use super::{load_config, open_database};
use crate::server::routes::account::validate_registration;
use anyhow::{Context, Result};
use colored::Colorize;
use scholar_core::{NewUser, Role};
use std::path::Path;

pub fn run(config_path: Option<&Path>, email: &str, password: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let db = open_database(&config)?;
    let email = email.trim().to_lowercase();

    if let Some(user) = db.find_user_by_email(&email)? {
        if user.role.is_admin() {
            println!("{} {} is already an admin.", "Note:".yellow().bold(), email);
            return Ok(());
        }
        db.set_role(user.id, Role::Admin)?;
        println!("{} Promoted {} to admin", "✓".green(), email.cyan());
        return Ok(());
    }

    let password = password.context("A new account needs --password")?;
    validate_registration(&email, &password, config.auth.min_password_length)?;

    let hash = bcrypt::hash(&password, config.auth.bcrypt_cost).context("Failed to hash password")?;
    let user = db
        .create_user(&NewUser::student(&email, hash).with_role(Role::Admin))
        .context("Failed to create admin")?;

    println!(
        "{} Created admin {} (id {})",
        "✓".green(),
        email.cyan(),
        user.id
    );
    Ok(())
}
