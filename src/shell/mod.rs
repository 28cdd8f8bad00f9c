//! Interactive menu shell
//!
//! Presents the main menu, prompts for the parameters of each action and
//! renders results. Errors from an action are shown and the menu continues.

mod commands;
mod display;
mod menu;

pub use commands::{generate_reports, show_history, show_statistics, DEFAULT_HISTORY_LIMIT};
pub use display::{format_history_table, format_item, print_outcome, print_result};
pub use menu::MenuChoice;

use crate::config::{apply_env_overrides, validate, DatabaseBackend};
use crate::extract::ExtractionMode;
use crate::output::{default_json_filename, DEFAULT_SITEMAP_FILE};
use crate::pipeline::{Coordinator, ExtractionRequest};
use crate::ScraperError;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;

/// Interactive session state
pub struct Shell {
    coordinator: Coordinator,
    theme: ColorfulTheme,
}

impl Shell {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            theme: ColorfulTheme::default(),
        }
    }

    /// Runs the menu loop until the user quits
    ///
    /// Only a failure of the menu prompt itself ends the loop with an error.
    pub async fn run(&mut self) -> Result<(), ScraperError> {
        println!();
        println!("{}", style("Web Scraper").bold());
        self.print_database_status();

        let labels: Vec<String> = MenuChoice::ALL.iter().map(|c| c.display()).collect();

        loop {
            println!();
            let index = Select::with_theme(&self.theme)
                .with_prompt("Choose an option")
                .items(&labels)
                .default(0)
                .interact()?;

            let choice = MenuChoice::ALL[index];
            if choice == MenuChoice::Quit {
                println!("{}", style("Goodbye!").cyan());
                return Ok(());
            }

            if choice.requires_database() && self.coordinator.storage().is_none() {
                println!(
                    "{}",
                    style(format!(
                        "Database not available. Configure it with option {} first.",
                        MenuChoice::ConfigureDatabase.key()
                    ))
                    .yellow()
                );
                continue;
            }

            if let Err(e) = self.dispatch(choice).await {
                println!("{}", style(format!("✗ {}", e)).red());
            }
        }
    }

    async fn dispatch(&mut self, choice: MenuChoice) -> Result<(), ScraperError> {
        tracing::debug!("Menu choice: {}", choice.label());

        match choice {
            MenuChoice::Extract(mode) => self.extract(mode).await,
            MenuChoice::History => show_history(&self.coordinator, DEFAULT_HISTORY_LIMIT).await,
            MenuChoice::Statistics => show_statistics(&self.coordinator).await,
            MenuChoice::ConfigureDatabase => self.configure_database().await,
            MenuChoice::Reports => self.reports().await,
            MenuChoice::Quit => Ok(()),
        }
    }

    fn print_database_status(&self) {
        match self.coordinator.storage() {
            Some(storage) => println!(
                "{}",
                style(format!("Database: {}", storage.backend_name())).cyan()
            ),
            None => println!(
                "{}",
                style("Database not available; results can only be exported to files.").yellow()
            ),
        }
    }

    async fn extract(&mut self, mode: ExtractionMode) -> Result<(), ScraperError> {
        let url: String = Input::with_theme(&self.theme)
            .with_prompt("Enter URL")
            .interact_text()?;

        let mut request = ExtractionRequest::new(&url, mode);

        if mode == ExtractionMode::Selector {
            let selector: String = Input::with_theme(&self.theme)
                .with_prompt("Enter CSS selector")
                .interact_text()?;
            let attribute: String = Input::with_theme(&self.theme)
                .with_prompt("Attribute to extract (blank for text)")
                .allow_empty(true)
                .interact_text()?;

            request = request.selector(&selector);
            if !attribute.trim().is_empty() {
                request = request.attribute(attribute.trim());
            }
        }

        if self.coordinator.storage().is_some() {
            let save = Confirm::with_theme(&self.theme)
                .with_prompt("Save results to database?")
                .default(true)
                .interact()?;
            request = request.save_to_db(save);
        }

        let export = Confirm::with_theme(&self.theme)
            .with_prompt("Export results to JSON?")
            .default(false)
            .interact()?;
        if export {
            let filename: String = Input::with_theme(&self.theme)
                .with_prompt("JSON filename")
                .default(default_json_filename(mode, &request.url))
                .interact_text()?;
            request = request.export_json(filename);
        }

        if mode == ExtractionMode::Sitemap {
            let filename: String = Input::with_theme(&self.theme)
                .with_prompt("Sitemap filename")
                .default(DEFAULT_SITEMAP_FILE.to_string())
                .interact_text()?;
            request = request.sitemap_file(filename);
        }

        let outcome = self.coordinator.run(&request).await;
        print_outcome(&outcome);
        Ok(())
    }

    async fn configure_database(&mut self) -> Result<(), ScraperError> {
        let options = [
            "Use SQLite (local file)",
            "Use PostgreSQL (settings from environment)",
            "Use MySQL (settings from environment)",
            "Test current connection",
            "Back",
        ];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Database settings")
            .items(&options)
            .default(0)
            .interact()?;

        let mut config = self.coordinator.config().clone();

        match selection {
            0 => {
                let path: String = Input::with_theme(&self.theme)
                    .with_prompt("Database file")
                    .default(config.database.sqlite_path.display().to_string())
                    .interact_text()?;
                config.database.backend = DatabaseBackend::Sqlite;
                config.database.sqlite_path = PathBuf::from(path.trim());
            }
            1 => {
                apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
                config.database.backend = DatabaseBackend::Postgres;
            }
            2 => {
                apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
                config.database.backend = DatabaseBackend::Mysql;
            }
            3 => {
                return match self.coordinator.storage() {
                    Some(storage) => {
                        storage.ping().await?;
                        println!(
                            "{}",
                            style(format!("✓ {} connection OK", storage.backend_name())).green()
                        );
                        Ok(())
                    }
                    None => {
                        println!("{}", style("No database is configured.").yellow());
                        Ok(())
                    }
                };
            }
            _ => return Ok(()),
        }

        validate(&config)?;
        self.coordinator.reconfigure_database(config.database).await?;
        println!("{}", style("✓ Database configuration updated").green());
        self.print_database_status();
        Ok(())
    }

    async fn reports(&mut self) -> Result<(), ScraperError> {
        let days: String = Input::with_theme(&self.theme)
            .with_prompt("Only include the last N days (blank for all)")
            .allow_empty(true)
            .validate_with(|input: &String| -> Result<(), String> {
                if input.trim().is_empty() || input.trim().parse::<u32>().is_ok() {
                    Ok(())
                } else {
                    Err("enter a whole number of days".to_string())
                }
            })
            .interact_text()?;

        let days = days.trim().parse::<u32>().ok();
        generate_reports(&self.coordinator, days).await
    }
}
