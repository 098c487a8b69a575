mod bookmarks;
mod db;
mod derive;
mod models;
mod normalize;
mod search;
mod share;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;

use bookmarks::{toggle_bookmark, BookmarkAction, Session};
use db::Database;
use derive::{days_until, earliest_deadline, is_recent, lowest_cost, urgency_color};
use models::{Internship, ReportStatus, UserPreferences};
use normalize::format_duration;
use search::{listing_search_url, SearchBox};

#[derive(Parser)]
#[command(name = "internyl")]
#[command(about = "Internship discovery - browse, save, and track listings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Sign in as a user
    Login {
        /// User identifier
        user: String,
    },

    /// Sign out
    Logout,

    /// Show the current signed-in user
    Whoami,

    /// Import internship documents from a JSON file (object or array)
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// List internships
    List {
        /// Filter by a title substring
        #[arg(short, long)]
        search: Option<String>,

        /// Only show saved internships (requires login)
        #[arg(long)]
        saved: bool,

        /// Only show listings added in the last 7 days
        #[arg(long)]
        new: bool,
    },

    /// Show internship details
    Show {
        /// Internship ID
        id: String,
    },

    /// Toggle an internship in your saved set (requires login)
    Save {
        /// Internship ID
        id: String,
    },

    /// Copy an internship's share link to the clipboard
    Share {
        /// Internship ID
        id: String,
    },

    /// Build the listing-page URL for a search query
    Search {
        /// Search query
        query: Option<String>,
    },

    /// Manage issue reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Manage your preferences (requires login)
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Track eligibility checklist answers (requires login)
    Eligibility {
        #[command(subcommand)]
        command: EligibilityCommands,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// File a report against a listing
    Add {
        /// Internship ID
        internship_id: String,

        /// What is wrong with the listing
        reason: String,
    },

    /// List reports
    List {
        /// Filter by status (pending, resolved, rejected)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Mark a pending report resolved (requires login)
    Resolve {
        /// Report ID
        id: i64,

        /// Resolution notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Mark a pending report rejected (requires login)
    Reject {
        /// Report ID
        id: i64,

        /// Rejection notes
        #[arg(short, long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show your preference document
    Show,

    /// Import a preference document from a JSON file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum EligibilityCommands {
    /// Show recorded answers for an internship
    Show {
        /// Internship ID
        internship_id: String,
    },

    /// Record an answer for one checklist item
    Set {
        /// Internship ID
        internship_id: String,

        /// Checklist item ID
        item_id: String,

        /// Whether the requirement is satisfied (true/false)
        satisfied: bool,
    },
}

fn require_session(db: &Database) -> Result<Session> {
    db.current_session()?
        .ok_or_else(|| anyhow!("Not authenticated. Run 'internyl login <user>' first."))
}

fn require_internship(db: &Database, id: &str) -> Result<Internship> {
    db.get_internship(id)?
        .ok_or_else(|| anyhow!("Internship '{}' not found", id))
}

fn format_cost(cost: f64) -> String {
    if cost == 0.0 {
        "Free".to_string()
    } else if cost.fract() == 0.0 {
        format!("${}", cost as i64)
    } else {
        format!("${:.2}", cost)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let db = Database::open()?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Login { user } => {
            db.ensure_initialized()?;
            db.set_session(&user)?;
            println!("Signed in as '{}'", user);
        }

        Commands::Logout => {
            db.ensure_initialized()?;
            db.clear_session()?;
            println!("Signed out.");
        }

        Commands::Whoami => {
            db.ensure_initialized()?;
            match db.current_session()? {
                Some(session) => println!("{}", session.user_id),
                None => println!("Not signed in."),
            }
        }

        Commands::Import { file } => {
            db.ensure_initialized()?;
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let docs: Vec<Internship> = if content.trim_start().starts_with('[') {
                serde_json::from_str(&content).context("Failed to parse internship documents")?
            } else {
                vec![serde_json::from_str(&content).context("Failed to parse internship document")?]
            };
            for internship in &docs {
                db.upsert_internship(internship)?;
            }
            println!("Imported {} internship(s)", docs.len());
        }

        Commands::List { search, saved, new } => {
            db.ensure_initialized()?;
            let session = if saved {
                Some(require_session(&db)?)
            } else {
                db.current_session()?
            };
            let saved_set = match &session {
                Some(s) => db.saved_ids(&s.user_id)?,
                None => HashSet::new(),
            };

            let now = Utc::now();
            let today = now.date_naive();

            let mut internships = db.list_internships(search.as_deref())?;
            if saved {
                internships.retain(|i| saved_set.contains(&i.id));
            }
            if new {
                internships.retain(|i| is_recent(i.date_added.as_ref(), now));
            }

            if internships.is_empty() {
                println!("No internships found.");
            } else {
                println!(
                    "{:<12} {:<30} {:<14} {:>8} {:<12} {:<12} {:<6}",
                    "ID", "TITLE", "DURATION", "COST", "DEADLINE", "STATUS", "FLAGS"
                );
                println!("{}", "-".repeat(100));
                for internship in &internships {
                    let deadline = earliest_deadline(&internship.deadlines);
                    let days = deadline.map(|d| days_until(d, today));
                    let color = urgency_color(days);

                    let mut flags = String::new();
                    if saved_set.contains(&internship.id) {
                        flags.push('*');
                    }
                    if is_recent(internship.date_added.as_ref(), now) {
                        flags.push_str(" NEW");
                    }

                    println!(
                        "{:<12} {:<30} {:<14} {:>8} {:<12} {:<12} {:<6}",
                        truncate(&internship.id, 10),
                        truncate(&internship.title, 28),
                        truncate(&format_duration(internship.duration_weeks.as_ref()), 12),
                        format_cost(lowest_cost(internship.cost.as_ref())),
                        deadline.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                        color.label(),
                        flags.trim()
                    );
                }
            }
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            match db.get_internship(&id)? {
                Some(internship) => {
                    let now = Utc::now();
                    let today = now.date_naive();

                    println!("Internship '{}'", internship.id);
                    println!("Title: {}", internship.title);
                    if let Some(org) = &internship.organization {
                        println!("Organization: {}", org);
                    }
                    println!("Duration: {}", format_duration(internship.duration_weeks.as_ref()));
                    println!("Cost: {}", format_cost(lowest_cost(internship.cost.as_ref())));

                    if internship.deadlines.is_empty() {
                        println!("Deadlines: none listed");
                    } else {
                        println!("Deadlines:");
                        for d in &internship.deadlines {
                            println!(
                                "  {} - {}",
                                d.name.as_deref().unwrap_or("(unnamed)"),
                                d.date.as_deref().unwrap_or("not provided")
                            );
                        }
                    }

                    let deadline = earliest_deadline(&internship.deadlines);
                    let days = deadline.map(|d| days_until(d, today));
                    let color = urgency_color(days);
                    match (deadline, days) {
                        (Some(d), Some(left)) => {
                            println!("Next deadline: {} ({} days left, {})", d, left, color.label())
                        }
                        _ => println!("Next deadline: {}", color.label()),
                    }

                    if is_recent(internship.date_added.as_ref(), now) {
                        println!("Recently added: yes");
                    }

                    if let Some(session) = db.current_session()? {
                        let saved = db.is_saved(&session.user_id, &internship.id)?;
                        println!("Saved: {}", if saved { "yes" } else { "no" });

                        let answers = db.get_eligibility(&session.user_id, &internship.id)?;
                        if !answers.is_empty() {
                            println!("Eligibility:");
                            let mut items: Vec<_> = answers.iter().collect();
                            items.sort();
                            for (item, satisfied) in items {
                                println!("  {} - {}", item, if *satisfied { "yes" } else { "no" });
                            }
                        }
                    }

                    let anchor = internship.link.as_deref().unwrap_or(&internship.id);
                    println!("Link: {}", share::compose_share_link(anchor));
                }
                None => {
                    println!("Internship '{}' not found.", id);
                }
            }
        }

        Commands::Save { id } => {
            db.ensure_initialized()?;
            require_internship(&db, &id)?;

            let session = db.current_session()?;
            let currently_saved = match &session {
                Some(s) => db.is_saved(&s.user_id, &id)?,
                None => false,
            };

            match toggle_bookmark(&db, session.as_ref(), &id, currently_saved)? {
                BookmarkAction::Added => println!("Saved '{}'", id),
                BookmarkAction::Removed => println!("Removed '{}' from saved", id),
            }
        }

        Commands::Share { id } => {
            db.ensure_initialized()?;
            let internship = require_internship(&db, &id)?;
            let anchor = internship.link.as_deref().unwrap_or(&internship.id);
            let link = share::compose_share_link(anchor);
            share::copy_share_link(anchor);
            println!("Copied to clipboard: {}", link);
        }

        Commands::Search { query } => {
            let search_box = SearchBox::new(query.as_deref());
            match search_box.submit() {
                Some(url) => println!("Navigating to {}", url),
                None => {
                    // Submit does not navigate while the field has content;
                    // print the filtered listing link directly instead.
                    println!("{}", listing_search_url(search_box.query()));
                }
            }
        }

        Commands::Report { command } => {
            db.ensure_initialized()?;
            match command {
                ReportCommands::Add { internship_id, reason } => {
                    require_internship(&db, &internship_id)?;
                    let session = db.current_session()?;
                    let user = session.as_ref().map(|s| s.user_id.as_str());
                    let report_id = db.create_report(&internship_id, user, &reason)?;
                    println!("Filed report #{}", report_id);
                }

                ReportCommands::List { status } => {
                    let status = match status.as_deref() {
                        Some(s) => Some(ReportStatus::parse(s).ok_or_else(|| {
                            anyhow!("Unknown status '{}'. Expected pending, resolved, or rejected.", s)
                        })?),
                        None => None,
                    };
                    let reports = db.list_reports(status)?;
                    if reports.is_empty() {
                        println!("No reports found.");
                    } else {
                        println!(
                            "{:<6} {:<10} {:<12} {:<30} {:<20}",
                            "ID", "STATUS", "INTERNSHIP", "REASON", "FILED"
                        );
                        println!("{}", "-".repeat(82));
                        for report in reports {
                            println!(
                                "{:<6} {:<10} {:<12} {:<30} {:<20}",
                                report.id,
                                report.status.as_str(),
                                truncate(&report.internship_id, 10),
                                truncate(&report.reason, 28),
                                truncate(&report.created_at, 18)
                            );
                        }
                    }
                }

                ReportCommands::Resolve { id, notes } => {
                    let session = require_session(&db)?;
                    db.resolve_report(id, &session.user_id, notes.as_deref())?;
                    println!("Report #{} resolved.", id);
                }

                ReportCommands::Reject { id, notes } => {
                    let session = require_session(&db)?;
                    db.reject_report(id, &session.user_id, notes.as_deref())?;
                    println!("Report #{} rejected.", id);
                }
            }
        }

        Commands::Prefs { command } => {
            db.ensure_initialized()?;
            let session = require_session(&db)?;
            match command {
                PrefsCommands::Show => match db.get_preferences(&session.user_id)? {
                    Some(prefs) => {
                        println!("{}", serde_json::to_string_pretty(&prefs)?);
                    }
                    None => println!("No preferences set."),
                },

                PrefsCommands::Import { file } => {
                    let content = std::fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    let prefs: UserPreferences = serde_json::from_str(&content)
                        .context("Failed to parse preference document")?;
                    db.set_preferences(&session.user_id, &prefs)?;
                    println!("Preferences saved.");
                }
            }
        }

        Commands::Eligibility { command } => {
            db.ensure_initialized()?;
            let session = require_session(&db)?;
            match command {
                EligibilityCommands::Show { internship_id } => {
                    let answers = db.get_eligibility(&session.user_id, &internship_id)?;
                    if answers.is_empty() {
                        println!("No answers recorded for '{}'.", internship_id);
                    } else {
                        let mut items: Vec<_> = answers.iter().collect();
                        items.sort();
                        for (item, satisfied) in items {
                            println!("{} - {}", item, if *satisfied { "yes" } else { "no" });
                        }
                    }
                }

                EligibilityCommands::Set { internship_id, item_id, satisfied } => {
                    require_internship(&db, &internship_id)?;
                    db.set_eligibility(&session.user_id, &internship_id, &item_id, satisfied)?;
                    println!(
                        "Recorded {} = {} for '{}'",
                        item_id,
                        if satisfied { "yes" } else { "no" },
                        internship_id
                    );
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    // Cut on char boundaries; titles are not always ASCII.
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
