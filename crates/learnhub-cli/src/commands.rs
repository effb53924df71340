use std::io::{self, Write};

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use learnhub_core::events::drain;
use learnhub_core::models::Course;
use learnhub_core::utils::{format_date, truncate_string};
use learnhub_core::{App, NoticeLevel, RegisterRequest, SessionEvent};

use crate::Command;

/// Width of the description column in course listings
const DESCRIPTION_WIDTH: usize = 60;

pub async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => login(app, username).await,
        Command::Register { username, email } => register(app, &username, &email).await,
        Command::Logout => {
            app.logout().await;
            Ok(())
        }
        Command::Whoami => {
            match app.current_session() {
                Some(session) => {
                    println!("{}", session.identity.username);
                    if let Some(ref email) = session.identity.email {
                        println!("{}", email);
                    }
                    if let Some(minutes) = app
                        .config
                        .token_ttl()
                        .and_then(|ttl| session.minutes_until_expiry(ttl))
                    {
                        println!("Session expires in {} minutes", minutes);
                    }
                }
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Profile => {
            app.store.require_session()?;
            let profile = app.client.profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Command::Courses { search } => {
            let courses = match search {
                Some(ref query) => app.client.search_courses(query).await?,
                None => app.client.list_courses().await?,
            };
            print_courses(&courses);
            Ok(())
        }
        Command::Course { slug } => {
            let course = app.client.get_course(&slug).await?;
            println!("{}", course.title);
            println!("{}", course.date_range_display());
            println!();
            println!("{}", course.description);
            Ok(())
        }
        Command::Enroll { slug } => {
            app.store.require_session()?;
            let message = app.client.enroll(&slug).await?;
            println!("{}", message);
            Ok(())
        }
        Command::Lessons { course } => {
            for lesson in app.client.list_lessons(&course).await? {
                let slug = lesson.slug.clone().unwrap_or_default();
                println!("{:<30} {}", lesson.title, slug);
            }
            Ok(())
        }
        Command::Assessments { course, lesson } => {
            for assessment in app.client.list_assessments(&course, &lesson).await? {
                println!(
                    "{} ({} questions)",
                    assessment.title,
                    assessment.questions.len()
                );
            }
            Ok(())
        }
        Command::Messages { course } => {
            app.store.require_session()?;
            for message in app.client.list_messages(&course).await? {
                let when = message
                    .timestamp
                    .map(|t| format_date(&t.to_rfc3339()))
                    .unwrap_or_default();
                println!("[{}] {}", when, message.content);
            }
            Ok(())
        }
        Command::Send {
            course,
            receiver,
            content,
        } => {
            app.store.require_session()?;
            app.client.send_message(&course, &receiver, &content).await?;
            println!("Message sent");
            Ok(())
        }
        Command::Dashboard => {
            let session = app.store.require_session()?;
            let dashboard = app.client.fetch_dashboard().await?;
            println!("Welcome back, {}!", session.identity.display_name());
            println!();
            println!("Enrolled courses:  {}", dashboard.stats.enrolled_courses);
            println!("Completed courses: {}", dashboard.stats.completed_courses);
            println!("Learning hours:    {}", dashboard.stats.total_hours);
            println!("Certificates:      {}", dashboard.stats.certificates);
            if !dashboard.recent_courses.is_empty() {
                println!();
                println!("Recent courses:");
                print_courses(&dashboard.recent_courses);
            }
            Ok(())
        }
    }
}

async fn login(app: &App, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| app.config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")?;

    app.login(&username, &password).await?;
    remember_username(app, &username);
    Ok(())
}

async fn register(app: &App, username: &str, email: &str) -> Result<()> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Confirm password: ")
        .context("Failed to read password")?;

    let mut request = RegisterRequest::new(username, email, password);
    request.confirm_password = confirm;

    let session = app.register(&request).await?;
    remember_username(app, session.username());
    Ok(())
}

fn remember_username(app: &App, username: &str) {
    let mut config = app.config.clone();
    config.last_username = Some(username.to_string());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn print_courses(courses: &[Course]) {
    if courses.is_empty() {
        println!("No courses found");
        return;
    }
    for course in courses {
        println!(
            "{:<28} {:<30} {}",
            course.slug(),
            truncate_string(&course.title, 30),
            truncate_string(&course.description, DESCRIPTION_WIDTH)
        );
    }
}

/// Render queued notifications. Returns whether any error was shown.
pub fn print_events(rx: &mut UnboundedReceiver<SessionEvent>) -> bool {
    let mut shown_error = false;
    for event in drain(rx) {
        match event {
            SessionEvent::Notice(notice) => match notice.level {
                NoticeLevel::Success => eprintln!("✓ {}", notice.message),
                NoticeLevel::Error => {
                    shown_error = true;
                    eprintln!("✗ {}", notice.message);
                }
            },
            SessionEvent::LoginRequired => {
                shown_error = true;
                eprintln!("→ Run `learnhub login` to sign in.");
            }
        }
    }
    shown_error
}
