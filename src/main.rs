mod cli;

use chrono::{Datelike, Local};
use std::pin::Pin;
use clap::Parser;
use mimalloc::MiMalloc;
use schedule_client::{
    ClientError, ScheduleClient, SessionEvent,
    assistant::AssistantReply,
    config::{CONFIG, Config},
    schema::{Schedule, ScheduleCreate},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
    sync::broadcast,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, SessionCommand};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let cfg = match &args.config {
        Some(path) => Config::figment_from(path).extract::<Config>()?,
        None => CONFIG.clone(),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        base_url = %cfg.backend.base_url,
        loglevel = %cfg.basic.loglevel,
        account = ?cfg.account,
    );

    let client = ScheduleClient::new(&cfg.backend)?;
    let email = args.email.clone().or_else(|| cfg.account.email.clone());
    let password = args.password.clone().or_else(|| cfg.account.password.clone());
    let (Some(email), Some(password)) = (email, password) else {
        return Err("email and password are required (flags or [account] in config.toml)".into());
    };

    let command = match args.command {
        Command::Register => {
            let user = client.auth().register(&email, &password).await?;
            println!("registered {} (id {})", user.email, user.id);
            return Ok(());
        }
        Command::Session(command) => command,
    };

    client.auth().login(&email, &password).await?;

    let outcome = match command {
        SessionCommand::Me => show_me(&client).await,
        SessionCommand::List { year, month } => {
            let today = Local::now().date_naive();
            list_month(
                &client,
                year.unwrap_or(today.year()),
                month.unwrap_or(today.month()),
            )
            .await
        }
        SessionCommand::Create {
            title,
            date,
            start,
            end,
            content,
        } => {
            let schedule = ScheduleCreate {
                title,
                date,
                start_time: start,
                end_time: end,
                content,
            };
            create_schedule(&client, schedule).await
        }
        SessionCommand::Delete { id } => delete_schedule(&client, id).await,
        SessionCommand::Chat => chat(&client).await,
    };

    if let Err(e) = client.auth().logout().await {
        warn!(error = %e, "logout failed");
    }
    outcome.map_err(Into::into)
}

async fn show_me(client: &ScheduleClient) -> Result<(), ClientError> {
    let user = client.auth().me().await?;
    println!("{} <{}> (id {})", user.display_name(), user.email, user.id);
    Ok(())
}

async fn list_month(client: &ScheduleClient, year: i32, month: u32) -> Result<(), ClientError> {
    let store = client.store();
    store.fetch(year, month).await;
    if let Some(message) = store.last_error() {
        return Err(ClientError::UnexpectedError(message));
    }

    let mut schedules = store.schedules();
    schedules.sort_by_key(|s| (s.date, s.start_time, s.id));
    if schedules.is_empty() {
        println!("no schedules in {year}-{month:02}");
    }
    for schedule in &schedules {
        println!("{}", describe(schedule));
    }
    Ok(())
}

async fn create_schedule(
    client: &ScheduleClient,
    schedule: ScheduleCreate,
) -> Result<(), ClientError> {
    let created = client.store().add(schedule).await?;
    println!("created {}", describe(&created));
    Ok(())
}

async fn delete_schedule(client: &ScheduleClient, id: i64) -> Result<(), ClientError> {
    client.store().remove(id).await?;
    println!("deleted schedule {id}");
    Ok(())
}

fn describe(schedule: &Schedule) -> String {
    let mut line = format!(
        "#{} {} {}-{} {}",
        schedule.id,
        schedule.date,
        schedule.start_time.format("%H:%M"),
        schedule.end_time.format("%H:%M"),
        schedule.title
    );
    if let Some(content) = schedule.content.as_deref().filter(|c| !c.is_empty()) {
        line.push_str(&format!(" ({content})"));
    }
    line
}

async fn chat(client: &ScheduleClient) -> Result<(), ClientError> {
    let assistant = client.assistant();
    let mut events = client.gateway().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    println!("Tell me what to schedule. Empty line or Ctrl+C to quit.");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(SessionEvent::Expired) => {
                    return Err(ClientError::UnexpectedError(
                        "session expired, log in again".to_string(),
                    ));
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| ClientError::UnexpectedError(e.to_string()))? else {
                    break;
                };
                if line.trim().is_empty() {
                    break;
                }
                let Some(reply) = unless_shutdown(shutdown.as_mut(), assistant.submit(&line)).await
                else {
                    break;
                };
                match reply {
                    Ok(AssistantReply::Scheduled(parsed)) => println!(
                        "scheduled \"{}\" on {} {}-{}",
                        parsed.title,
                        parsed.date,
                        parsed.start_time.format("%H:%M"),
                        parsed.end_time.format("%H:%M")
                    ),
                    Ok(AssistantReply::Question(question)) => println!("{question}"),
                    Ok(AssistantReply::NotUnderstood) => {
                        println!("Sorry, I could not understand that.")
                    }
                    Err(e) if e.is_session_lost() => return Err(e),
                    Err(e) => println!("error: {e}"),
                }
            }
        }
    }
    Ok(())
}

/// Runs `work` to completion unless `shutdown` fires first.
async fn unless_shutdown<S, F>(shutdown: Pin<&mut S>, work: F) -> Option<F::Output>
where
    S: Future<Output = ()>,
    F: Future,
{
    tokio::select! {
        () = shutdown => None,
        out = work => Some(out),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::{pending, ready};

    #[tokio::test]
    async fn shutdown_cuts_off_pending_work() {
        let shutdown = ready(());
        tokio::pin!(shutdown);

        let out = unless_shutdown(shutdown.as_mut(), pending::<u32>()).await;

        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn finished_work_is_returned() {
        let shutdown = pending::<()>();
        tokio::pin!(shutdown);

        let out = unless_shutdown(shutdown.as_mut(), ready(7)).await;

        assert_eq!(out, Some(7));
    }
}
