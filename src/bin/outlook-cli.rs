#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for Outlook mailboxes via Microsoft Graph

use clap::{Args as ClapArgs, Parser, Subcommand};
use outlook_client::{
    BulkReplier, CancellationToken, ComposedMessage, FailurePolicy, Folder, GraphClient,
    GraphConfig, InboxSummaryEntry, InlineImage, MailboxApi, MessageTemplate, OutgoingMail, Pacer,
    PacingPolicy, Recipient, RunReport, compose, reply_to_message,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "outlook-cli")]
#[command(about = "Read, send and auto-reply to Outlook mail via Microsoft Graph")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Mailbox to act on (user id or principal name)
    #[arg(long, env = "GRAPH_USER_ID", global = true)]
    user: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the most recent messages of a folder
    Inbox {
        /// Maximum number of messages
        #[arg(long, default_value = "25")]
        limit: usize,

        /// Folder name or id
        #[arg(long, default_value = "inbox")]
        folder: String,
    },

    /// Show sender and subject of a message
    Show {
        /// Message id
        id: String,
    },

    /// Send a new message
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        #[arg(long)]
        subject: String,

        /// Address replies should go to
        #[arg(long)]
        reply_to: Option<String>,

        /// Display name for --reply-to
        #[arg(long, requires = "reply_to")]
        reply_to_name: Option<String>,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Reply to a single message
    Reply {
        /// Message id
        id: String,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Reply to the N most recent inbox messages with paced sends
    Warmup {
        /// Number of inbox messages to reply to
        #[arg(long)]
        count: usize,

        #[command(flatten)]
        content: ContentArgs,

        #[command(flatten)]
        pacing: PacingArgs,
    },

    /// Reply to the given messages, in order, with paced sends
    ReplyMany {
        /// Message ids
        #[arg(required = true)]
        ids: Vec<String>,

        #[command(flatten)]
        content: ContentArgs,

        #[command(flatten)]
        pacing: PacingArgs,
    },
}

#[derive(ClapArgs)]
struct ContentArgs {
    /// HTML fragment for the message body
    #[arg(long)]
    body_file: PathBuf,

    /// HTML signature appended after the body
    #[arg(long)]
    signature_file: Option<PathBuf>,

    /// Inline image as PATH:CONTENT_ID (repeatable)
    #[arg(long = "image")]
    images: Vec<InlineImage>,
}

#[derive(ClapArgs)]
struct PacingArgs {
    /// Average delay between replies, in seconds
    #[arg(long, default_value = "60")]
    avg_delay: f64,

    /// Seed for reproducible delays
    #[arg(long)]
    seed: Option<u64>,

    /// Keep going when a reply fails
    #[arg(long)]
    continue_on_error: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let user = args
        .user
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--user or GRAPH_USER_ID is required"))?;
    let config = GraphConfig::from_env()?;
    let client = GraphClient::new(&config)?;

    match &args.command {
        Command::Inbox { limit, folder } => {
            cmd_inbox(&client, &args, &user, folder, *limit).await?;
        }
        Command::Show { id } => {
            cmd_show(&client, &args, &user, id).await?;
        }
        Command::Send {
            to,
            subject,
            reply_to,
            reply_to_name,
            content,
        } => {
            let mut mail = OutgoingMail::new(Recipient::new(to), subject, load(content).await?);
            if let Some(address) = reply_to {
                let mut recipient = Recipient::new(address);
                recipient.name.clone_from(reply_to_name);
                mail = mail.reply_to(recipient);
            }
            client.send_new_mail(&user, &mail).await?;
            println!("Sent to {to}");
        }
        Command::Reply { id, content } => {
            let reply_id = reply_to_message(&client, &user, id, &load(content).await?).await?;
            println!("Replied to {id} ({reply_id})");
        }
        Command::Warmup {
            count,
            content,
            pacing,
        } => {
            let message = load(content).await?;
            let mut replier = replier(&client, pacing)?;
            let report = replier.reply_to_inbox(&user, *count, &message).await?;
            print_report(&args, &report)?;
        }
        Command::ReplyMany {
            ids,
            content,
            pacing,
        } => {
            let message = load(content).await?;
            let mut replier = replier(&client, pacing)?;
            let report = replier.reply_to_messages(&user, ids, &message).await?;
            print_report(&args, &report)?;
        }
    }

    Ok(())
}

async fn cmd_inbox(
    client: &GraphClient,
    args: &Args,
    user: &str,
    folder: &str,
    limit: usize,
) -> anyhow::Result<()> {
    let entries = client
        .list_messages(user, &Folder::from(folder), limit)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_inbox_table(&entries);
    }

    Ok(())
}

async fn cmd_show(
    client: &GraphClient,
    args: &Args,
    user: &str,
    id: &str,
) -> anyhow::Result<()> {
    let context = client.fetch_message(user, id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&context)?);
    } else {
        println!("ID:      {id}");
        println!("From:    {}", context.sender());
        println!("Subject: {}", context.subject_line());
    }

    Ok(())
}

async fn load(content: &ContentArgs) -> anyhow::Result<ComposedMessage> {
    let body = tokio::fs::read_to_string(&content.body_file).await?;
    let mut template = MessageTemplate::new(body);
    if let Some(path) = &content.signature_file {
        template = template.with_signature(tokio::fs::read_to_string(path).await?);
    }
    Ok(compose(&template, &content.images).await?)
}

fn replier<'a>(
    client: &'a GraphClient,
    pacing: &PacingArgs,
) -> anyhow::Result<BulkReplier<'a, GraphClient>> {
    let policy = PacingPolicy::with_average(pacing.avg_delay);
    let pacer = match pacing.seed {
        Some(seed) => Pacer::seeded(policy, seed)?,
        None => Pacer::new(policy)?,
    };
    let on_failure = if pacing.continue_on_error {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    Ok(BulkReplier::new(client, pacer)
        .with_failure_policy(on_failure)
        .with_cancellation(cancel))
}

fn print_report(args: &Args, report: &RunReport) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "\n{} of {} replies sent, {} failed",
        report.sent.len(),
        report.total,
        report.failed.len()
    );
    for failed in &report.failed {
        println!("  FAILED {}: {}", failed.message_id, failed.error);
    }

    Ok(())
}

fn print_inbox_table(entries: &[InboxSummaryEntry]) {
    if entries.is_empty() {
        println!("No messages found.");
        return;
    }

    let header = format!("{:<6} {:<30} {:<40} {}", "Read", "From", "Subject", "ID");
    println!("{header}");
    println!("{}", "-".repeat(100));

    for entry in entries {
        println!(
            "{:<6} {:<30} {:<40} {}",
            if entry.is_read { "yes" } else { "no" },
            truncate(entry.from.as_deref().unwrap_or("-"), 28),
            truncate(entry.subject.as_deref().unwrap_or("(no subject)"), 38),
            entry.id,
        );
    }

    println!("\n{} message(s)", entries.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
