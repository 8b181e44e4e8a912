use anyhow::Context;
use classbase::logging::init_tracing;
use classbase::state::{AppState, init_app_state};
use classbase_cli::{create_admin, revoke_sessions, set_role, show_user};
use classbase_config::{FirebaseConfig, LogConfig};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "classbase-cli")]
#[command(about = "Classbase CLI - Administrative tools for Classbase", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an identity and user document with the admin role
    CreateAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Class the admin belongs to
        #[arg(short = 'c', long)]
        class_id: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Set a user's role on both the document and the token claims
    SetRole {
        /// User id
        #[arg(short = 'u', long)]
        uid: Option<String>,

        /// New role, e.g. admin or teacher
        #[arg(short = 'r', long)]
        role: Option<String>,

        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Revoke every refresh token of a user
    RevokeSessions {
        /// User id
        #[arg(short = 'u', long)]
        uid: Option<String>,

        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Print a user's identity and document as JSON
    ShowUser {
        /// User id
        #[arg(short = 'u', long)]
        uid: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let _log_guard = match init_tracing(&LogConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    let state = match connect() {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::CreateAdmin {
            email,
            name,
            class_id,
            yes,
        } => handle_create_admin(&state, email, name, class_id, yes).await,
        Commands::SetRole { uid, role, yes } => handle_set_role(&state, uid, role, yes).await,
        Commands::RevokeSessions { uid, yes } => handle_revoke_sessions(&state, uid, yes).await,
        Commands::ShowUser { uid } => handle_show_user(&state, uid).await,
    };

    if let Err(e) = result {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

fn connect() -> anyhow::Result<AppState> {
    let firebase = FirebaseConfig::from_env().context("Invalid Firebase configuration")?;
    init_app_state(&firebase)
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Input::<String>::new()
            .with_prompt(label)
            .interact_text()
            .with_context(|| format!("Failed to read {}", label.to_lowercase())),
    }
}

fn confirm(yes: bool, question: &str) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

async fn handle_create_admin(
    state: &AppState,
    email: Option<String>,
    name: Option<String>,
    class_id: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let email = prompt(email, "Email address")?;
    let name = prompt(name, "Name")?;
    let class_id = prompt(class_id, "Class id")?;

    if !confirm(yes, &format!("Create admin {}?", email))? {
        println!("Aborted");
        return Ok(());
    }

    let uid = create_admin(state, &email, &name, &class_id).await?;
    println!("\n✅ Admin created successfully!");
    println!("   Uid: {}", uid);
    println!("   Email: {}", email);
    println!("   Name: {}", name);
    Ok(())
}

async fn handle_set_role(
    state: &AppState,
    uid: Option<String>,
    role: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let uid = prompt(uid, "User id")?;
    let role = prompt(role, "Role")?;

    if !confirm(yes, &format!("Set role of {} to {}?", uid, role))? {
        println!("Aborted");
        return Ok(());
    }

    set_role(state, &uid, &role).await?;
    println!("✅ Role of {} set to {}", uid, role);
    Ok(())
}

async fn handle_revoke_sessions(
    state: &AppState,
    uid: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let uid = prompt(uid, "User id")?;

    if !confirm(yes, &format!("Revoke all sessions of {}?", uid))? {
        println!("Aborted");
        return Ok(());
    }

    revoke_sessions(state, &uid).await?;
    println!("✅ Sessions of {} revoked", uid);
    Ok(())
}

async fn handle_show_user(state: &AppState, uid: Option<String>) -> anyhow::Result<()> {
    let uid = prompt(uid, "User id")?;
    let summary = show_user(state, &uid).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
