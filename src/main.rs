use clap::{Parser, Subcommand};

use academialink::application::bootstrapper;
use academialink::models::institutional_id::{AcademicLevel, AccountType};
use academialink::schemas::institutional_id::GenerateIdsRequest;
use academialink::services::{institutional_ids, registration};

#[derive(Debug, Parser)]
#[command(name = "academialink", version, about = "AcademiaLink university library backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Pre-create active institutional IDs and print them
    GenerateIds {
        #[arg(long, default_value_t = 10)]
        count: u32,
        #[arg(long = "type", default_value = "student")]
        account_type: AccountType,
        #[arg(long)]
        academic_level: Option<AcademicLevel>,
        #[arg(long)]
        department: Option<String>,
    },
    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => bootstrapper::run().await,
        Command::GenerateIds {
            count,
            account_type,
            academic_level,
            department,
        } => {
            bootstrapper::init_tracing();
            let state = bootstrapper::init_services().await?;

            let request = GenerateIdsRequest {
                count,
                account_type: Some(account_type),
                academic_level,
                department,
                ..Default::default()
            };
            let created = institutional_ids::generate_bulk(&state.db, &request, None).await?;

            for record in &created {
                println!("{}", record.institutional_id);
            }
            tracing::info!("Generated {} institutional IDs", created.len());
            Ok(())
        }
        Command::CreateAdmin {
            username,
            email,
            password,
        } => {
            bootstrapper::init_tracing();
            let state = bootstrapper::init_services().await?;

            let admin =
                registration::create_administrator(&state.db, &username, &email, &password).await?;
            println!("Created administrator '{}'", admin.username);
            Ok(())
        }
    }
}
