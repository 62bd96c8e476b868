//! `lms` is the OpenLMS CLI client.
//!
//! Manages the server connection, authentication, and resource
//! operations against an OpenLMS backend.

mod commands;
mod config;

use std::time::Duration;

use clap::{Parser, Subcommand};

/// OpenLMS CLI tool.
#[derive(Parser, Debug)]
#[command(name = "lms", about = "OpenLMS CLI client")]
struct Cli {
    /// Path to client config file (default: ~/.openlms/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Server URL, overriding the config file.
    #[arg(long = "server", global = true)]
    server: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    /// Raise the log level (-v info, -vv debug).
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configure the server connection.
    Server {
        #[command(subcommand)]
        action: ServerAction,
    },

    /// Sign in and save the session.
    Login {
        /// Email address.
        #[arg(long)]
        email: Option<String>,
        /// Password (not recommended, use the interactive prompt).
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and clear the saved session.
    Logout {
        /// Also end every other session for this account.
        #[arg(long)]
        all: bool,
    },

    /// Show the signed-in account, validated against the server.
    Whoami,

    /// Show the local connection and session state.
    Status,

    /// Get resource(s).
    Get {
        /// Resource type (e.g. courses, users, blogs).
        resource: String,
        /// Optional resource ID for single get.
        id: Option<String>,
        /// Filter by course ID (modules).
        #[arg(long)]
        course: Option<String>,
        /// Filter by module ID (lectures).
        #[arg(long)]
        module: Option<String>,
        /// Limit results.
        #[arg(long)]
        limit: Option<usize>,
        /// Offset for pagination.
        #[arg(long)]
        offset: Option<usize>,
    },

    /// Create a resource.
    Create {
        /// Resource type.
        resource: String,
        /// JSON body.
        #[arg(long = "json")]
        json_body: Option<String>,
        /// Read JSON from file.
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },

    /// Update a resource (PATCH).
    Update {
        /// Resource type.
        resource: String,
        /// Resource ID.
        id: String,
        /// JSON body.
        #[arg(long = "json")]
        json_body: String,
    },

    /// Delete a resource.
    Delete {
        /// Resource type.
        resource: String,
        /// Resource ID.
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Request enrollment in a course.
    Enroll {
        /// Course ID.
        course_id: String,
    },

    /// Approve a pending enrollment request.
    Approve {
        /// Enrollment request ID.
        request_id: String,
    },

    /// Reject a pending enrollment request.
    Reject {
        /// Enrollment request ID.
        request_id: String,
    },

    /// User administration.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Keep the session alive and report server-side changes.
    Watch {
        /// Seconds between session checks.
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ServerAction {
    /// Point the CLI at a server.
    Set {
        /// Server URL (e.g. "http://localhost:5000").
        url: String,
        /// Where to keep the saved session.
        #[arg(long)]
        session_file: Option<String>,
    },
    /// Show the configured connection.
    Show,
}

#[derive(Subcommand, Debug)]
enum UserAction {
    /// Change a user's role.
    Role {
        /// User ID.
        id: String,
        /// New role: user, admin or superAdmin.
        role: String,
    },
    /// Change a user's status.
    Status {
        /// User ID.
        id: String,
        /// New status: in-progress or blocked.
        status: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging. The default filter keeps library output
    // quiet; -v raises it, RUST_LOG overrides.
    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config_path = cli
        .config
        .as_deref()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let mut client_config = config::ClientConfig::load(&config_path)?;
    if let Some(server) = &cli.server {
        client_config.server.url = server.trim_end_matches('/').to_string();
    }

    match cli.command {
        Commands::Server { action } => match action {
            ServerAction::Set { url, session_file } => {
                commands::server::set(&url, session_file.as_deref(), &config_path)?;
            }
            ServerAction::Show => {
                commands::server::show(&config_path)?;
            }
        },

        Commands::Login { email, password } => {
            let email = email.unwrap_or_else(|| {
                eprint!("Email: ");
                let mut s = String::new();
                std::io::stdin().read_line(&mut s).unwrap();
                s.trim().to_string()
            });
            let password = password.unwrap_or_else(|| {
                rpassword::prompt_password("Password: ").unwrap_or_default()
            });
            let app = commands::build_app(&client_config, None)?;
            commands::session::login(&app, &email, &password).await?;
        }

        Commands::Logout { all } => {
            let app = commands::build_app(&client_config, None)?;
            commands::session::logout(&app, all).await?;
        }

        Commands::Whoami => {
            let app = commands::build_app(&client_config, None)?;
            commands::session::whoami(&app).await?;
        }

        Commands::Status => {
            commands::session::status(&client_config)?;
        }

        Commands::Get {
            resource,
            id,
            course,
            module,
            limit,
            offset,
        } => {
            let json_output = cli.output == "json";
            let filter = commands::resource::ListFilter {
                course,
                module,
                limit,
                offset,
            };
            let app = commands::build_app(&client_config, None)?;
            commands::resource::get(&app, &resource, id.as_deref(), json_output, &filter)
                .await?;
        }

        Commands::Create {
            resource,
            json_body,
            file,
        } => {
            let body = if let Some(path) = file {
                std::fs::read_to_string(&path)?
            } else if let Some(json) = json_body {
                json
            } else {
                anyhow::bail!("Provide --json or -f <file>.");
            };
            let app = commands::build_app(&client_config, None)?;
            commands::resource::create(&app, &resource, &body).await?;
        }

        Commands::Update {
            resource,
            id,
            json_body,
        } => {
            let app = commands::build_app(&client_config, None)?;
            commands::resource::update(&app, &resource, &id, &json_body).await?;
        }

        Commands::Delete { resource, id, yes } => {
            if !yes {
                eprint!("Are you sure? [y/N]: ");
                let mut s = String::new();
                std::io::stdin().read_line(&mut s).unwrap();
                if !s.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let app = commands::build_app(&client_config, None)?;
            commands::resource::delete(&app, &resource, &id).await?;
        }

        Commands::Enroll { course_id } => {
            let app = commands::build_app(&client_config, None)?;
            commands::enroll::enroll(&app, &course_id).await?;
        }

        Commands::Approve { request_id } => {
            let app = commands::build_app(&client_config, None)?;
            commands::enroll::approve(&app, &request_id).await?;
        }

        Commands::Reject { request_id } => {
            let app = commands::build_app(&client_config, None)?;
            commands::enroll::reject(&app, &request_id).await?;
        }

        Commands::User { action } => match action {
            UserAction::Role { id, role } => {
                let app = commands::build_app(&client_config, None)?;
                commands::admin::set_role(&app, &id, &role).await?;
            }
            UserAction::Status { id, status } => {
                let app = commands::build_app(&client_config, None)?;
                commands::admin::set_status(&app, &id, &status).await?;
            }
        },

        Commands::Watch { interval } => {
            let app =
                commands::build_app(&client_config, Some(Duration::from_secs(interval)))?;
            commands::session::watch(&app).await?;
        }

        Commands::Version => {
            println!("lms cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
