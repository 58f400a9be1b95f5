use clap::Parser;
use colored::Colorize;
use m365ctl::cli::{Cli, Commands, GlobalArgs, option_error};
use m365ctl::cmd::{self, confirm::TerminalPrompter, executor::{Executor, Outcome}};
use m365ctl::config::ConfigManager;
use m365ctl::error;
use m365ctl::graph::{Credentials, HttpTransport, auth::GraphAuth};
use m365ctl::output::render;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match option_error(&e) {
            Some(err) => fail(&err),
            // --help and --version print to stdout and exit 0
            None if !e.use_stderr() => e.exit(),
            None => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    };

    init_logging(&cli.global);

    if let Err(e) = run(cli).await {
        fail(&e);
    }
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), error);
    std::process::exit(1);
}

fn init_logging(global: &GlobalArgs) {
    let filter = if global.debug {
        "m365ctl=debug"
    } else if global.verbose {
        "m365ctl=info"
    } else {
        "m365ctl=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load_config()?;
    let mode = cli.global.output.or(config.output).unwrap_or_default();

    let session = config_manager.session()?;
    let credentials = match config.connection {
        Some(connection) => Credentials::Connection {
            auth: GraphAuth::new(config_manager.clone(), &session.authority),
            connection,
        },
        None => Credentials::None,
    };
    let transport = HttpTransport::new(credentials);
    let prompter = TerminalPrompter;
    let executor = Executor::new(&session, &transport, &prompter, mode);

    let outcome = match cli.command {
        Commands::Login(args) => {
            cmd::login::login(args, &config_manager).await?;
            return Ok(());
        }
        Commands::Logout => {
            cmd::login::logout(&config_manager)?;
            return Ok(());
        }
        Commands::Status => Outcome::Completed(cmd::login::status(&config_manager)?),
        Commands::ListCommands => Outcome::Completed(cmd::commands_output(&cmd::registry())),
        Commands::Aad(command) => command.execute(&executor).await?,
        Commands::Spo(command) => command.execute(&executor).await?,
        Commands::Tenant(command) => command.execute(&executor).await?,
    };

    if let Outcome::Completed(output) = outcome {
        if let Some(text) = render(&output, mode)? {
            println!("{}", text);
        }
    }

    Ok(())
}
