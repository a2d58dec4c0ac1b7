use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recdb::auth::{Authenticator, Claims, LocalAuthenticator};
use recdb::config::{Config, DEFAULT_SECRET};
use recdb::{process_query, Session};

/// File-backed record store with a small command language
#[derive(Parser, Debug)]
#[command(name = "recdb", version, about)]
struct Args {
    /// Directory holding the database documents
    #[arg(short = 'd', long, default_value = ".", env = "RECDB_DATA_DIR")]
    data_dir: PathBuf,

    /// Directory EXPORT writes into (defaults to the download directory)
    #[arg(short = 'e', long, env = "RECDB_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// Open the single shared `storage` document on start-up
    #[arg(long, env = "RECDB_LEGACY")]
    legacy: bool,

    /// Token signing secret
    #[arg(long, env = "RECDB_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Users file (defaults to <data-dir>/auth/users.json)
    #[arg(long, value_name = "FILE")]
    users_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = build_config(args);
    if config.auth.secret == DEFAULT_SECRET {
        warn!("using the built-in token secret; set RECDB_SECRET");
    }

    let mut auth = LocalAuthenticator::open(config.users_file(), config.auth.clone())?;
    let mut input = io::stdin().lock();

    let claims = match sign_in(&mut auth, &mut input)? {
        Some(claims) => claims,
        None => return Ok(()),
    };
    println!("Welcome {}, your role is {}!", claims.username, claims.role);
    info!(user = %claims.username, "session started");

    let mut session = Session::open(config)?;
    repl(&mut session, &mut input)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "recdb=debug" } else { "recdb=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn build_config(args: Args) -> Config {
    let mut config = Config { data_dir: args.data_dir, legacy: args.legacy, ..Config::default() };
    if let Some(dir) = args.export_dir {
        config.export_dir = dir;
    }
    if let Some(secret) = args.secret {
        config.auth.secret = secret;
    }
    config.auth.users_file = args.users_file;
    config
}

/// Reads one trimmed line after printing `label`. `None` at end of input.
fn prompt(input: &mut impl BufRead, label: &str) -> io::Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn credentials(input: &mut impl BufRead) -> io::Result<Option<(String, String)>> {
    let username = match prompt(input, "Username: ")? {
        Some(u) => u,
        None => return Ok(None),
    };
    let password = match prompt(input, "Password: ")? {
        Some(p) => p,
        None => return Ok(None),
    };
    Ok(Some((username, password)))
}

/// Login/register menu. Returns verified claims, or `None` when the user quits.
fn sign_in(auth: &mut LocalAuthenticator, input: &mut impl BufRead) -> io::Result<Option<Claims>> {
    loop {
        println!("\n1. Login\n2. Register\n3. Quit");
        let choice = match prompt(input, "Choose an option: ")? {
            Some(choice) => choice,
            None => return Ok(None),
        };
        match choice.as_str() {
            "1" => {
                let (username, password) = match credentials(input)? {
                    Some(c) => c,
                    None => return Ok(None),
                };
                match auth.login(&username, &password).and_then(|token| auth.verify(&token)) {
                    Ok(claims) => return Ok(Some(claims)),
                    Err(e) => println!("{}", e),
                }
            }
            "2" => {
                let (username, password) = match credentials(input)? {
                    Some(c) => c,
                    None => return Ok(None),
                };
                match auth.register(&username, &password) {
                    Ok(()) => println!("User registered successfully!"),
                    Err(e) => println!("{}", e),
                }
            }
            "3" => return Ok(None),
            _ => println!("Invalid choice."),
        }
    }
}

fn repl(session: &mut Session, input: &mut impl BufRead) -> Result<(), Box<dyn std::error::Error>> {
    while let Some(line) = prompt(input, "db> ")? {
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if line.is_empty() {
            continue;
        }
        println!("{}", process_query(session, &line));
    }
    println!("Goodbye.");
    Ok(())
}
