use clap::{Parser, Subcommand};
use ring::rand::SystemRandom;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use otp::totp::{self, format_code};
use otp::{
    qrcode, Clock, Config, Enrollment, FixedClock, KeyUriParams, SecretPolicy, SecretRef,
    SystemClock, Totp,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with issuer, secret policy and verification window.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Issue secrets and key URIs for a group of members.
    Enroll {
        /// Member name, repeat once per member.
        #[arg(long = "member", short, required = true)]
        members: Vec<String>,
        #[arg(long)]
        issuer: Option<String>,
        /// Give every member an independent secret.
        #[arg(long)]
        per_member: bool,
    },
    /// Print the current code for a Base32 secret.
    Code {
        #[arg(long, short)]
        secret: String,
        /// Unix time to compute the code at instead of now.
        #[arg(long)]
        at: Option<u64>,
    },
    /// Check a code against a Base32 secret.
    Verify {
        #[arg(long, short)]
        secret: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        at: Option<u64>,
        /// Windows accepted on either side of the current one, at most 10.
        #[arg(long)]
        window: Option<u64>,
    },
    /// Build the key URI for a single account.
    Uri {
        #[arg(long, short)]
        secret: String,
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        account: String,
    },
    /// Read a key URI from a QR code image and print its current code.
    Scan { image: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> otp::Result<ExitCode> {
    let config = Config::load_or_default(args.config.as_deref())?;

    match args.cmd {
        Commands::Enroll {
            members,
            issuer,
            per_member,
        } => {
            let mut enrollment = Enrollment::new(issuer.unwrap_or(config.issuer));
            for name in members {
                enrollment.add_member(name)?;
            }
            let policy = if per_member {
                SecretPolicy::PerMember
            } else {
                config.policy
            };

            for p in enrollment.issue(&SystemRandom::new(), policy)? {
                println!("{}", p.member.name);
                println!("  secret: {}", p.display_secret());
                println!("  uri:    {}", p.uri);
            }
        }
        Commands::Code { secret, at } => {
            let engine = Totp::with_clock(clock_at(at));
            let code = engine.generate_code(&secret)?;
            println!("{} ({}s left)", format_code(&code), engine.remaining_seconds());
        }
        Commands::Verify {
            secret,
            code,
            at,
            window,
        } => {
            let window = window.unwrap_or(config.verify_window);
            let valid = totp::verify_at(&secret, code.trim(), clock_at(at).now(), window)?;
            println!("{}", if valid { "valid" } else { "invalid" });
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Uri {
            secret,
            issuer,
            account,
        } => {
            let issuer = issuer.unwrap_or(config.issuer);
            let uri = otp::build_uri(KeyUriParams {
                secret: SecretRef::from(&secret),
                issuer: &issuer,
                account: &account,
            })?;
            println!("{}", uri);
        }
        Commands::Scan { image } => {
            let key = qrcode::extract_key_uri(&image)?;
            let clock = SystemClock;
            println!(
                "{} ({}s left)",
                format_code(&key.current_code(&clock)?),
                key.remaining_seconds(&clock)
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn clock_at(at: Option<u64>) -> Box<dyn Clock> {
    match at {
        Some(t) => Box::new(FixedClock(t)),
        None => Box::new(SystemClock),
    }
}
