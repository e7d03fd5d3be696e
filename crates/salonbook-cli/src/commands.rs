//! Subcommands of the `salonbook` binary.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{error, warn};

use salonbook_core::api::ApiError;
use salonbook_core::auth::{LoginForm, SignupForm};
use salonbook_core::models::AccountType;
use salonbook_core::places::PlacesClient;
use salonbook_core::{Config, CredentialStore, Session};

pub const USAGE: &str = "\
Usage: salonbook <command>

Commands:
  login [email] [customer|salon_admin]   Sign in (password is prompted)
  register                               Create an account
  guest                                  Continue without an account
  logout                                 Sign out and forget the stored token
  status                                 Show the current session
  nearby <latitude> <longitude>          List salons within 5 km
  help                                   Show this message";

#[derive(Debug)]
pub enum Command {
    Login {
        email: Option<String>,
        account_type: Option<AccountType>,
    },
    Register,
    Guest,
    Logout,
    Status,
    Nearby { latitude: f64, longitude: f64 },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some(name) = args.first() else {
            return Ok(Command::Help);
        };
        match name.as_str() {
            "login" => {
                let account_type = match args.get(2) {
                    Some(raw) => Some(
                        AccountType::parse(raw)
                            .ok_or_else(|| format!("Unknown account type: {}", raw))?,
                    ),
                    None => None,
                };
                Ok(Command::Login {
                    email: args.get(1).cloned(),
                    account_type,
                })
            }
            "register" => Ok(Command::Register),
            "guest" => Ok(Command::Guest),
            "logout" => Ok(Command::Logout),
            "status" => Ok(Command::Status),
            "nearby" => {
                let (Some(lat), Some(lng)) = (args.get(1), args.get(2)) else {
                    return Err("nearby needs a latitude and a longitude".to_string());
                };
                let latitude = lat
                    .parse()
                    .map_err(|_| format!("Invalid latitude: {}", lat))?;
                let longitude = lng
                    .parse()
                    .map_err(|_| format!("Invalid longitude: {}", lng))?;
                Ok(Command::Nearby {
                    latitude,
                    longitude,
                })
            }
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

pub async fn run(command: Command) -> Result<()> {
    if let Command::Help = command {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load().context("Failed to load configuration")?;

    if let Command::Nearby {
        latitude,
        longitude,
    } = command
    {
        return nearby(&config, latitude, longitude).await;
    }

    let session_config = config
        .session_config()
        .context("Backend is not configured")?;
    let mut session = Session::start(session_config, CredentialStore::keyring())
        .context("Failed to start session")?;

    let result = match command {
        Command::Login {
            email,
            account_type,
        } => login(&mut session, &mut config, email, account_type).await,
        Command::Register => register(&session).await,
        Command::Guest => session.login_as_guest().map(|()| {
            println!("Continuing as guest.");
            println!("Opening {}", session.landing_route().path());
        }),
        Command::Logout => session.logout().map(|()| println!("Signed out.")),
        Command::Status => {
            status(&session);
            Ok(())
        }
        Command::Nearby { .. } | Command::Help => Ok(()),
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn login(
    session: &mut Session,
    config: &mut Config,
    email: Option<String>,
    account_type: Option<AccountType>,
) -> Result<(), ApiError> {
    let form = LoginForm {
        account_type: account_type.or_else(prompt_account_type),
        email: email
            .or_else(|| prompt_with_default("Email", config.last_email.as_deref()))
            .unwrap_or_default(),
        password: prompt_password("Password: "),
    };
    let request = match form.validate() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    println!("\nAuthenticating...");
    let user = session.login_with(&request).await?;

    config.last_email = Some(request.email.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Login successful! Welcome, {}.", user.display_name());
    println!("Opening {}", session.landing_route().path());
    Ok(())
}

async fn register(session: &Session) -> Result<(), ApiError> {
    let form = SignupForm {
        account_type: prompt_account_type(),
        name: prompt("Name").unwrap_or_default(),
        email: prompt("Email").unwrap_or_default(),
        phone: prompt("Phone").unwrap_or_default(),
        password: prompt_password("Password: "),
        confirm_password: prompt_password("Confirm password: "),
    };
    let request = match form.validate() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let response = session.register(&request).await?;
    match response.get("message").and_then(|m| m.as_str()) {
        Some(message) => println!("{}", message),
        None => println!("Account created. You can now log in."),
    }
    Ok(())
}

fn status(session: &Session) {
    let state = session.state();
    let phase = if !state.is_authenticated() {
        "signed out"
    } else if state.is_guest() {
        "guest"
    } else {
        "signed in"
    };
    println!("Session:      {}", phase);
    println!(
        "Stored token: {}",
        if session.store().has_token() { "yes" } else { "no" }
    );
    if let Some(user) = state.trusted_user() {
        println!("User:         {}", user.display_name());
        if let Some(role) = user.role {
            println!("Role:         {}", role.as_str());
        }
    }
    println!("Landing:      {}", state.landing_route().path());
}

async fn nearby(config: &Config, latitude: f64, longitude: f64) -> Result<()> {
    let key = config
        .maps_api_key
        .clone()
        .context("Maps API key is not configured (set SALONBOOK_MAPS_KEY)")?;
    let places = PlacesClient::new(key)?;
    let salons = places.fetch_nearby_salons(latitude, longitude).await?;

    if salons.is_empty() {
        println!("No salons found nearby.");
    }
    for salon in salons {
        println!(
            "{:<32} {:>9.5},{:<10.5} {}",
            salon.name,
            salon.latitude,
            salon.longitude,
            salon.address_display()
        );
    }
    Ok(())
}

fn prompt(label: &str) -> Option<String> {
    prompt_with_default(label, None)
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Option<String> {
    match default {
        Some(value) => print!("{} [{}]: ", label, value),
        None => print!("{}: ", label),
    }
    io::stdout().flush().ok()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).ok()?;
    let input = input.trim();
    if input.is_empty() {
        default.map(str::to_string)
    } else {
        Some(input.to_string())
    }
}

fn prompt_account_type() -> Option<AccountType> {
    prompt("Account type (salon/customer)").and_then(|s| AccountType::parse(&s))
}

fn prompt_password(label: &str) -> String {
    rpassword::prompt_password(label).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_login_with_arguments() {
        let command = Command::parse(&args(&["login", "a@x.com", "salon"])).unwrap();
        match command {
            Command::Login {
                email,
                account_type,
            } => {
                assert_eq!(email.as_deref(), Some("a@x.com"));
                assert_eq!(account_type, Some(AccountType::SalonAdmin));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_login_rejects_unknown_type() {
        assert!(Command::parse(&args(&["login", "a@x.com", "barber"])).is_err());
    }

    #[test]
    fn test_parse_nearby() {
        let command = Command::parse(&args(&["nearby", "6.9271", "79.8612"])).unwrap();
        assert!(matches!(
            command,
            Command::Nearby { latitude, longitude } if latitude == 6.9271 && longitude == 79.8612
        ));
        assert!(Command::parse(&args(&["nearby", "north"])).is_err());
        assert!(Command::parse(&args(&["nearby", "x", "1"])).is_err());
    }

    #[test]
    fn test_no_arguments_shows_help() {
        assert!(matches!(Command::parse(&[]), Ok(Command::Help)));
        assert!(Command::parse(&args(&["book"])).is_err());
    }
}
