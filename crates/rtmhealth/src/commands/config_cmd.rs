//! Config subcommand handlers.

use dialoguer::{Input, Select};

use rtmhealth_core::DEFAULT_CONTROLLER;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// A copy of `cfg` with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let profiles = cfg
        .profiles
        .iter()
        .map(|(name, p)| {
            let mut p = p.clone();
            if p.token.is_some() {
                p.token = Some(REDACTED.into());
            }
            (name.clone(), p)
        })
        .collect();

    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            insecure: cfg.defaults.insecure,
            timeout: cfg.defaults.timeout,
        },
        profiles,
    }
}

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    if let Some(timeout) = cfg.defaults.timeout {
        let _ = writeln!(out, "timeout = {timeout}");
    }

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "controller = \"{}\"", p.controller_url());
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"{REDACTED}\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref site) = p.site {
            let _ = writeln!(out, "site = \"{site}\"");
        }
        if let Some(ref app) = p.app {
            let _ = writeln!(out, "app = \"{app}\"");
        }
        if let Some(hours) = p.lookback_hours {
            let _ = writeln!(out, "lookback_hours = {hours}");
        }
        if let Some(offset) = p.time_offset_hours {
            let _ = writeln!(out, "time_offset_hours = {offset}");
        }
        if let Some(ms) = p.min_call_duration_ms {
            let _ = writeln!(out, "min_call_duration_ms = {ms}");
        }
        if let Some(pl) = p.max_packet_loss {
            let _ = writeln!(out, "max_packet_loss = {pl}");
        }
        if let Some(ref dir) = p.output_dir {
            let _ = writeln!(out, "output_dir = \"{}\"", dir.display());
        }
    }

    out
}

/// Delegate to the shared config crate's save function.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_value<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}, got '{value}'"),
    })
}

/// Apply `key = value` to a profile. Dashes and underscores are
/// interchangeable in key names.
fn apply_setting(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "controller" => {
            rtmhealth_config::parse_controller_url(&value)?;
            profile.controller = Some(value);
        }
        "token" => profile.token = Some(value),
        "token_env" => profile.token_env = Some(value),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_value(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_value(key, &value, "a number (seconds)")?),
        "site" => profile.site = Some(value),
        "app" => profile.app = Some(value),
        "lookback_hours" | "hours" => {
            profile.lookback_hours = Some(parse_value(key, &value, "a whole number of hours")?);
        }
        "time_offset_hours" | "offset_hours" => {
            profile.time_offset_hours = Some(parse_value(key, &value, "a signed number of hours")?);
        }
        "min_call_duration_ms" | "min_duration_ms" => {
            profile.min_call_duration_ms = Some(parse_value(key, &value, "milliseconds")?);
        }
        "max_packet_loss" | "max_loss" => {
            let pl: f64 = parse_value(key, &value, "a percentage")?;
            if !pl.is_finite() || pl < 0.0 {
                return Err(CliError::Validation {
                    field: key.into(),
                    reason: "must be a non-negative percentage".into(),
                });
            }
            profile.max_packet_loss = Some(pl);
        }
        "output_dir" => profile.output_dir = Some(value.into()),
        _ => {
            return Err(CliError::Validation {
                field: key.into(),
                reason: format!(
                    "unknown config key '{key}'. Valid keys: controller, token, token_env, \
                     ca_cert, insecure, timeout, site, app, lookback_hours, \
                     time_offset_hours, min_call_duration_ms, max_packet_loss, output_dir"
                ),
            });
        }
    }
    Ok(())
}

/// Store `secret` in the keyring entry for `profile_name`.
fn store_token(profile_name: &str, secret: &str) -> Result<(), CliError> {
    let entry = rtmhealth_config::token_entry(profile_name).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to access keyring: {e}"),
    })?;
    entry
        .set_password(secret)
        .map_err(|e| CliError::Validation {
            field: "keyring".into(),
            reason: format!("failed to store token in keyring: {e}"),
        })
}

/// Offer to store the token in the system keyring or return it for
/// plaintext config.
///
/// Returns `Some(token)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(token: &str, profile_name: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the token?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_token(profile_name, token)?;
        eprintln!("   ✓ token stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(token.to_owned()))
    }
}

fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("Auth token: ").map_err(prompt_err)?;
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token)
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            // Read first so a broken file stops the wizard before any prompt.
            let mut cfg = config::load_config()?;
            eprintln!("rtmhealth configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let controller: String = Input::new()
                .with_prompt("Controller URL")
                .default(DEFAULT_CONTROLLER.into())
                .interact_text()
                .map_err(prompt_err)?;
            rtmhealth_config::parse_controller_url(&controller)?;

            let token = prompt_token()?;
            let token_field = prompt_keyring_storage(&token, &profile_name)?;

            let site: String = Input::new()
                .with_prompt("Default site name (blank for none)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let app: String = Input::new()
                .with_prompt("Application")
                .default("rtp".into())
                .interact_text()
                .map_err(prompt_err)?;

            let profile = Profile {
                controller: (controller != DEFAULT_CONTROLLER).then_some(controller),
                token: token_field,
                site: (!site.is_empty()).then_some(site),
                app: (app != "rtp").then_some(app),
                ..Profile::default()
            };

            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: rtmhealth sites");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            apply_setting(profile, &key, value)?;

            save_config(&cfg)?;
            output::status(&format!("✓ Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: rtmhealth config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::status(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config()?;
            let profile_name =
                profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let token = prompt_token()?;
            store_token(&profile_name, &token)?;

            output::status(
                &format!("✓ Token stored in system keyring for profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}
