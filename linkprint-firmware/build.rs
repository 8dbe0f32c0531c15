//! Build script for linkprint-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates printer.toml at compile time
//! - Generates the `PRINTER_CONFIG` constant from it

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Defaults for keys missing from printer.toml
const DEFAULT_CLOCK_MODE: &str = "rising";
const DEFAULT_CLOCK_GAP_US: i64 = 2_000;
const DEFAULT_TIMEOUT_MS: i64 = 500;
const DEFAULT_BUSY_INQUIRIES: i64 = 4;
const DEFAULT_RESPONSE: &str = "printer";

const MAX_TIMEOUT_MS: i64 = 60_000;

fn main() {
    setup_linker();
    let config = validate_config();
    generate_config(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Values read from printer.toml, defaults filled in
struct Config {
    clock_mode: String,
    clock_gap_reset_us: i64,
    session_timeout_ms: i64,
    capture_raw: bool,
    busy_inquiries: i64,
    response: String,
    fixed_byte: i64,
}

/// Validate printer.toml configuration at compile time
fn validate_config() -> Config {
    // Re-run if printer.toml changes
    println!("cargo:rerun-if-changed=printer.toml");

    let config_path = Path::new("printer.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: printer.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a printer.toml configuration file.        ║\n\
            ║  Please create one in the linkprint-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read printer.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in printer.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let link = section(&config, "link", &mut errors);
    let session = section(&config, "session", &mut errors);
    let printer = section(&config, "printer", &mut errors);

    let clock_mode = string(link, "link", "clock_mode", DEFAULT_CLOCK_MODE, &mut errors);
    if !["rising", "both"].contains(&clock_mode.as_str()) {
        errors.push("[link] clock_mode must be 'rising' or 'both'".to_string());
    }

    let clock_gap_reset_us = integer(
        link,
        "link",
        "clock_gap_reset_us",
        DEFAULT_CLOCK_GAP_US,
        1..=u32::MAX as i64,
        &mut errors,
    );

    let session_timeout_ms = integer(
        session,
        "session",
        "timeout_ms",
        DEFAULT_TIMEOUT_MS,
        1..=MAX_TIMEOUT_MS,
        &mut errors,
    );

    let capture_raw = match session.and_then(|s| s.get("capture_raw")) {
        None => false,
        Some(toml::Value::Boolean(b)) => *b,
        Some(_) => {
            errors.push("[session] capture_raw must be true or false".to_string());
            false
        }
    };

    let busy_inquiries = integer(
        printer,
        "printer",
        "busy_inquiries",
        DEFAULT_BUSY_INQUIRIES,
        0..=255,
        &mut errors,
    );

    let response = string(printer, "printer", "response", DEFAULT_RESPONSE, &mut errors);
    let fixed_byte = match response.as_str() {
        "printer" => 0,
        "fixed" => {
            if printer.and_then(|p| p.get("fixed_byte")).is_none() {
                errors.push("[printer] response = 'fixed' requires 'fixed_byte'".to_string());
            }
            integer(printer, "printer", "fixed_byte", 0, 0..=255, &mut errors)
        }
        _ => {
            errors.push("[printer] response must be 'printer' or 'fixed'".to_string());
            0
        }
    };

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid printer configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=printer.toml validated successfully");

    Config {
        clock_mode,
        clock_gap_reset_us,
        session_timeout_ms,
        capture_raw,
        busy_inquiries,
        response,
        fixed_byte,
    }
}

/// Write `$OUT_DIR/printer_config.rs`
fn generate_config(config: &Config) {
    let clock_mode = match config.clock_mode.as_str() {
        "both" => "BothEdges",
        _ => "RisingEdge",
    };
    let response = match config.response.as_str() {
        "fixed" => format!("ResponseKind::Fixed({:#04x})", config.fixed_byte),
        _ => "ResponseKind::Printer".to_string(),
    };

    let source = format!(
        "// Generated from printer.toml by build.rs\n\
        \n\
        use linkprint_core::config::{{PrinterConfig, ResponseKind}};\n\
        use linkprint_core::link::ClockMode;\n\
        \n\
        pub const PRINTER_CONFIG: PrinterConfig = PrinterConfig {{\n\
        \x20   clock_mode: ClockMode::{},\n\
        \x20   session_timeout_ms: {},\n\
        \x20   clock_gap_reset_us: {},\n\
        \x20   busy_inquiries: {},\n\
        \x20   response: {},\n\
        \x20   capture_raw: {},\n\
        }};\n",
        clock_mode,
        config.session_timeout_ms,
        config.clock_gap_reset_us,
        config.busy_inquiries,
        response,
        config.capture_raw,
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("printer_config.rs"), source).unwrap();
}

/// Optional table; a non-table value is an error
fn section<'a>(
    config: &'a toml::Value,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<&'a toml::value::Table> {
    match config.get(name) {
        None => None,
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
    }
}

fn string(
    table: Option<&toml::value::Table>,
    section: &str,
    key: &str,
    default: &str,
    errors: &mut Vec<String>,
) -> String {
    match table.and_then(|t| t.get(key)) {
        None => default.to_string(),
        Some(toml::Value::String(s)) => s.clone(),
        Some(_) => {
            errors.push(format!("[{}] {} must be a string", section, key));
            default.to_string()
        }
    }
}

fn integer(
    table: Option<&toml::value::Table>,
    section: &str,
    key: &str,
    default: i64,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match table.and_then(|t| t.get(key)) {
        None => default,
        Some(toml::Value::Integer(value)) if range.contains(value) => *value,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            ));
            default
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            default
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
