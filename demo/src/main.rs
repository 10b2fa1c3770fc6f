// Walkthrough binary: mounts a patient form, drives it through the full
// lifecycle (typo, blur validation, fix, submit) and prints each step.
// Doubles as an executable smoke test of the whole stack.

use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::json;

use catalog::patient;
use formcore::{FormScope, FormServices, ScopeAccess};
use shared::{FieldValue, InputKind, Role, User};

#[derive(Parser)]
#[command(name = "demo")]
#[command(about = "Clinic form engine walkthrough")]
struct Args {
    /// Role to mount the form as (admin, doctor, secretary, guest)
    #[arg(long, default_value = "secretary")]
    role: String,

    /// Submit this many times to exercise the rate limiter
    #[arg(long, default_value = "1")]
    submits: u32,
}

fn parse_role(raw: &str) -> Result<Role> {
    match raw {
        "admin" => Ok(Role::Admin),
        "doctor" => Ok(Role::Doctor),
        "secretary" => Ok(Role::Secretary),
        "guest" => Ok(Role::Guest),
        other => Err(anyhow!("unknown role `{other}`")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let role = parse_role(&args.role)?;
    let user = User::new("demo", role);

    println!("{}", "Clinic form engine walkthrough".bold().cyan());
    println!("role: {}\n", user.role.to_string().yellow());

    let services = FormServices::from_env();
    let access = FormScope::mount(patient::config(Some(user)), &services)?;

    let scope = match access {
        ScopeAccess::Granted(scope) => scope,
        ScopeAccess::Denied { missing } => {
            println!("{} missing permission: {missing}", "access denied".red().bold());
            return Ok(());
        }
    };
    let handle = scope.handle();

    println!("{} filling in the form", "→".green());
    handle.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);
    handle.handle_change("apellido", FieldValue::from("García"), InputKind::Text);
    handle.handle_change("email", FieldValue::from("ANA@Clinica.com "), InputKind::Text);
    handle.handle_change(
        "fecha_nacimiento",
        FieldValue::from("1990-04-12"),
        InputKind::Text,
    );

    let id = handle.add_dynamic_field("telefonos", &patient::phone_template());
    handle.handle_dynamic_change("telefonos", id, "telefono", FieldValue::from("011 4444-5555"));

    // On-blur feedback for a field left empty
    handle.validate_field("direccion");
    if let Some(error) = handle.error("direccion") {
        println!("{} direccion: {error}", "✗".red());
    } else {
        println!("{} direccion ok (optional)", "✓".green());
    }

    for round in 1..=args.submits {
        let result = handle
            .submit(|data| async move {
                // Stand-in for the REST call the real app makes
                Ok(json!({"id": round, "paciente": data.get("nombre")}))
            })
            .await;

        match result {
            Some(saved) => println!("{} submit #{round}: {saved}", "✓".green()),
            None => {
                let banner = handle.general_error().unwrap_or_default();
                println!("{} submit #{round}: {banner}", "✗".red());
            }
        }
    }

    let chrome = scope.chrome(false, None, Some("Paciente guardado"));
    println!(
        "\nchrome: loading={} error={:?} success={:?}",
        chrome.loading, chrome.error_banner, chrome.success_banner
    );

    Ok(())
}
