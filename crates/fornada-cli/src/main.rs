// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use fornada_app::{AppState, UserId, UserRole};
use fornada_gateway::HttpGateway;
use fornada_testkit::{DEMO_ADMIN_ID, MemoryGateway, seed_demo};
use runtime::GatewayRuntime;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `fornada --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let mut state = AppState::default();

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, options.role);
        let mut runtime = GatewayRuntime::new(
            gateway,
            Some(UserId::from(DEMO_ADMIN_ID)),
            config.page_size(),
        );
        return fornada_tui::run_app(&mut state, &mut runtime);
    }

    let gateway = HttpGateway::new(
        config.base_url()?,
        config.api_key()?,
        config.auth_token(),
        config.timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [service] config in {}; fix base_url/api_key/timeout values",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    let bakery_admin = config.admin_id().map(UserId::from);
    let mut runtime = GatewayRuntime::new(gateway, bakery_admin, config.page_size());
    fornada_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    role: UserRole,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        demo: false,
        role: UserRole::Admin,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--role" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--role requires a value"))?;
                options.role = match UserRole::parse(value.as_ref()) {
                    Some(role) => role,
                    None => bail!(
                        "unknown role {:?}; use cliente, admin, or superadmin",
                        value.as_ref()
                    ),
                };
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("fornada");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --role <role>            Demo session role: cliente, admin, superadmin");
    println!("  --check                  Validate config + gateway setup");
    println!("  --help                   Show this help");
}
