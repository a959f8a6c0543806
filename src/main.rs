use anyhow::Context;
use clap::Parser;

use tourgen::auth::AuthGate;
use tourgen::cli::{Cli, Command};
use tourgen::config::Config;
use tourgen::server::{self, AppState};
use tourgen::service::TourService;
use tourgen::{log, provider, ux, walk};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    log::init_tracing(cli.debug)?;

    let mut cfg = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve(args) => {
            args.apply(&mut cfg);
            cfg.validate().context("refusing to start")?;

            let prov = provider::make_provider(&cfg)?;
            let service = TourService::new(prov, &cfg);
            let state = AppState {
                service: service.clone(),
                auth: AuthGate::new(cfg.demo_username.clone(), cfg.demo_password.clone()),
            };
            let app = server::router(state, &cfg.static_dir);

            ux::print_banner(&cfg, service.provider_name());
            tracing::info!(addr = %cfg.bind_addr(), provider = service.provider_name(), model = %cfg.model, "AI Tour Generator starting");
            server::serve(&cfg.bind_addr(), app).await
        }
        Command::Walk(args) => walk::run(&args, &cfg).await,
    }
}
