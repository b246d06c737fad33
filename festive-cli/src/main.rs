use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

use festive_core::{
    SubscriptionType, find_active, generate_discount_code, resolve_name, season_for_month,
};
use festive_engine::store::load_popup;
use festive_engine::{
    CampaignRequest, CreateOutcome, EmailSettings, FileStore, MailProvider, SmtpConfig,
    Synthesizer, cleanup_campaigns, create_campaign, dispatch, run_activation_sweep,
    run_reset_sweep, run_shop_activation, spawn_schedulers, subscribe, unsubscribe,
};

mod wiring;

#[derive(Parser, Debug)]
#[command(name = "festive", version, about = "Festival campaign engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview the festival name a date resolves to
    Resolve {
        /// Date as YYYY-MM-DD
        date: String,

        /// Also preview a discount code for this offer text
        #[arg(long)]
        offer: Option<String>,
    },

    /// Synthesize and store a campaign for a shop
    Create {
        #[arg(long)]
        shop: String,

        /// Offer text, e.g. "25% OFF"
        #[arg(long)]
        offer: String,

        /// Start date as YYYY-MM-DD
        #[arg(long)]
        start: String,

        /// End date as YYYY-MM-DD; omit for a rolling campaign
        #[arg(long)]
        end: Option<String>,

        /// Force a rolling campaign even with an end date
        #[arg(long)]
        infinite: bool,

        /// Popup text color, e.g. "#ffffff"
        #[arg(long)]
        text_color: Option<String>,
    },

    /// List a shop's stored campaigns
    List {
        #[arg(long)]
        shop: String,
    },

    /// Remove duplicate stored campaigns
    Cleanup {
        #[arg(long)]
        shop: String,
    },

    /// Add a newsletter subscriber
    Subscribe {
        #[arg(long)]
        shop: String,

        #[arg(long)]
        email: String,

        #[arg(long, value_enum, default_value = "festival")]
        kind: KindArg,
    },

    /// Deactivate a subscriber's subscriptions
    Unsubscribe {
        #[arg(long)]
        shop: String,

        #[arg(long)]
        email: String,
    },

    /// Send the newsletter for the currently active campaign
    Dispatch {
        #[arg(long)]
        shop: String,
    },

    /// Run the activation and reset sweeps once, or keep them running
    Sweep {
        /// Stay up and run on the hourly/daily schedule
        #[arg(long)]
        serve: bool,
    },

    /// Outbound mail configuration
    Email {
        #[command(subcommand)]
        command: EmailCommand,
    },
}

#[derive(Subcommand, Debug)]
enum EmailCommand {
    /// Store mail settings for a shop (password sealed at rest)
    Setup {
        #[arg(long)]
        shop: String,

        #[arg(long, value_enum)]
        provider: ProviderArg,

        #[arg(long)]
        from_name: String,

        #[arg(long)]
        from_email: String,

        #[arg(long)]
        password: String,

        /// SMTP host, required for --provider custom
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        secure: bool,
    },

    /// Disable mail for a shop, keeping the stored settings
    Disable {
        #[arg(long)]
        shop: String,
    },

    /// Send a test mail with the shop's settings
    Test {
        #[arg(long)]
        shop: String,

        #[arg(long)]
        to: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Festival,
    Blog,
}

impl From<KindArg> for SubscriptionType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Festival => SubscriptionType::Festival,
            KindArg::Blog => SubscriptionType::Blog,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Gmail,
    Outlook,
    Yahoo,
    Custom,
}

impl From<ProviderArg> for MailProvider {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Gmail => MailProvider::Gmail,
            ProviderArg::Outlook => MailProvider::Outlook,
            ProviderArg::Yahoo => MailProvider::Yahoo,
            ProviderArg::Custom => MailProvider::Custom,
        }
    }
}

fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .context("invalid time of day")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = FileStore::new(FileStore::default_root()?);
    let mut rng = StdRng::from_entropy();

    match cli.command {
        Command::Resolve { date, offer } => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("invalid date {date:?}, expected YYYY-MM-DD"))?;
            let name = resolve_name(date, &mut rng);
            println!("{name}");
            println!("season: {}", season_for_month(date.month()).label());
            if let Some(offer) = offer {
                let code = generate_discount_code(&name, &offer, date.month(), &mut rng);
                println!("code: {code}");
            }
        }

        Command::Create {
            shop,
            offer,
            start,
            end,
            infinite,
            text_color,
        } => {
            let collab = wiring::collaborators()?;
            let synth = Synthesizer {
                text: collab.text.as_ref(),
                images: collab.images.as_ref(),
                palette: collab.palette.as_ref(),
                scraper: collab.scraper.as_ref(),
            };
            let req = CampaignRequest {
                shop_domain: shop.clone(),
                offer,
                start: parse_date(&start)?,
                end: end.as_deref().map(parse_date).transpose()?,
                infinite,
                text_color,
            };
            let now = Utc::now();
            match create_campaign(&store, &synth, &req, now, &mut rng).await? {
                CreateOutcome::Created(campaign) => {
                    println!("created: {} ({})", campaign.name, campaign.discount_code);
                    println!(
                        "window: {} to {}{}",
                        campaign.start_date.format("%Y-%m-%d"),
                        campaign.end_date.format("%Y-%m-%d"),
                        if campaign.is_infinite { " (rolling)" } else { "" },
                    );
                    // A campaign that is already inside its window gets its
                    // newsletter right away instead of waiting for the sweep.
                    let sent = run_shop_activation(
                        &store,
                        collab.mailer.as_ref(),
                        collab.text.as_ref(),
                        &shop,
                        now,
                    )
                    .await?;
                    if sent > 0 {
                        println!("newsletter dispatched");
                    }
                }
                CreateOutcome::NearDuplicate => {
                    println!("blocked: too similar to an existing campaign");
                }
            }
        }

        Command::List { shop } => {
            let popup = load_popup(&store, &shop).await?;
            if popup.festivals.is_empty() {
                println!("no campaigns for {shop}");
            }
            for c in &popup.festivals {
                println!(
                    "{} | {} | {} | {} to {}{}{}",
                    c.name,
                    c.offer,
                    c.discount_code,
                    c.start_date.format("%Y-%m-%d"),
                    c.end_date.format("%Y-%m-%d"),
                    if c.is_infinite { " | rolling" } else { "" },
                    if c.auto_newsletter_sent { " | notified" } else { "" },
                );
            }
        }

        Command::Cleanup { shop } => {
            let removed = cleanup_campaigns(&store, &shop).await?;
            println!("removed {removed} duplicate campaigns");
        }

        Command::Subscribe { shop, email, kind } => {
            let collab = wiring::collaborators()?;
            let outcome = subscribe(
                &store,
                collab.mailer.as_ref(),
                &shop,
                &email,
                kind.into(),
                None,
                Utc::now(),
            )
            .await?;
            println!("{outcome:?}");
        }

        Command::Unsubscribe { shop, email } => {
            let flipped = unsubscribe(&store, &shop, &email).await?;
            println!("deactivated {flipped} subscriptions");
        }

        Command::Dispatch { shop } => {
            let collab = wiring::collaborators()?;
            let now = Utc::now();
            let popup = load_popup(&store, &shop).await?;
            let Some(campaign) = find_active(&popup.festivals, now).cloned() else {
                bail!("no active campaign for {shop}");
            };
            let report = dispatch(
                &store,
                collab.mailer.as_ref(),
                collab.text.as_ref(),
                &shop,
                &campaign,
                now,
            )
            .await?;
            println!(
                "{}: {} (sent {}, failed {})",
                campaign.name, report.message, report.emails_sent, report.emails_failed,
            );
        }

        Command::Sweep { serve } => {
            let collab = wiring::collaborators()?;
            if serve {
                let store: Arc<dyn festive_engine::SettingsStore> = Arc::new(store);
                let handles = spawn_schedulers(store, collab.mailer, collab.text);
                println!("sweeps running; ctrl-c to stop");
                tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
                for handle in handles {
                    handle.abort();
                }
            } else {
                let now = Utc::now();
                let summary =
                    run_activation_sweep(&store, collab.mailer.as_ref(), collab.text.as_ref(), now)
                        .await?;
                let rearmed = run_reset_sweep(&store, now).await?;
                println!(
                    "{} shops, {} dispatched, {} failures, {} re-armed",
                    summary.shops, summary.dispatched, summary.failures, rearmed,
                );
            }
        }

        Command::Email { command } => match command {
            EmailCommand::Setup {
                shop,
                provider,
                from_name,
                from_email,
                password,
                host,
                port,
                secure,
            } => {
                let secret = wiring::sealing_secret()?;
                let mut settings = EmailSettings::new(
                    provider.into(),
                    from_name,
                    from_email,
                    &password,
                    &secret,
                )?;
                if provider == ProviderArg::Custom {
                    let host = host.context("--host is required with --provider custom")?;
                    let port = port.context("--port is required with --provider custom")?;
                    settings = settings.with_smtp(SmtpConfig { host, port, secure });
                }
                // Surfaces a missing endpoint now instead of at send time.
                settings.smtp_config()?;
                festive_engine::mailcfg::save_mail(&store, &shop, &settings).await?;
                println!("mail configured for {shop}");
            }

            EmailCommand::Disable { shop } => {
                if festive_engine::mailcfg::disable_mail(&store, &shop).await? {
                    println!("mail disabled for {shop}");
                } else {
                    println!("mail was not enabled for {shop}");
                }
            }

            EmailCommand::Test { shop, to } => {
                let collab = wiring::collaborators()?;
                let Some(settings) = festive_engine::mailcfg::load_mail(&store, &shop).await?
                else {
                    bail!("mail not configured for {shop}; run: festive email setup");
                };
                let email = festive_engine::OutboundEmail {
                    from_name: settings.from_name.clone(),
                    from_email: settings.from_email.clone(),
                    to,
                    subject: format!("Test mail from {shop}"),
                    html: "<p>Mail settings are working.</p>".to_string(),
                };
                collab
                    .mailer
                    .send(&email)
                    .await
                    .context("send test mail")?;
                println!("test mail sent");
            }
        },
    }

    Ok(())
}
